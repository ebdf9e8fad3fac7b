//! Catalog product model and validated CRUD inputs.
//!
//! Request bodies deserialize into draft structs with optional fields, then
//! `validate()` turns them into fully-typed inputs. This keeps required-field
//! and category checks explicit instead of relying on deserialization errors.

use electroworld_core::{Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The closed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Phones,
    #[serde(rename = "Covers & Protectors")]
    CoversAndProtectors,
    Laptops,
    Accessories,
}

impl Category {
    /// Every valid category, in display order.
    pub const ALL: [Self; 4] = [
        Self::Phones,
        Self::CoversAndProtectors,
        Self::Laptops,
        Self::Accessories,
    ];

    /// The customer-facing category label, also used for DB storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phones => "Phones",
            Self::CoversAndProtectors => "Covers & Protectors",
            Self::Laptops => "Laptops",
            Self::Accessories => "Accessories",
        }
    }

    /// Parse a category from its label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub price: Price,
    /// URL of the product image.
    pub image: String,
}

/// Raw create/replace request body. All fields optional so that missing
/// fields surface as a validation error rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl ProductDraft {
    /// Validate the draft into a typed input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if any field is missing or empty, the
    /// category is not one of the fixed set, or the price is negative.
    pub fn validate(self) -> Result<NewProduct, AppError> {
        let name = require_text(self.name)?;
        let category_raw = require_text(self.category)?;
        let price = self
            .price
            .ok_or_else(|| AppError::Validation("All fields are required".to_owned()))?;
        let image = require_text(self.image)?;

        let category = Category::parse(&category_raw)
            .ok_or_else(|| AppError::Validation("Invalid category".to_owned()))?;
        if price.is_sign_negative() {
            return Err(AppError::Validation("Price must not be negative".to_owned()));
        }

        Ok(NewProduct {
            name,
            category,
            price: Price::new(price),
            image,
        })
    }
}

/// A validated create/replace input.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: Category,
    pub price: Price,
    pub image: String,
}

impl NewProduct {
    /// Materialize the input as a product with a fresh ID.
    #[must_use]
    pub fn into_product(self) -> Product {
        Product {
            id: ProductId::random(),
            name: self.name,
            category: self.category,
            price: self.price,
            image: self.image,
        }
    }
}

/// Raw partial-update request body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatchDraft {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl ProductPatchDraft {
    /// Validate the provided fields; absent fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unknown category, a negative
    /// price, or an empty provided value.
    pub fn validate(self) -> Result<ProductPatch, AppError> {
        let category = match self.category {
            Some(raw) => Some(
                Category::parse(&raw)
                    .ok_or_else(|| AppError::Validation("Invalid category".to_owned()))?,
            ),
            None => None,
        };

        if let Some(price) = self.price {
            if price.is_sign_negative() {
                return Err(AppError::Validation("Price must not be negative".to_owned()));
            }
        }

        for provided in [self.name.as_deref(), self.image.as_deref()].into_iter().flatten() {
            if provided.trim().is_empty() {
                return Err(AppError::Validation("Fields must not be empty".to_owned()));
            }
        }

        Ok(ProductPatch {
            name: self.name,
            category,
            price: self.price.map(Price::new),
            image: self.image,
        })
    }
}

/// A validated partial update.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub price: Option<Price>,
    pub image: Option<String>,
}

impl ProductPatch {
    /// Apply the patch to an existing product.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
    }
}

fn require_text(value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation("All fields are required".to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, category: &str, price: i64, image: &str) -> ProductDraft {
        ProductDraft {
            name: Some(name.to_owned()),
            category: Some(category.to_owned()),
            price: Some(Decimal::from(price)),
            image: Some(image.to_owned()),
        }
    }

    #[test]
    fn test_category_round_trips_through_label() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("Gadgets"), None);
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::CoversAndProtectors).expect("serializes");
        assert_eq!(json, "\"Covers & Protectors\"");
        let parsed: Category = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(parsed, Category::CoversAndProtectors);
    }

    #[test]
    fn test_draft_validates_complete_input() {
        let input = draft("Nokia 105", "Phones", 105, "https://example.com/nokia.jpg")
            .validate()
            .expect("valid draft");
        assert_eq!(input.name, "Nokia 105");
        assert_eq!(input.category, Category::Phones);
    }

    #[test]
    fn test_draft_rejects_missing_fields() {
        let mut missing_image = draft("Nokia 105", "Phones", 105, "x");
        missing_image.image = None;
        assert!(matches!(
            missing_image.validate(),
            Err(AppError::Validation(msg)) if msg == "All fields are required"
        ));
    }

    #[test]
    fn test_draft_rejects_unknown_category() {
        let bad = draft("Nokia 105", "Gadgets", 105, "x");
        assert!(matches!(
            bad.validate(),
            Err(AppError::Validation(msg)) if msg == "Invalid category"
        ));
    }

    #[test]
    fn test_draft_rejects_negative_price() {
        let bad = draft("Nokia 105", "Phones", -1, "x");
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_patch_applies_only_provided_fields() {
        let mut product = draft("Nokia 105", "Phones", 105, "x")
            .validate()
            .expect("valid")
            .into_product();
        let patch = ProductPatchDraft {
            price: Some(Decimal::from(150)),
            ..ProductPatchDraft::default()
        }
        .validate()
        .expect("valid patch");

        patch.apply(&mut product);
        assert_eq!(product.price, Price::from_whole(150));
        assert_eq!(product.name, "Nokia 105");
    }

    #[test]
    fn test_patch_rejects_unknown_category() {
        let patch = ProductPatchDraft {
            category: Some("Gadgets".to_owned()),
            ..ProductPatchDraft::default()
        };
        assert!(patch.validate().is_err());
    }
}
