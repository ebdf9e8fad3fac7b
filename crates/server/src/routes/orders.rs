//! Checkout handler and request validation.

use axum::{Json, extract::State};
use electroworld_core::Email;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::CartEntry;
use crate::services::{CheckoutInput, CheckoutResponse, process_checkout};
use crate::state::AppState;

/// Raw checkout request body. Field presence is checked in `validate`,
/// so missing fields produce a uniform validation message instead of a
/// deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckoutRequest {
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    location: Option<String>,
    delivery_location: Option<String>,
    cart: Option<Vec<CartEntryDraft>>,
}

/// One raw cart entry. Entries with an unparseable ID are dropped, the
/// same way entries for deleted products are dropped later.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CartEntryDraft {
    id: Option<String>,
    quantity: Option<i64>,
}

impl CheckoutRequest {
    /// Validate the submission into a typed checkout input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when any field is missing or blank,
    /// the cart is empty, the email does not parse, or a quantity is not
    /// positive.
    fn validate(self) -> Result<CheckoutInput> {
        let name = require_field(self.name)?;
        let phone = require_field(self.phone)?;
        let email_raw = require_field(self.email)?;
        let location = require_field(self.location)?;
        let delivery_location = require_field(self.delivery_location)?;
        let entries = match self.cart {
            Some(entries) if !entries.is_empty() => entries,
            _ => return Err(all_fields_required()),
        };

        let email = Email::parse(&email_raw)
            .map_err(|e| AppError::Validation(format!("Invalid email address: {e}")))?;

        let mut cart = Vec::with_capacity(entries.len());
        for entry in entries {
            let quantity = entry.quantity.unwrap_or(1);
            let quantity = u32::try_from(quantity).ok().filter(|q| *q > 0).ok_or_else(|| {
                AppError::Validation("Cart quantities must be positive".to_owned())
            })?;
            let Some(id) = entry.id.and_then(|raw| raw.parse().ok()) else {
                continue;
            };
            cart.push(CartEntry { id, quantity });
        }

        Ok(CheckoutInput {
            name,
            phone,
            email,
            location,
            delivery_location,
            cart,
        })
    }
}

/// Run the checkout pipeline for a storefront order.
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let input = request.validate()?;
    tracing::info!(
        buyer = %input.email,
        entries = input.cart.len(),
        delivery = %input.delivery_location,
        "Checkout started"
    );
    let response = process_checkout(&state, input).await?;
    Ok(Json(response))
}

fn require_field(value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(all_fields_required()),
    }
}

fn all_fields_required() -> AppError {
    AppError::Validation("All fields required".to_owned())
}
