//! Catalog store: the external product persistence collaborator.
//!
//! The checkout pipeline and the CRUD handlers depend on [`CatalogStore`],
//! not on a concrete database. [`PgCatalogStore`] is the production
//! implementation; [`InMemoryCatalogStore`] backs tests and local runs
//! without `PostgreSQL`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use electroworld_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::product::{Category, NewProduct, Product, ProductPatch};

/// Read/write access to the product catalog.
///
/// Checkout only ever calls [`CatalogStore::get_many`]; the rest serves the
/// CRUD surface.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// A single product by ID.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Batch lookup by ID set; unknown IDs are simply absent from the result.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Insert a new product.
    async fn create(&self, input: NewProduct) -> Result<Product, RepositoryError>;

    /// Replace every field of an existing product. `None` if the ID is unknown.
    async fn replace(
        &self,
        id: ProductId,
        input: NewProduct,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Update the provided fields of an existing product. `None` if the ID is unknown.
    async fn patch(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. Returns whether a row existed.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Readiness probe against the backing store.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL implementation
// =============================================================================

/// Catalog store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw product row; `category` is validated on the way out.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    category: String,
    price: Decimal,
    image: String,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, RepositoryError> {
        let category = Category::parse(&self.category).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invalid category in database: {}",
                self.category
            ))
        })?;

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            category,
            price: Price::new(self.price),
            image: self.image,
        })
    }
}

fn rows_into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(ProductRow::into_product).collect()
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category, price, image FROM product ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows_into_products(rows)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category, price, image FROM product WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category, price, image FROM product WHERE id = ANY($1)",
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await?;

        rows_into_products(rows)
    }

    async fn create(&self, input: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO product (id, name, category, price, image) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, category, price, image",
        )
        .bind(ProductId::random().as_uuid())
        .bind(&input.name)
        .bind(input.category.as_str())
        .bind(input.price.amount())
        .bind(&input.image)
        .fetch_one(&self.pool)
        .await?;

        row.into_product()
    }

    async fn replace(
        &self,
        id: ProductId,
        input: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE product SET name = $2, category = $3, price = $4, image = $5 \
             WHERE id = $1 \
             RETURNING id, name, category, price, image",
        )
        .bind(id.as_uuid())
        .bind(&input.name)
        .bind(input.category.as_str())
        .bind(input.price.amount())
        .bind(&input.image)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn patch(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE product SET \
                name = COALESCE($2, name), \
                category = COALESCE($3, category), \
                price = COALESCE($4, price), \
                image = COALESCE($5, image) \
             WHERE id = $1 \
             RETURNING id, name, category, price, image",
        )
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.category.map(Category::as_str))
        .bind(patch.price.map(|p| p.amount()))
        .bind(patch.image.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// Catalog store held in memory. Used by tests and for running the server
/// without a database.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalogStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the given products.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: RwLock::new(map),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<ProductId, Product>>, RepositoryError> {
        self.products
            .read()
            .map_err(|_| RepositoryError::DataCorruption("catalog lock poisoned".to_owned()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<ProductId, Product>>, RepositoryError> {
        self.products
            .write()
            .map_err(|_| RepositoryError::DataCorruption("catalog lock poisoned".to_owned()))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = self.read()?.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.read()?;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn create(&self, input: NewProduct) -> Result<Product, RepositoryError> {
        let product = input.into_product();
        self.write()?.insert(product.id, product.clone());
        Ok(product)
    }

    async fn replace(
        &self,
        id: ProductId,
        input: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.write()?;
        if !products.contains_key(&id) {
            return Ok(None);
        }
        let product = Product {
            id,
            name: input.name,
            category: input.category,
            price: input.price,
            image: input.image,
        };
        products.insert(id, product.clone());
        Ok(Some(product))
    }

    async fn patch(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut products = self.write()?;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(product);
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.write()?.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, price: i64) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            category: Category::Phones,
            price: Price::from_whole(price),
            image: format!("https://example.com/{name}.jpg"),
        }
    }

    #[test]
    fn test_row_with_unknown_category_is_data_corruption() {
        let row = ProductRow {
            id: Uuid::new_v4(),
            name: "Nokia 105".to_owned(),
            category: "Gadgets".to_owned(),
            price: Decimal::from(105),
            image: "x".to_owned(),
        };
        assert!(matches!(
            row.into_product(),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_crud_round_trip() {
        let store = InMemoryCatalogStore::new();

        let created = store.create(new_product("Nokia 105", 105)).await.expect("create");
        assert_eq!(store.list().await.expect("list").len(), 1);

        let fetched = store.get(created.id).await.expect("get").expect("exists");
        assert_eq!(fetched.name, "Nokia 105");

        let replaced = store
            .replace(created.id, new_product("Nokia 106", 150))
            .await
            .expect("replace")
            .expect("exists");
        assert_eq!(replaced.name, "Nokia 106");
        assert_eq!(replaced.id, created.id);

        assert!(store.delete(created.id).await.expect("delete"));
        assert!(!store.delete(created.id).await.expect("delete again"));
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_get_many_skips_unknown_ids() {
        let store = InMemoryCatalogStore::new();
        let a = store.create(new_product("A", 100)).await.expect("create");
        let _b = store.create(new_product("B", 200)).await.expect("create");

        let found = store
            .get_many(&[a.id, ProductId::random()])
            .await
            .expect("get_many");
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|p| p.id), Some(a.id));
    }

    #[tokio::test]
    async fn test_in_memory_patch_merges_fields() {
        let store = InMemoryCatalogStore::new();
        let created = store.create(new_product("Nokia 105", 105)).await.expect("create");

        let patched = store
            .patch(
                created.id,
                ProductPatch {
                    price: Some(Price::from_whole(120)),
                    ..ProductPatch::default()
                },
            )
            .await
            .expect("patch")
            .expect("exists");

        assert_eq!(patched.price, Price::from_whole(120));
        assert_eq!(patched.name, "Nokia 105");

        let missing = store
            .patch(ProductId::random(), ProductPatch::default())
            .await
            .expect("patch");
        assert!(missing.is_none());
    }
}
