//! Domain models for the catalog and checkout pipeline.

pub mod order;
pub mod product;

pub use order::{CartEntry, Order, OrderLine, resolve_lines};
pub use product::{
    Category, NewProduct, Product, ProductDraft, ProductPatch, ProductPatchDraft,
};
