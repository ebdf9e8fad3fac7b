//! Transient order data built per checkout request.
//!
//! Orders are never persisted: they are constructed from a cart, consumed by
//! the invoice renderer and the notification dispatcher, and discarded once
//! the response is sent. The invoice PDF is the only trace that remains.

use std::collections::HashMap;

use electroworld_core::{Email, Price, ProductId};
use serde::Deserialize;

use super::product::Product;

/// A buyer-submitted cart entry: a product reference plus a quantity.
///
/// Not validated against the catalog until checkout resolves it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartEntry {
    pub id: ProductId,
    pub quantity: u32,
}

/// A cart entry resolved against the catalog, carrying a price snapshot.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub name: String,
    pub unit_price: Price,
    pub image: String,
    pub quantity: u32,
}

impl OrderLine {
    /// Unit price times quantity, exact decimal arithmetic.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A fully assembled order, ready for rendering and dispatch.
#[derive(Debug, Clone)]
pub struct Order {
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_email: Email,
    pub location: String,
    pub delivery_location: String,
    pub lines: Vec<OrderLine>,
    pub delivery_fee: Price,
}

impl Order {
    /// Sum of line totals over resolved lines only.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Grand total: subtotal plus delivery fee.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal() + self.delivery_fee
    }
}

/// Join cart entries against resolved catalog products.
///
/// Entries referencing products absent from `products` are dropped silently;
/// a single stale cart entry must not sink the whole order. The caller is
/// responsible for rejecting an order with zero resulting lines.
#[must_use]
pub fn resolve_lines(cart: &[CartEntry], products: &[Product]) -> Vec<OrderLine> {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    cart.iter()
        .filter_map(|entry| {
            let product = by_id.get(&entry.id)?;
            Some(OrderLine {
                name: product.name.clone(),
                unit_price: product.price,
                image: product.image.clone(),
                quantity: entry.quantity,
            })
        })
        .collect()
}
