//! Checkout pipeline: price the cart, render the invoice, email it,
//! and hand the buyer a WhatsApp deep link for order follow-up.

use std::collections::HashSet;

use electroworld_core::{Email, Price, ProductId};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::order::{CartEntry, Order, resolve_lines};
use crate::state::AppState;

/// Per-location delivery fees in whole shillings.
const DELIVERY_FEES: &[(&str, i64)] = &[("Nairobi", 200)];

/// Fee for every location without an explicit entry.
const DEFAULT_DELIVERY_FEE: i64 = 400;

/// A validated checkout submission.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub name: String,
    pub phone: String,
    pub email: Email,
    pub location: String,
    pub delivery_location: String,
    pub cart: Vec<CartEntry>,
}

/// Successful checkout payload returned to the storefront.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub whatsapp_url: String,
    pub invoice_url: String,
    pub invoice_filename: String,
}

/// Delivery fee for a named location. The match is exact; unknown and
/// differently-cased locations fall back to the default fee.
#[must_use]
pub fn delivery_fee(location: &str) -> Price {
    let fee = DELIVERY_FEES
        .iter()
        .find(|(name, _)| *name == location)
        .map_or(DEFAULT_DELIVERY_FEE, |(_, fee)| *fee);
    Price::from_whole(fee)
}

/// Run the full checkout pipeline for a validated submission.
///
/// Cart entries whose products no longer exist are dropped silently;
/// an order left with no resolvable lines is rejected. The invoice is
/// rendered and persisted before any email dispatch, so a dispatch
/// failure never rolls back the invoice file.
///
/// # Errors
///
/// Returns `AppError::EmptyOrder` when no cart entry resolves,
/// `AppError::Configuration` when SMTP or seller contact details are
/// missing, and the corresponding variant for store, render and
/// dispatch failures.
pub async fn process_checkout(
    state: &AppState,
    input: CheckoutInput,
) -> Result<CheckoutResponse> {
    let ids: Vec<ProductId> = {
        let mut seen = HashSet::new();
        input
            .cart
            .iter()
            .map(|entry| entry.id)
            .filter(|id| seen.insert(*id))
            .collect()
    };

    let products = state.catalog().get_many(&ids).await?;
    let lines = resolve_lines(&input.cart, &products);
    if lines.is_empty() {
        return Err(AppError::EmptyOrder);
    }
    let dropped = input.cart.len() - lines.len();
    if dropped > 0 {
        tracing::warn!(dropped, "Cart entries referenced unknown products");
    }

    let fee = delivery_fee(&input.delivery_location);
    let order = Order {
        buyer_name: input.name,
        buyer_phone: input.phone,
        buyer_email: input.email,
        location: input.location,
        delivery_location: input.delivery_location,
        delivery_fee: fee,
        lines,
    };

    // PDF assembly is CPU-bound, keep it off the async workers.
    let renderer = state.renderer().clone();
    let render_order = order.clone();
    let invoice = tokio::task::spawn_blocking(move || renderer.render(&render_order))
        .await
        .map_err(|e| AppError::Internal(format!("Invoice render task failed: {e}")))??;

    let invoice_url = invoice_url(&state.config().public_url, &invoice.filename);

    let mailer = state.mailer().ok_or_else(|| {
        AppError::Configuration("Email transport is not configured.".to_owned())
    })?;
    let seller = &state.config().seller;
    let seller_email = seller.email.as_ref().ok_or_else(|| {
        AppError::Configuration("Seller email address is not configured.".to_owned())
    })?;
    mailer
        .send_order_invoice(&order, &invoice, &invoice_url, seller, seller_email)
        .await?;

    // Optional post-dispatch cleanup. Failures are logged, never surfaced:
    // the order already went through.
    if state.config().clean_invoice_files {
        let path = invoice.path.clone();
        let number = invoice.number.clone();
        tokio::spawn(async move {
            if let Err(error) = tokio::fs::remove_file(&path).await {
                tracing::warn!(invoice = %number, %error, "Invoice cleanup failed");
            }
        });
    }

    let seller_phone = seller.phone.as_deref().ok_or_else(|| {
        AppError::Configuration("Seller WhatsApp number not configured.".to_owned())
    })?;

    Ok(CheckoutResponse {
        success: true,
        whatsapp_url: whatsapp_deep_link(seller_phone, &order),
        invoice_url,
        invoice_filename: invoice.filename,
    })
}

/// Public download URL for a rendered invoice.
fn invoice_url(public_url: &str, filename: &str) -> String {
    format!("{public_url}/invoices/{filename}")
}

/// Build a `wa.me` deep link opening a chat with the seller, prefilled
/// with an order summary. The message is URL-encoded exactly once.
fn whatsapp_deep_link(seller_phone: &str, order: &Order) -> String {
    let digits: String = seller_phone
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let mut message = format!(
        "*New Order!*\n\nName: {}\nPhone: {}\nEmail: {}\nLocation: {}\nDelivery: {} ({})\n\nItems:\n",
        order.buyer_name,
        order.buyer_phone,
        order.buyer_email,
        order.location,
        order.delivery_location,
        order.delivery_fee.format_ksh()
    );
    for line in &order.lines {
        message.push_str(&format!("- {} x {}\n", line.name, line.quantity));
    }
    message.push_str(&format!("\nTotal: {}", order.total().format_ksh()));

    format!("https://wa.me/{digits}?text={}", urlencoding::encode(&message))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use electroworld_core::Price;

    use super::*;
    use crate::db::InMemoryCatalogStore;
    use crate::models::order::OrderLine;
    use crate::models::product::{Category, Product};
    use crate::state::AppState;

    fn product(name: &str, price: i64) -> Product {
        Product {
            id: ProductId::random(),
            name: name.to_owned(),
            category: Category::Phones,
            price: Price::from_whole(price),
            image: "https://example.com/p.jpg".to_owned(),
        }
    }

    fn input(cart: Vec<CartEntry>, delivery_location: &str) -> CheckoutInput {
        CheckoutInput {
            name: "Jane Wanjiku".to_owned(),
            phone: "+254700000001".to_owned(),
            email: Email::parse("jane@example.com").expect("valid"),
            location: "Westlands".to_owned(),
            delivery_location: delivery_location.to_owned(),
            cart,
        }
    }

    #[test]
    fn test_delivery_fee_tiers() {
        assert_eq!(delivery_fee("Nairobi"), Price::from_whole(200));
        assert_eq!(delivery_fee("Mombasa"), Price::from_whole(400));
        assert_eq!(delivery_fee("Kisumu"), Price::from_whole(400));
        // The lookup is exact, lowercase gets the default fee.
        assert_eq!(delivery_fee("nairobi"), Price::from_whole(400));
    }

    #[test]
    fn test_order_totals_worked_examples() {
        let lines = vec![OrderLine {
            name: "Phone".to_owned(),
            unit_price: Price::from_whole(2000),
            image: String::new(),
            quantity: 1,
        }];
        let nairobi = Order {
            buyer_name: String::new(),
            buyer_phone: String::new(),
            buyer_email: Email::parse("a@b.co").expect("valid"),
            location: String::new(),
            delivery_location: "Nairobi".to_owned(),
            delivery_fee: delivery_fee("Nairobi"),
            lines: lines.clone(),
        };
        assert_eq!(nairobi.total(), Price::from_whole(2200));

        let mombasa = Order {
            delivery_location: "Mombasa".to_owned(),
            delivery_fee: delivery_fee("Mombasa"),
            ..nairobi
        };
        assert_eq!(mombasa.total(), Price::from_whole(2400));
    }

    #[test]
    fn test_invoice_url_shape() {
        assert_eq!(
            invoice_url("http://localhost:5000", "invoice-1756550400123-ab12.pdf"),
            "http://localhost:5000/invoices/invoice-1756550400123-ab12.pdf"
        );
    }

    #[test]
    fn test_whatsapp_deep_link_is_encoded_once() {
        let order = Order {
            buyer_name: "Jane Wanjiku".to_owned(),
            buyer_phone: "+254700000001".to_owned(),
            buyer_email: Email::parse("jane@example.com").expect("valid"),
            location: "Westlands".to_owned(),
            delivery_location: "Nairobi".to_owned(),
            delivery_fee: Price::from_whole(200),
            lines: vec![OrderLine {
                name: "Samsung Galaxy A16".to_owned(),
                unit_price: Price::from_whole(21_000),
                image: String::new(),
                quantity: 2,
            }],
        };

        let link = whatsapp_deep_link("+254706234072", &order);
        assert!(link.starts_with("https://wa.me/254706234072?text="));
        assert!(link.contains("Jane%20Wanjiku"));
        assert!(link.contains("Samsung%20Galaxy%20A16"));
        // A double-encoded message would contain %25 sequences.
        assert!(!link.contains("%25"));
    }

    #[tokio::test]
    async fn test_checkout_rejects_cart_with_no_known_products() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = Arc::new(InMemoryCatalogStore::new());
        let state = AppState::for_tests(dir.path().to_path_buf(), catalog);

        let cart = vec![CartEntry {
            id: ProductId::random(),
            quantity: 1,
        }];
        let result = process_checkout(&state, input(cart, "Nairobi")).await;
        assert!(matches!(result, Err(AppError::EmptyOrder)));
    }

    #[tokio::test]
    async fn test_checkout_without_mailer_keeps_rendered_invoice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let phone = product("Samsung Galaxy A16", 21_000);
        let cart = vec![CartEntry {
            id: phone.id,
            quantity: 1,
        }];
        let catalog = Arc::new(InMemoryCatalogStore::with_products(vec![phone]));
        let state = AppState::for_tests(dir.path().to_path_buf(), catalog);

        let result = process_checkout(&state, input(cart, "Nairobi")).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));

        // Dispatch failed after the render step, the PDF must survive.
        let pdfs: Vec<_> = std::fs::read_dir(dir.path())
            .expect("readable")
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "pdf"))
            .collect();
        assert_eq!(pdfs.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_drops_unknown_cart_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let phone = product("Nokia 105", 1050);
        let cart = vec![
            CartEntry {
                id: phone.id,
                quantity: 1,
            },
            CartEntry {
                id: ProductId::random(),
                quantity: 3,
            },
        ];
        let catalog = Arc::new(InMemoryCatalogStore::with_products(vec![phone]));
        let state = AppState::for_tests(dir.path().to_path_buf(), catalog);

        // One entry resolves, so checkout proceeds past cart validation
        // and fails later on the missing mailer rather than EmptyOrder.
        let result = process_checkout(&state, input(cart, "Nairobi")).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
