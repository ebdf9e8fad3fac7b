//! Business services behind the HTTP layer.

pub mod checkout;
pub mod email;
pub mod invoice;

pub use checkout::{CheckoutInput, CheckoutResponse, process_checkout};
pub use email::EmailService;
pub use invoice::{InvoiceFile, InvoiceRenderer};
