//! Email service for dispatching order invoices.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Each
//! order email goes to the buyer and the seller in one message and
//! carries the rendered invoice PDF as an attachment.

use std::time::Duration;

use askama::Template;
use electroworld_core::Email;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, MultiPart, SinglePart, header::ContentType, header::ContentTypeErr},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{EmailConfig, SellerConfig};
use crate::models::order::Order;
use crate::services::invoice::InvoiceFile;

/// Outbound SMTP sends get this long before being abandoned.
const SEND_TIMEOUT_SECS: u64 = 30;

/// One line item row as shown in the email body.
struct ItemRow {
    name: String,
    quantity: u32,
    unit: String,
    total: String,
}

/// HTML template for the order invoice email.
#[derive(Template)]
#[template(path = "email/order_invoice.html")]
struct OrderInvoiceEmailHtml<'a> {
    buyer_name: &'a str,
    invoice_number: &'a str,
    invoice_url: &'a str,
    items: &'a [ItemRow],
    subtotal: String,
    delivery_location: &'a str,
    delivery_fee: String,
    total: String,
    seller_phone: &'a str,
}

/// Plain text template for the order invoice email.
#[derive(Template)]
#[template(path = "email/order_invoice.txt")]
struct OrderInvoiceEmailText<'a> {
    buyer_name: &'a str,
    invoice_number: &'a str,
    invoice_url: &'a str,
    items: &'a [ItemRow],
    subtotal: String,
    delivery_location: &'a str,
    delivery_fee: String,
    total: String,
    seller_phone: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Could not read the invoice file for attachment.
    #[error("Could not read invoice attachment: {0}")]
    Attachment(#[from] std::io::Error),

    /// Attachment content type was rejected.
    #[error("Invalid attachment content type: {0}")]
    ContentType(#[from] ContentTypeErr),

    /// The SMTP server did not answer within the send timeout.
    #[error("Email send timed out after {0}s")]
    Timeout(u64),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay parameters are rejected.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the order invoice to the buyer, copying the seller.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built, the attachment
    /// cannot be read, the send fails, or the send times out.
    pub async fn send_order_invoice(
        &self,
        order: &Order,
        invoice: &InvoiceFile,
        invoice_url: &str,
        seller: &SellerConfig,
        seller_email: &Email,
    ) -> Result<(), EmailError> {
        let pdf = tokio::fs::read(&invoice.path).await?;
        let message =
            self.build_order_message(order, invoice, invoice_url, seller, seller_email, pdf)?;

        let send = self.mailer.send(message);
        match tokio::time::timeout(Duration::from_secs(SEND_TIMEOUT_SECS), send).await {
            Ok(result) => {
                result?;
            }
            Err(_) => return Err(EmailError::Timeout(SEND_TIMEOUT_SECS)),
        }

        tracing::info!(
            to = %order.buyer_email,
            invoice = %invoice.number,
            "Invoice email sent"
        );
        Ok(())
    }

    /// Assemble the full multipart message: text and HTML alternatives
    /// plus the PDF attachment.
    fn build_order_message(
        &self,
        order: &Order,
        invoice: &InvoiceFile,
        invoice_url: &str,
        seller: &SellerConfig,
        seller_email: &Email,
        pdf: Vec<u8>,
    ) -> Result<Message, EmailError> {
        let items: Vec<ItemRow> = order
            .lines
            .iter()
            .map(|line| ItemRow {
                name: line.name.clone(),
                quantity: line.quantity,
                unit: line.unit_price.format_ksh(),
                total: line.line_total().format_ksh(),
            })
            .collect();

        let seller_phone = seller.phone.as_deref().unwrap_or("-");
        let html = OrderInvoiceEmailHtml {
            buyer_name: &order.buyer_name,
            invoice_number: &invoice.number,
            invoice_url,
            items: &items,
            subtotal: order.subtotal().format_ksh(),
            delivery_location: &order.delivery_location,
            delivery_fee: order.delivery_fee.format_ksh(),
            total: order.total().format_ksh(),
            seller_phone,
        }
        .render()?;
        let text = OrderInvoiceEmailText {
            buyer_name: &order.buyer_name,
            invoice_number: &invoice.number,
            invoice_url,
            items: &items,
            subtotal: order.subtotal().format_ksh(),
            delivery_location: &order.delivery_location,
            delivery_fee: order.delivery_fee.format_ksh(),
            total: order.total().format_ksh(),
            seller_phone,
        }
        .render()?;

        let attachment = Attachment::new(invoice.filename.clone())
            .body(pdf, ContentType::parse("application/pdf")?);

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(order
                .buyer_email
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(order.buyer_email.to_string()))?)
            .to(seller_email
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(seller_email.to_string()))?)
            .subject(format!("{} - Invoice {}", seller.name, invoice.number))
            .multipart(
                MultiPart::mixed()
                    .multipart(
                        MultiPart::alternative()
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_PLAIN)
                                    .body(text),
                            )
                            .singlepart(
                                SinglePart::builder()
                                    .header(ContentType::TEXT_HTML)
                                    .body(html),
                            ),
                    )
                    .singlepart(attachment),
            )?;

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use electroworld_core::Price;
    use secrecy::SecretString;

    use super::*;
    use crate::models::order::OrderLine;

    fn service() -> EmailService {
        let config = EmailConfig {
            smtp_host: "smtp.gmail.com".to_owned(),
            smtp_port: 587,
            smtp_username: "electroworldke@gmail.com".to_owned(),
            smtp_password: SecretString::from("app-password"),
            from_address: "Electro World <electroworldke@gmail.com>".to_owned(),
        };
        EmailService::new(&config).expect("relay builds")
    }

    fn seller() -> SellerConfig {
        SellerConfig {
            name: "Electro World".to_owned(),
            email: Some(Email::parse("electroworldke@gmail.com").expect("valid")),
            phone: Some("+254706234072".to_owned()),
        }
    }

    fn order() -> Order {
        Order {
            buyer_name: "Jane Wanjiku".to_owned(),
            buyer_phone: "+254700000001".to_owned(),
            buyer_email: Email::parse("jane@example.com").expect("valid"),
            location: "Westlands".to_owned(),
            delivery_location: "Nairobi".to_owned(),
            lines: vec![OrderLine {
                name: "Samsung Galaxy A16".to_owned(),
                unit_price: Price::from_whole(21_000),
                image: "https://example.com/a16.jpg".to_owned(),
                quantity: 1,
            }],
            delivery_fee: Price::from_whole(200),
        }
    }

    fn invoice() -> InvoiceFile {
        InvoiceFile {
            number: "INV-1756550400123-ab12".to_owned(),
            filename: "invoice-1756550400123-ab12.pdf".to_owned(),
            path: PathBuf::from("/tmp/invoice-1756550400123-ab12.pdf"),
            pages: 1,
        }
    }

    // The pooled SMTP transport spawns onto the running runtime when it
    // is built, so these tests need one even though nothing is sent.
    #[tokio::test]
    async fn test_order_message_addresses_buyer_and_seller() {
        let service = service();
        let seller = seller();
        let seller_email = seller.email.clone().expect("configured");

        let message = service
            .build_order_message(
                &order(),
                &invoice(),
                "http://localhost:5000/invoices/invoice-1756550400123-ab12.pdf",
                &seller,
                &seller_email,
                b"%PDF-1.4 stub".to_vec(),
            )
            .expect("message builds");

        assert_eq!(message.envelope().to().len(), 2);
    }

    #[tokio::test]
    async fn test_order_message_body_mentions_invoice() {
        let service = service();
        let seller = seller();
        let seller_email = seller.email.clone().expect("configured");

        let message = service
            .build_order_message(
                &order(),
                &invoice(),
                "http://localhost:5000/invoices/invoice-1756550400123-ab12.pdf",
                &seller,
                &seller_email,
                b"%PDF-1.4 stub".to_vec(),
            )
            .expect("message builds");

        let raw = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(raw.contains("INV-1756550400123-ab12"));
        assert!(raw.contains("invoice-1756550400123-ab12.pdf"));
        assert!(raw.contains("Delivery (Nairobi)"));
    }
}
