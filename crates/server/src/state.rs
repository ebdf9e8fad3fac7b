//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ShopConfig;
use crate::db::CatalogStore;
use crate::services::email::EmailService;
use crate::services::invoice::InvoiceRenderer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the product catalog, the invoice renderer and
/// the optional email transport.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    catalog: Arc<dyn CatalogStore>,
    mailer: Option<EmailService>,
    renderer: InvoiceRenderer,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The mailer is optional: without SMTP configuration the catalog
    /// stays fully usable and checkout fails with a configuration error.
    #[must_use]
    pub fn new(
        config: ShopConfig,
        catalog: Arc<dyn CatalogStore>,
        mailer: Option<EmailService>,
    ) -> Self {
        let renderer = InvoiceRenderer::new(config.invoices_dir.clone(), config.seller.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                mailer,
                renderer,
            }),
        }
    }

    /// Get a reference to the shop configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog store.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogStore {
        self.inner.catalog.as_ref()
    }

    /// Get a reference to the email service, when SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }

    /// Get a reference to the invoice renderer.
    #[must_use]
    pub fn renderer(&self) -> &InvoiceRenderer {
        &self.inner.renderer
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by an in-memory catalog and a temp invoices
    /// directory, with no mailer and no seller contact details.
    pub fn for_tests(
        invoices_dir: std::path::PathBuf,
        catalog: Arc<crate::db::InMemoryCatalogStore>,
    ) -> Self {
        Self::new(ShopConfig::for_tests(invoices_dir), catalog, None)
    }
}
