use std::sync::Arc;

use tokio::sync::mpsc;

use crate::catalog::client::CatalogClient;
use crate::catalog::reconciler::{self, CaptureRequest, FetchPlan};

use super::events::{AppEvent, Notification, NotificationLevel};

/// Centralized handle to the backend.
///
/// Created once at startup and passed by ref to whatever needs to start
/// async work. Results come back as [`AppEvent`]s on `event_tx`.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn CatalogClient>,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl Services {
    pub fn new(catalog: Arc<dyn CatalogClient>, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { catalog, event_tx }
    }

    /// Run a fetch plan in the background.
    pub fn spawn_fetch(&self, plan: FetchPlan) {
        let catalog = self.catalog.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = reconciler::execute(catalog.as_ref(), plan).await;
            let _ = tx.send(AppEvent::PageLoaded(outcome));
        });
    }

    /// Send a capture or release in the background.
    pub fn spawn_capture(&self, request: CaptureRequest) {
        let catalog = self.catalog.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = reconciler::execute_capture(catalog.as_ref(), request).await;
            let _ = tx.send(AppEvent::CaptureDone(outcome));
        });
    }

    /// Load the category list. Failures leave the selector with only
    /// "All types".
    pub fn load_categories(&self) {
        let services = self.clone();
        tokio::spawn(async move {
            match services.catalog.fetch_categories().await {
                Ok(categories) => {
                    let _ = services.event_tx.send(AppEvent::CategoriesLoaded(categories));
                }
                Err(e) => {
                    log::error!("Failed to fetch types: {e}");
                    services.notify("Type filter unavailable", NotificationLevel::Warning);
                }
            }
        });
    }

    /// Queue a notification for the overlay.
    pub fn notify(&self, message: impl Into<String>, level: NotificationLevel) {
        let _ = self.event_tx.send(AppEvent::Notification(Notification {
            id: 0, // Assigned by AppState
            message: message.into(),
            level,
            ttl_ticks: 60,
        }));
    }
}
