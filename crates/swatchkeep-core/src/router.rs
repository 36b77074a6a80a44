//! Background message routing.
//!
//! The background worker sits between the popup and the page. It starts
//! sampling in the active tab, records picked colors (so a pick lands even
//! after the popup has closed), and serves the direct persistence messages.

use crate::color::Color;
use crate::message::Message;
use crate::storage::{BoxFuture, PersistedState, Storage, StorageError, load_store, save_state};
use std::sync::Arc;
use thiserror::Error;

/// Browser tab identifier.
pub type TabId = i32;

/// Failures talking to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no active tab")]
    NoActiveTab,
    #[error("failed to inject picker script: {0}")]
    Injection(String),
    #[error("failed to deliver message: {0}")]
    Delivery(String),
}

/// Browser facilities the router needs.
pub trait ExtensionHost {
    /// The active tab of the focused window.
    fn active_tab(&self) -> BoxFuture<'_, Option<TabId>>;

    /// Load the page-side picker into `tab`.
    fn inject_picker(&self, tab: TabId) -> BoxFuture<'_, Result<(), HostError>>;

    /// Deliver `message` to the page in `tab`.
    fn send_to_tab(&self, tab: TabId, message: Message) -> BoxFuture<'_, Result<(), HostError>>;
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What a handled message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    PickRequested { tab: TabId, slot_index: usize },
    ColorStored { collection: String, slot_index: usize, color: Color },
    Saved,
    Switched { collection: String },
    /// Not for the background, or nothing to do.
    Ignored,
}

pub struct BackgroundRouter<H, S: ?Sized> {
    host: H,
    storage: Arc<S>,
}

impl<H: ExtensionHost, S: Storage + ?Sized> BackgroundRouter<H, S> {
    pub fn new(host: H, storage: Arc<S>) -> Self {
        Self { host, storage }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub async fn handle(&self, message: Message) -> Result<RouteOutcome, RouteError> {
        match message {
            Message::StartColorPick { slot_index } => self.start_pick(slot_index).await,
            Message::ColorPicked { color, slot_index } => self.store_pick(&color, slot_index).await,
            Message::SaveCollection {
                collections,
                current_collection,
            } => {
                let state = PersistedState {
                    collections: Some(collections),
                    current_collection: Some(current_collection),
                };
                save_state(&*self.storage, state).await?;
                Ok(RouteOutcome::Saved)
            }
            Message::SwitchCollection { collection } => {
                let state = PersistedState {
                    collections: None,
                    current_collection: Some(collection.clone()),
                };
                save_state(&*self.storage, state).await?;
                Ok(RouteOutcome::Switched { collection })
            }
            Message::RequestColorPick { .. } => Ok(RouteOutcome::Ignored),
        }
    }

    async fn start_pick(&self, slot_index: usize) -> Result<RouteOutcome, RouteError> {
        let Some(tab) = self.host.active_tab().await else {
            log::error!("No active tab found");
            return Err(HostError::NoActiveTab.into());
        };

        self.host.inject_picker(tab).await?;
        self.host
            .send_to_tab(tab, Message::RequestColorPick { slot_index })
            .await?;
        log::info!("Requested color pick for slot {} in tab {}", slot_index, tab);
        Ok(RouteOutcome::PickRequested { tab, slot_index })
    }

    async fn store_pick(&self, text: &str, slot_index: usize) -> Result<RouteOutcome, RouteError> {
        let Some(color) = Color::parse(text) else {
            log::warn!("Dropping picked value {:?}: not a color", text);
            return Ok(RouteOutcome::Ignored);
        };

        let mut store = load_store(&*self.storage).await?;
        if !store.set_color(slot_index, color) {
            return Ok(RouteOutcome::Ignored);
        }
        save_state(&*self.storage, PersistedState::from_store(&store)).await?;

        Ok(RouteOutcome::ColorStored {
            collection: store.current_name().to_string(),
            slot_index,
            color,
        })
    }
}
