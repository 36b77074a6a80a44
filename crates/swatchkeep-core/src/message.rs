//! Messages exchanged between the popup, the background worker and the page.
//!
//! On the wire each message is a JSON object tagged by `action`, with
//! camelCase fields, e.g. `{"action":"colorPicked","color":"#FF0000","slotIndex":0}`.

use crate::collection::CollectionMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    /// Popup → background: start sampling for a slot in the active tab.
    StartColorPick { slot_index: usize },
    /// Background → page: begin sampling.
    RequestColorPick { slot_index: usize },
    /// Page → popup and background: the sampled color text.
    ColorPicked { color: String, slot_index: usize },
    /// Write both palette keys directly.
    SaveCollection {
        collections: CollectionMap,
        current_collection: String,
    },
    /// Write only the current collection name.
    SwitchCollection { collection: String },
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::StartColorPick { .. } => "startColorPick",
            Message::RequestColorPick { .. } => "requestColorPick",
            Message::ColorPicked { .. } => "colorPicked",
            Message::SaveCollection { .. } => "saveCollection",
            Message::SwitchCollection { .. } => "switchCollection",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a message, returning `None` for anything that isn't one of
    /// ours. Extension message buses carry other senders' traffic too.
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(message) => Some(message),
            Err(e) => {
                log::debug!("Ignoring unrecognized message: {}", e);
                None
            }
        }
    }
}
