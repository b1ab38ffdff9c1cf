//! Messages exchanged with the design-tool host.
//!
//! The host talks to the plugin through a generic message channel: it
//! broadcasts [`HostEvent`]s and receives [`PluginMessage`]s, with no reply
//! correlation in either direction.

use std::sync::mpsc;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::model::{Fill, HostSelection};

/// Inbound notification from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostEvent {
    /// The selected shape changed; `None` when nothing is selected.
    SelectionChanged { selection: Option<HostSelection> },
    /// Encoded bytes of the selected shape's image fill.
    ImageLoaded {
        image_bytes: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// Raw RGBA pixels the host rendered after applying an update.
    ExportedImage {
        image_bytes: Vec<u8>,
        width: u32,
        height: u32,
        selection_id: String,
    },
}

impl HostEvent {
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Outbound request to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PluginMessage {
    /// Replace or add an image fill on the selected shape.
    #[serde(rename = "update-image-fill", rename_all = "camelCase")]
    UpdateImageFill {
        /// PNG bytes
        image_data: Vec<u8>,
        fill_index: usize,
        original_fill: Fill,
        /// Drop the previous upload before adding this one
        should_delete_first: bool,
        add_new_layer: bool,
    },
}

impl PluginMessage {
    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fire-and-forget channel to the host.
pub trait HostBridge {
    fn post(&self, message: PluginMessage) -> Result<(), BridgeError>;
}

/// In-process bridge backed by an mpsc channel.
///
/// Used by the native viewer, which has no real host, and by tests.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    sender: mpsc::Sender<PluginMessage>,
}

impl ChannelBridge {
    pub fn new() -> (Self, mpsc::Receiver<PluginMessage>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl HostBridge for ChannelBridge {
    fn post(&self, message: PluginMessage) -> Result<(), BridgeError> {
        self.sender.send(message).map_err(|_| BridgeError::Closed)
    }
}
