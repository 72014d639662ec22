//! Cross-context control protocol.
//!
//! Messages arrive as JSON objects tagged by `action`:
//!
//! ```text
//! {"action":"TOGGLE"}
//! {"action":"GET_STATUS"}                  -> {"active":true,"isEditMode":false}
//! {"action":"SET_EDIT_MODE","enabled":true} -> {"success":true}
//! ```
//!
//! `GET_STATUS` must be answered within the same turn; callers do not retry.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A control message sent to the overlay in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Flip overlay visibility.
    Toggle,
    /// Report visibility and edit mode.
    GetStatus,
    /// Enter or leave edit mode.
    SetEditMode { enabled: bool },
}

impl ControlMessage {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::InvalidMessage(e.to_string()))
    }
}

/// Reply to `GET_STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub active: bool,
    #[serde(rename = "isEditMode")]
    pub is_edit_mode: bool,
}

/// Reply to `SET_EDIT_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

/// Reply sent back to the message's originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Status(StatusReport),
    Ack(Ack),
    /// No reply is sent (`TOGGLE`).
    None,
}

impl ControlResponse {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
