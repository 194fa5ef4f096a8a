//! Display-ready types produced by the projector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Ai,
    Tool,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Human => "human",
            MessageKind::Ai => "ai",
            MessageKind::Tool => "tool",
        }
    }
}

/// One entry of the message feed.
///
/// Tool payloads are kept for on-demand inspection but never shown inline:
/// `display_text` is always a short label for tool traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMessage {
    pub id: String,
    pub kind: MessageKind,
    pub display_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
    pub observed_at: DateTime<Utc>,
    /// Index of the source event in the run's raw log.
    pub position: usize,
}

impl ProjectedMessage {
    /// Assistant turn that requested a tool.
    pub fn is_tool_request(&self) -> bool {
        self.kind == MessageKind::Ai && self.tool_name.is_some()
    }

    /// Assistant turn with plain text only.
    pub fn is_answer(&self) -> bool {
        self.kind == MessageKind::Ai && self.tool_name.is_none()
    }

    pub fn has_tool_result(&self) -> bool {
        self.kind == MessageKind::Tool && self.tool_result.is_some()
    }
}
