//! Wire types for the travel-guide agent stream.
//!
//! This crate is shared by the projector library and its clients to prevent
//! schema drift. The agent's message shapes are not under our control, so
//! decoding is permissive: anything that cannot be placed decodes to
//! [`RawEvent::Unrecognized`] instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_FRAME_BYTES: usize = 1024 * 1024; // 1MB

/// Content the agent SDK emits for state snapshots rather than conversational turns.
pub const SNAPSHOT_SENTINEL: &str = "values";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Agent Messages
// ═══════════════════════════════════════════════════════════════════════════════

/// A tool invocation requested by an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "empty_object")]
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: &str, args: Value) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            args,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Message exactly as the agent SDK serializes it.
///
/// Every field is optional; which ones are present depends on the role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WireMessage {
    fn is(&self, message_type: &str, role: &str) -> bool {
        self.message_type.as_deref() == Some(message_type) || self.role.as_deref() == Some(role)
    }
}

/// One update from the agent's message channel, split by role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RawEvent {
    Human {
        id: Option<String>,
        content: String,
    },
    Ai {
        id: Option<String>,
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        id: Option<String>,
        name: Option<String>,
        tool_call_id: Option<String>,
        content: Value,
    },
    System {
        id: Option<String>,
        content: String,
    },
    Unrecognized {
        id: Option<String>,
        kind: Option<String>,
    },
}

impl RawEvent {
    pub fn human(id: Option<&str>, content: &str) -> Self {
        RawEvent::Human {
            id: id.map(str::to_string),
            content: content.to_string(),
        }
    }

    pub fn ai(id: Option<&str>, content: &str, tool_calls: Vec<ToolCall>) -> Self {
        RawEvent::Ai {
            id: id.map(str::to_string),
            content: content.to_string(),
            tool_calls,
        }
    }

    pub fn tool(id: Option<&str>, name: &str, tool_call_id: &str, content: Value) -> Self {
        RawEvent::Tool {
            id: id.map(str::to_string),
            name: Some(name.to_string()),
            tool_call_id: Some(tool_call_id.to_string()),
            content,
        }
    }

    pub fn system(id: Option<&str>, content: &str) -> Self {
        RawEvent::System {
            id: id.map(str::to_string),
            content: content.to_string(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            RawEvent::Human { id, .. }
            | RawEvent::Ai { id, .. }
            | RawEvent::Tool { id, .. }
            | RawEvent::System { id, .. }
            | RawEvent::Unrecognized { id, .. } => id.as_deref(),
        }
    }

    /// True for an assistant turn that does not wait on any tool.
    pub fn is_final_assistant_turn(&self) -> bool {
        matches!(self, RawEvent::Ai { tool_calls, .. } if tool_calls.is_empty())
    }

    /// True when the event's content is exactly `sentinel`.
    pub fn content_equals(&self, sentinel: &str) -> bool {
        match self {
            RawEvent::Human { content, .. }
            | RawEvent::Ai { content, .. }
            | RawEvent::System { content, .. } => content == sentinel,
            RawEvent::Tool { content, .. } => content.as_str() == Some(sentinel),
            RawEvent::Unrecognized { .. } => false,
        }
    }

    pub fn from_wire(wire: WireMessage) -> Self {
        if wire.is("system", "system") {
            return RawEvent::System {
                content: wire.content.as_ref().map(flatten_content).unwrap_or_default(),
                id: wire.id,
            };
        }

        if wire.is("human", "user") {
            let content = wire
                .content
                .as_ref()
                .map(flatten_content)
                .filter(|text| !text.is_empty())
                .or(wire.text)
                .unwrap_or_default();
            return RawEvent::Human {
                id: wire.id,
                content,
            };
        }

        if wire.is("ai", "assistant") {
            let tool_calls = wire
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|mut call| {
                    if call.args.is_null() {
                        call.args = empty_object();
                    }
                    call
                })
                .collect();
            return RawEvent::Ai {
                content: wire.content.as_ref().map(flatten_content).unwrap_or_default(),
                id: wire.id,
                tool_calls,
            };
        }

        if wire.is("tool", "tool") {
            return RawEvent::Tool {
                id: wire.id,
                name: wire.name,
                tool_call_id: wire.tool_call_id,
                content: wire.content.unwrap_or(Value::Null),
            };
        }

        RawEvent::Unrecognized {
            id: wire.id,
            kind: wire.message_type.or(wire.role),
        }
    }

    pub fn to_wire(&self) -> WireMessage {
        match self {
            RawEvent::Human { id, content } => WireMessage {
                message_type: Some("human".to_string()),
                id: id.clone(),
                content: Some(Value::String(content.clone())),
                ..WireMessage::default()
            },
            RawEvent::Ai {
                id,
                content,
                tool_calls,
            } => WireMessage {
                message_type: Some("ai".to_string()),
                id: id.clone(),
                content: Some(Value::String(content.clone())),
                tool_calls: Some(tool_calls.clone()),
                ..WireMessage::default()
            },
            RawEvent::Tool {
                id,
                name,
                tool_call_id,
                content,
            } => WireMessage {
                message_type: Some("tool".to_string()),
                id: id.clone(),
                name: name.clone(),
                tool_call_id: tool_call_id.clone(),
                content: Some(content.clone()),
                ..WireMessage::default()
            },
            RawEvent::System { id, content } => WireMessage {
                message_type: Some("system".to_string()),
                id: id.clone(),
                content: Some(Value::String(content.clone())),
                ..WireMessage::default()
            },
            RawEvent::Unrecognized { id, kind } => WireMessage {
                message_type: kind.clone(),
                id: id.clone(),
                ..WireMessage::default()
            },
        }
    }
}

/// Decodes one agent message. Never fails: unusable input becomes `Unrecognized`.
pub fn decode_raw_event(value: &Value) -> RawEvent {
    match serde_json::from_value::<WireMessage>(value.clone()) {
        Ok(wire) => RawEvent::from_wire(wire),
        Err(_) => RawEvent::Unrecognized {
            id: value
                .get("id")
                .and_then(|id| id.as_str())
                .map(str::to_string),
            kind: None,
        },
    }
}

/// Content is either a plain string or a list of content blocks; blocks
/// contribute their `text` fields in order.
fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| match block {
                Value::String(text) => Some(text.as_str()),
                Value::Object(_) => block.get("text").and_then(|text| text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Milestones
// ═══════════════════════════════════════════════════════════════════════════════

/// Named graph node reported on the agent's update channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    ValidateLocation,
    PrepareLoop,
    Reflection,
    Finalize,
    Other(String),
}

const MILESTONE_NODES: [(&str, Milestone); 4] = [
    ("check_location_info", Milestone::ValidateLocation),
    ("prepare_agent_loop", Milestone::PrepareLoop),
    ("reflection", Milestone::Reflection),
    ("finalize_answer", Milestone::Finalize),
];

impl Milestone {
    /// Reads the milestone from an update payload keyed by node name.
    ///
    /// Known nodes are checked in graph order, so a payload naming several
    /// resolves to the earliest one.
    pub fn from_update(update: &Value) -> Option<Self> {
        let object = update.as_object()?;
        for (node, milestone) in MILESTONE_NODES.iter() {
            if object.get(*node).map(is_present).unwrap_or(false) {
                return Some(milestone.clone());
            }
        }
        object
            .keys()
            .next()
            .map(|node| Milestone::Other(node.clone()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Milestone::ValidateLocation => "check_location_info",
            Milestone::PrepareLoop => "prepare_agent_loop",
            Milestone::Reflection => "reflection",
            Milestone::Finalize => "finalize_answer",
            Milestone::Other(node) => node,
        }
    }

    /// Transient status label for progress displays.
    pub fn label(&self) -> String {
        match self {
            Milestone::ValidateLocation => "Checking location info".to_string(),
            Milestone::PrepareLoop => "Preparing search".to_string(),
            Milestone::Reflection => "Reviewing findings".to_string(),
            Milestone::Finalize => "Writing the guide".to_string(),
            Milestone::Other(node) => format!("Running {}", node),
        }
    }
}

fn is_present(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Stream Frames
// ═══════════════════════════════════════════════════════════════════════════════

/// One line of the recorded agent stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamFrame {
    /// A single message, new or updated.
    Message { message: Value },
    /// The full message list as currently known to the agent.
    Messages { messages: Vec<Value> },
    /// Named node update; drives milestones.
    Update { data: Value },
    /// The agent or transport failed; terminal for the run.
    Error { message: String },
    /// The stream closed normally.
    End,
}

pub fn parse_frame(line: &str) -> Result<StreamFrame, ErrorInfo> {
    if line.len() > MAX_FRAME_BYTES {
        return Err(ErrorInfo::new(
            "frame_too_large",
            format!("frame exceeds {} bytes", MAX_FRAME_BYTES),
        ));
    }

    serde_json::from_str(line).map_err(|err| {
        ErrorInfo::new(
            "invalid_frame",
            format!("stream frame is invalid JSON: {}", err),
        )
    })
}

/// Payload sent to the agent when a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitPayload {
    pub protocol_version: u32,
    pub run_id: String,
    pub messages: Vec<WireMessage>,
}
