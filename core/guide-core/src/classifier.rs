//! Event classifier: turns raw agent events into feed entries.
//!
//! ```text
//! System / sentinel content     → dropped
//! Human                         → human, content verbatim
//! Ai + tool calls               → ai, label of the first tool
//! Ai, no tool calls             → ai, content verbatim
//! Tool with tool_call_id        → tool, "Tool <name> succeeded"
//! anything else                 → dropped
//! blank display text            → dropped
//! ```

use chrono::{DateTime, Utc};
use guide_protocol::RawEvent;
use serde_json::Value;

use crate::config::ClassifierConfig;
use crate::labels::{tool_label, tool_result_label};
use crate::session::LoggedEvent;
use crate::types::{MessageKind, ProjectedMessage};

pub fn classify(
    raw: &RawEvent,
    position: usize,
    observed_at: DateTime<Utc>,
    config: &ClassifierConfig,
) -> Option<ProjectedMessage> {
    if raw.content_equals(&config.sentinel) {
        return None;
    }

    let draft = match raw {
        RawEvent::System { .. } | RawEvent::Unrecognized { .. } => return None,
        RawEvent::Human { content, .. } => Draft::text(MessageKind::Human, content.clone()),
        RawEvent::Ai {
            content,
            tool_calls,
            ..
        } => match tool_calls.first() {
            Some(call) => Draft {
                kind: MessageKind::Ai,
                display_text: tool_label(call),
                tool_name: Some(call.name.clone()),
                tool_args: Some(call.args.clone()),
                tool_result: None,
            },
            None => Draft::text(MessageKind::Ai, content.clone()),
        },
        RawEvent::Tool {
            name,
            tool_call_id,
            content,
            ..
        } => {
            tool_call_id.as_ref()?;
            Draft {
                kind: MessageKind::Tool,
                display_text: tool_result_label(name.as_deref()),
                tool_name: name.clone(),
                tool_args: None,
                tool_result: result_payload(content),
            }
        }
    };

    if draft.display_text.trim().is_empty() {
        return None;
    }

    Some(ProjectedMessage {
        id: raw
            .id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("msg-{}", position)),
        kind: draft.kind,
        display_text: draft.display_text,
        tool_name: draft.tool_name,
        tool_args: draft.tool_args,
        tool_result: draft.tool_result,
        observed_at,
        position,
    })
}

/// Classifies a whole raw log. Output order follows the log.
pub fn project(log: &[LoggedEvent], config: &ClassifierConfig) -> Vec<ProjectedMessage> {
    log.iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let projected = classify(&entry.event, position, entry.received_at, config);
            if projected.is_none() {
                tracing::trace!(position, id = ?entry.event.id(), "Raw event not projected");
            }
            projected
        })
        .collect()
}

struct Draft {
    kind: MessageKind,
    display_text: String,
    tool_name: Option<String>,
    tool_args: Option<Value>,
    tool_result: Option<Value>,
}

impl Draft {
    fn text(kind: MessageKind, display_text: String) -> Self {
        Self {
            kind,
            display_text,
            tool_name: None,
            tool_args: None,
            tool_result: None,
        }
    }
}

fn result_payload(content: &Value) -> Option<Value> {
    match content {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        other => Some(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use guide_protocol::ToolCall;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    fn run(raw: &RawEvent, position: usize) -> Option<ProjectedMessage> {
        classify(raw, position, at(), &ClassifierConfig::default())
    }

    #[test]
    fn human_is_verbatim() {
        let message = run(&RawEvent::human(Some("h1"), "Tokyo"), 0).expect("projected");
        assert_eq!(message.kind, MessageKind::Human);
        assert_eq!(message.display_text, "Tokyo");
        assert_eq!(message.id, "h1");
        assert_eq!(message.observed_at, at());
    }

    #[test]
    fn missing_id_falls_back_to_position() {
        let message = run(&RawEvent::human(None, "Tokyo"), 3).expect("projected");
        assert_eq!(message.id, "msg-3");
        assert_eq!(message.position, 3);

        let empty_id = run(&RawEvent::human(Some(""), "Tokyo"), 4).expect("projected");
        assert_eq!(empty_id.id, "msg-4");
    }

    #[test]
    fn system_is_dropped() {
        assert!(run(&RawEvent::system(Some("s1"), "You are a travel planner"), 0).is_none());
    }

    #[test]
    fn sentinel_is_dropped_for_any_role() {
        assert!(run(&RawEvent::human(None, "values"), 0).is_none());
        assert!(run(&RawEvent::ai(None, "values", Vec::new()), 0).is_none());
    }

    #[test]
    fn custom_sentinel_is_respected() {
        let config = ClassifierConfig {
            sentinel: "__state__".to_string(),
        };
        let raw = RawEvent::ai(None, "__state__", Vec::new());
        assert!(classify(&raw, 0, at(), &config).is_none());
        let raw = RawEvent::ai(None, "values", Vec::new());
        assert!(classify(&raw, 0, at(), &config).is_some());
    }

    #[test]
    fn ai_tool_request_uses_first_tool_label() {
        let raw = RawEvent::ai(
            Some("a1"),
            "",
            vec![
                ToolCall::new("maps_around_search", json!({"keywords": "美食"})),
                ToolCall::new("maps_weather", json!({})),
            ],
        );
        let message = run(&raw, 1).expect("projected");
        assert_eq!(message.kind, MessageKind::Ai);
        assert_eq!(message.display_text, "Searching for local food...");
        assert_eq!(message.tool_name.as_deref(), Some("maps_around_search"));
        assert_eq!(message.tool_args, Some(json!({"keywords": "美食"})));
        assert!(message.is_tool_request());
    }

    #[test]
    fn ai_answer_is_verbatim() {
        let raw = RawEvent::ai(Some("a2"), "Here is your plan", Vec::new());
        let message = run(&raw, 2).expect("projected");
        assert_eq!(message.display_text, "Here is your plan");
        assert!(message.is_answer());
        assert!(message.tool_args.is_none());
    }

    #[test]
    fn blank_ai_answer_is_dropped() {
        assert!(run(&RawEvent::ai(None, "   \n", Vec::new()), 0).is_none());
    }

    #[test]
    fn tool_result_gets_fixed_label() {
        let raw = RawEvent::tool(Some("t1"), "maps_weather", "call-1", json!({"temp": 21}));
        let message = run(&raw, 2).expect("projected");
        assert_eq!(message.kind, MessageKind::Tool);
        assert_eq!(message.display_text, "Tool maps_weather succeeded");
        assert_eq!(message.tool_result, Some(json!({"temp": 21})));
        assert!(message.has_tool_result());
    }

    #[test]
    fn tool_without_call_id_is_dropped() {
        let raw = RawEvent::Tool {
            id: None,
            name: Some("maps_weather".to_string()),
            tool_call_id: None,
            content: json!("sunny"),
        };
        assert!(run(&raw, 0).is_none());
    }

    #[test]
    fn empty_tool_payload_has_no_result() {
        let raw = RawEvent::tool(None, "maps_geo", "call-2", json!(""));
        let message = run(&raw, 0).expect("projected");
        assert!(message.tool_result.is_none());
        assert!(!message.has_tool_result());
    }

    #[test]
    fn unrecognized_is_dropped() {
        let raw = RawEvent::Unrecognized {
            id: Some("x".to_string()),
            kind: Some("remove".to_string()),
        };
        assert!(run(&raw, 0).is_none());
    }

    #[test]
    fn project_never_grows_the_log() {
        let log: Vec<LoggedEvent> = vec![
            RawEvent::system(None, "prompt"),
            RawEvent::human(None, "Tokyo"),
            RawEvent::ai(None, "values", Vec::new()),
            RawEvent::ai(None, "", vec![ToolCall::new("maps_geo", json!({}))]),
            RawEvent::tool(None, "maps_geo", "c1", json!({"lat": 35.6})),
        ]
        .into_iter()
        .map(|event| LoggedEvent::new(event, at()))
        .collect();

        let feed = project(&log, &ClassifierConfig::default());
        assert!(feed.len() <= log.len());
        assert_eq!(feed.len(), 3);
        let positions: Vec<usize> = feed.iter().map(|message| message.position).collect();
        assert_eq!(positions, vec![1, 3, 4]);
    }
}
