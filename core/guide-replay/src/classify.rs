//! `classify` subcommand: shows what the feed would make of each message.

use chrono::Utc;
use guide_core::classify;
use guide_core::config::ClassifierConfig;
use guide_core::load_projector_config;
use guide_protocol::{decode_raw_event, Milestone, RawEvent, StreamFrame};
use std::path::{Path, PathBuf};

use crate::input::{frames, read_input};

pub fn run(input: Option<&Path>, config: Option<PathBuf>) -> Result<(), String> {
    let config = load_projector_config(config)?;
    let input = read_input(input)?;
    for row in classify_lines(&input, &config.classifier) {
        println!("{}", row);
    }
    Ok(())
}

/// One row per streamed message, milestone, or unparseable line.
pub fn classify_lines(input: &str, config: &ClassifierConfig) -> Vec<String> {
    let now = Utc::now();
    let mut rows = Vec::new();
    let mut position = 0;

    for (line, frame) in frames(input) {
        let messages = match frame {
            Ok(StreamFrame::Message { message }) => vec![message],
            Ok(StreamFrame::Messages { messages }) => messages,
            Ok(StreamFrame::Update { data }) => {
                if let Some(milestone) = Milestone::from_update(&data) {
                    rows.push(format!("{:>4}  node     {}", line, milestone.label()));
                }
                continue;
            }
            Ok(StreamFrame::Error { message }) => {
                rows.push(format!("{:>4}  error    {}", line, message));
                continue;
            }
            Ok(StreamFrame::End) => continue,
            Err(info) => {
                rows.push(format!("{:>4}  invalid  {}", line, info.message));
                continue;
            }
        };

        for message in &messages {
            let raw = decode_raw_event(message);
            let row = match classify(&raw, position, now, config) {
                Some(projected) => format!(
                    "{:>4}  {:<7}  {}",
                    line,
                    projected.kind.as_str(),
                    projected.display_text
                ),
                None => format!("{:>4}  dropped  {}", line, role(&raw)),
            };
            rows.push(row);
            position += 1;
        }
    }

    rows
}

fn role(raw: &RawEvent) -> String {
    match raw {
        RawEvent::Human { .. } => "human".to_string(),
        RawEvent::Ai { .. } => "ai".to_string(),
        RawEvent::Tool { .. } => "tool".to_string(),
        RawEvent::System { .. } => "system".to_string(),
        RawEvent::Unrecognized { kind, .. } => kind.clone().unwrap_or_else(|| "unknown".to_string()),
    }
}
