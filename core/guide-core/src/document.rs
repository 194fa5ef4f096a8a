//! Finalization trigger and the travel-guide document.

use chrono::{DateTime, Utc};
use guide_protocol::RawEvent;
use serde::Serialize;

use crate::config::{ClassifierConfig, GuideDefaults};
use crate::session::LoggedEvent;
use crate::types::ProjectedMessage;

/// Answer picked out of the raw log once the finalize signal has been seen.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAnswer {
    pub body: String,
    /// Position of the answering event in the raw log.
    pub position: usize,
    /// Feed entries up to and including the answer.
    pub history: Vec<ProjectedMessage>,
}

/// Picks the most recent assistant turn without pending tool calls.
///
/// Snapshot sentinels are not answers. Returns `None` while no such turn with
/// non-blank text exists; the caller retries on the next update.
pub fn try_finalize(
    feed: &[ProjectedMessage],
    raw: &[LoggedEvent],
    config: &ClassifierConfig,
) -> Option<FinalAnswer> {
    let (position, body) = raw
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, entry)| !entry.event.content_equals(&config.sentinel))
        .find_map(|(position, entry)| match &entry.event {
            RawEvent::Ai {
                content,
                tool_calls,
                ..
            } if tool_calls.is_empty() && !content.trim().is_empty() => {
                Some((position, content.clone()))
            }
            _ => None,
        })?;

    let history = feed
        .iter()
        .filter(|message| message.position <= position)
        .cloned()
        .collect();

    Some(FinalAnswer {
        body,
        position,
        history,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transportation {
    pub airport: String,
    pub public_transport: Vec<String>,
    pub taxi: String,
    pub tips: Vec<String>,
}

/// The travel guide produced by a run. Frozen once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalDocument {
    pub id: String,
    pub run_id: String,
    pub destination: String,
    pub country: String,
    pub overview: String,
    pub transportation: Transportation,
    pub tips: Vec<String>,
    pub best_time_to_visit: String,
    pub estimated_budget: String,
    pub created_at: DateTime<Utc>,
    pub history: Vec<ProjectedMessage>,
}

impl FinalDocument {
    pub fn build(
        run_id: &str,
        destination: &str,
        answer: FinalAnswer,
        defaults: &GuideDefaults,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("guide-{}", created_at.timestamp_millis()),
            run_id: run_id.to_string(),
            destination: destination.to_string(),
            country: defaults.country.clone(),
            overview: answer.body,
            transportation: Transportation {
                airport: defaults.airport.clone(),
                public_transport: defaults.public_transport.clone(),
                taxi: defaults.taxi.clone(),
                tips: defaults.transport_tips.clone(),
            },
            tips: defaults.tips.clone(),
            best_time_to_visit: defaults.best_time_to_visit.clone(),
            estimated_budget: defaults.estimated_budget.clone(),
            created_at,
            history: answer.history,
        }
    }
}
