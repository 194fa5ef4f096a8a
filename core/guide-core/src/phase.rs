//! Coarse workflow phase, derived from the feed.
//!
//! The phase is recomputed from the whole feed on every update rather than
//! advanced incrementally, so replayed or reordered events always produce
//! the same answer. Tool results are not correlated with the calls that
//! requested them: a result alone is enough for `Executing`.

use serde::{Deserialize, Serialize};

use crate::types::ProjectedMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingInput,
    Validating,
    Planning,
    Executing,
    Finalizing,
}

/// Progress-indicator entry for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowStep {
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
}

pub const WORKFLOW_STEP_COUNT: u8 = 5;

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::AwaitingInput => "awaiting_input",
            SessionPhase::Validating => "validating",
            SessionPhase::Planning => "planning",
            SessionPhase::Executing => "executing",
            SessionPhase::Finalizing => "finalizing",
        }
    }

    pub fn step(&self) -> WorkflowStep {
        match self {
            SessionPhase::AwaitingInput => WorkflowStep {
                number: 1,
                name: "Check location",
                description: "Validate the destination",
            },
            SessionPhase::Validating => WorkflowStep {
                number: 2,
                name: "Prepare search",
                description: "Set up search parameters and tools",
            },
            SessionPhase::Planning => WorkflowStep {
                number: 3,
                name: "AI analysis",
                description: "The agent analyses the request",
            },
            SessionPhase::Executing => WorkflowStep {
                number: 4,
                name: "Tool execution",
                description: "Query map services for details",
            },
            SessionPhase::Finalizing => WorkflowStep {
                number: 5,
                name: "Build guide",
                description: "Assemble the final travel guide",
            },
        }
    }
}

pub fn compute_phase(feed: &[ProjectedMessage], finalize_threshold_chars: usize) -> SessionPhase {
    let has_tool_result = feed.iter().any(ProjectedMessage::has_tool_result);
    let has_long_answer = feed.iter().any(|message| {
        message.is_answer() && message.display_text.chars().count() > finalize_threshold_chars
    });

    if has_long_answer && has_tool_result {
        SessionPhase::Finalizing
    } else if has_tool_result {
        SessionPhase::Executing
    } else if feed.iter().any(ProjectedMessage::is_tool_request) {
        SessionPhase::Planning
    } else if !feed.is_empty() {
        SessionPhase::Validating
    } else {
        SessionPhase::AwaitingInput
    }
}
