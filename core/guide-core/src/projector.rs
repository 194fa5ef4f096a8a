//! SessionProjector - the entry point for clients.
//!
//! Owns the active run and the conversation transcript. Clients call
//! `submit` to start a run, feed every stream frame to `apply`, and read the
//! current `Projection` whenever they redraw.
//!
//! ```rust,ignore
//! use guide_core::SessionProjector;
//!
//! let mut projector = SessionProjector::default();
//! let payload = projector.submit("Tokyo")?;
//! // send `payload` to the agent, then for each frame:
//! projector.apply(frame)?;
//! let view = projector.projection();
//! ```

use chrono::{DateTime, Utc};
use guide_protocol::{
    decode_raw_event, Milestone, RawEvent, StreamFrame, SubmitPayload, WireMessage,
    PROTOCOL_VERSION,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::ProjectorConfig;
use crate::document::FinalDocument;
use crate::error::{GuideError, Result};
use crate::phase::{SessionPhase, WorkflowStep};
use crate::session::{RunStatus, SessionRun};
use crate::types::ProjectedMessage;

/// Recorded when the agent reports a failure without saying why.
pub const UNKNOWN_STREAM_ERROR: &str = "Unknown error";

/// Everything a client needs to render the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub run_id: Option<String>,
    pub query: Option<String>,
    pub status: Option<RunStatus>,
    pub phase: SessionPhase,
    pub step: WorkflowStep,
    pub messages: Vec<ProjectedMessage>,
    pub document: Option<FinalDocument>,
    pub latest_answer: Option<String>,
    pub milestone: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct SessionProjector {
    config: ProjectorConfig,
    /// Turns from earlier runs, resent to the agent with each new query.
    transcript: Vec<RawEvent>,
    /// Ids of events that belong to earlier runs; ignored if the agent replays them.
    retired_ids: HashSet<String>,
    run: Option<SessionRun>,
}

impl SessionProjector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self {
            config,
            transcript: Vec::new(),
            retired_ids: HashSet::new(),
            run: None,
        }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    pub fn active_run(&self) -> Option<&SessionRun> {
        self.run.as_ref()
    }

    pub fn transcript(&self) -> &[RawEvent] {
        &self.transcript
    }

    pub fn submit(&mut self, query: &str) -> Result<SubmitPayload> {
        self.submit_at(query, Utc::now())
    }

    /// Starts a new run, discarding the previous run's feed and document.
    ///
    /// Fails while the current run is still streaming.
    pub fn submit_at(&mut self, query: &str, now: DateTime<Utc>) -> Result<SubmitPayload> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GuideError::EmptyQuery);
        }
        if let Some(run) = self.run.as_ref().filter(|run| run.status().is_open()) {
            return Err(GuideError::RunInProgress {
                run_id: run.run_id().to_string(),
            });
        }

        self.retire_run();

        let mut run = SessionRun::start(query, now);
        let human_id = format!("human-{}", run.run_id());
        let human = RawEvent::human(Some(&human_id), query);
        run.ingest(human.clone(), now, &self.config)?;

        let mut messages: Vec<WireMessage> = self.transcript.iter().map(RawEvent::to_wire).collect();
        messages.push(human.to_wire());

        info!(
            run_id = %run.run_id(),
            query = %query,
            transcript = self.transcript.len(),
            "Run submitted"
        );

        let payload = SubmitPayload {
            protocol_version: PROTOCOL_VERSION,
            run_id: run.run_id().to_string(),
            messages,
        };
        self.run = Some(run);
        Ok(payload)
    }

    pub fn apply(&mut self, frame: StreamFrame) -> Result<()> {
        self.apply_at(frame, Utc::now())
    }

    /// Routes one stream frame into the active run.
    ///
    /// Frames for a closed run are dropped. An `Error` frame fails the run and
    /// is returned as `GuideError::Transport`.
    pub fn apply_at(&mut self, frame: StreamFrame, now: DateTime<Utc>) -> Result<()> {
        let config = &self.config;
        let retired = &self.retired_ids;
        let run = self.run.as_mut().ok_or(GuideError::NoActiveRun)?;

        if !run.status().is_open() {
            debug!(run_id = %run.run_id(), status = run.status().as_str(), "Dropping frame for closed run");
            return Ok(());
        }

        match frame {
            StreamFrame::Message { message } => {
                let event = decode_raw_event(&message);
                if is_retired(retired, &event) {
                    debug!(id = ?event.id(), "Ignoring event from an earlier run");
                    return Ok(());
                }
                run.ingest(event, now, config)?;
            }
            StreamFrame::Messages { messages } => {
                let events = messages
                    .iter()
                    .map(decode_raw_event)
                    .filter(|event| !is_retired(retired, event))
                    .collect();
                run.merge_snapshot(events, now, config)?;
            }
            StreamFrame::Update { data } => match Milestone::from_update(&data) {
                Some(milestone) => run.observe_milestone(milestone, now, config)?,
                None => debug!("Update without a named node"),
            },
            StreamFrame::Error { message } => {
                let message = if message.trim().is_empty() {
                    UNKNOWN_STREAM_ERROR.to_string()
                } else {
                    message
                };
                warn!(run_id = %run.run_id(), error = %message, "Agent stream failed");
                run.fail(&message)?;
                return Err(GuideError::Transport { message });
            }
            StreamFrame::End => run.complete()?,
        }

        Ok(())
    }

    /// Marks the active run failed because the transport broke outside the stream.
    pub fn fail(&mut self, message: &str) -> Result<()> {
        let run = self.run.as_mut().ok_or(GuideError::NoActiveRun)?;
        warn!(run_id = %run.run_id(), error = %message, "Run failed");
        run.fail(message)
    }

    /// Stops the active run. Its feed and document stay visible.
    pub fn cancel(&mut self) -> Result<()> {
        let run = self.run.as_mut().ok_or(GuideError::NoActiveRun)?;
        run.cancel()
    }

    /// Drops the active run entirely, returning to the empty state.
    pub fn reset(&mut self) {
        if let Some(run) = self.run.as_mut().filter(|run| run.status().is_open()) {
            if let Err(e) = run.cancel() {
                debug!(error = %e, "Run already closed");
            }
        }
        self.retire_run();
    }

    pub fn phase(&self) -> SessionPhase {
        self.run
            .as_ref()
            .map(SessionRun::phase)
            .unwrap_or(SessionPhase::AwaitingInput)
    }

    pub fn messages(&self) -> &[ProjectedMessage] {
        self.run.as_ref().map(SessionRun::feed).unwrap_or(&[])
    }

    pub fn document(&self) -> Option<&FinalDocument> {
        self.run.as_ref().and_then(SessionRun::document)
    }

    pub fn projection(&self) -> Projection {
        let phase = self.phase();
        match self.run.as_ref() {
            Some(run) => Projection {
                run_id: Some(run.run_id().to_string()),
                query: Some(run.query().to_string()),
                status: Some(run.status()),
                phase,
                step: phase.step(),
                messages: run.feed().to_vec(),
                document: run.document().cloned(),
                latest_answer: run.latest_answer().map(str::to_string),
                milestone: run.milestone().map(Milestone::label),
                error: run.error().map(str::to_string),
            },
            None => Projection {
                run_id: None,
                query: None,
                status: None,
                phase,
                step: phase.step(),
                messages: Vec::new(),
                document: None,
                latest_answer: None,
                milestone: None,
                error: None,
            },
        }
    }

    fn retire_run(&mut self) {
        let Some(run) = self.run.take() else { return };
        let run_id = run.run_id().to_string();
        for entry in run.into_log() {
            if let Some(id) = entry.event.id() {
                self.retired_ids.insert(id.to_string());
            }
            if !matches!(entry.event, RawEvent::Unrecognized { .. }) {
                self.transcript.push(entry.event);
            }
        }
        debug!(run_id = %run_id, transcript = self.transcript.len(), "Run retired");
    }
}

fn is_retired(retired: &HashSet<String>, event: &RawEvent) -> bool {
    event.id().map(|id| retired.contains(id)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    fn message(value: serde_json::Value) -> StreamFrame {
        StreamFrame::Message { message: value }
    }

    #[test]
    fn empty_projector_awaits_input() {
        let projector = SessionProjector::default();
        let view = projector.projection();
        assert_eq!(view.phase, SessionPhase::AwaitingInput);
        assert_eq!(view.step.number, 1);
        assert!(view.messages.is_empty());
        assert!(view.run_id.is_none());
    }

    #[test]
    fn submit_seeds_human_turn() {
        let mut projector = SessionProjector::default();
        let payload = projector.submit_at("  Tokyo ", t0()).expect("submit");

        assert_eq!(payload.protocol_version, PROTOCOL_VERSION);
        assert_eq!(payload.messages.len(), 1);
        assert_eq!(payload.messages[0].content, Some(json!("Tokyo")));

        let view = projector.projection();
        assert_eq!(view.phase, SessionPhase::Validating);
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.query.as_deref(), Some("Tokyo"));
        assert_eq!(view.run_id.as_deref(), Some(payload.run_id.as_str()));
    }

    #[test]
    fn submit_rejects_empty_and_overlapping_runs() {
        let mut projector = SessionProjector::default();
        assert!(matches!(
            projector.submit_at("   ", t0()),
            Err(GuideError::EmptyQuery)
        ));

        projector.submit_at("Tokyo", t0()).expect("submit");
        assert!(matches!(
            projector.submit_at("Kyoto", t0()),
            Err(GuideError::RunInProgress { .. })
        ));

        projector.cancel().expect("cancel");
        projector.submit_at("Kyoto", t0()).expect("submit after cancel");
    }

    #[test]
    fn apply_without_run_fails() {
        let mut projector = SessionProjector::default();
        let err = projector
            .apply_at(StreamFrame::End, t0())
            .expect_err("no run");
        assert!(matches!(err, GuideError::NoActiveRun));
        assert!(matches!(projector.cancel(), Err(GuideError::NoActiveRun)));
    }

    #[test]
    fn error_frame_fails_run() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");

        let err = projector
            .apply_at(
                StreamFrame::Error {
                    message: "upstream timeout".to_string(),
                },
                t0(),
            )
            .expect_err("transport error");
        assert!(matches!(err, GuideError::Transport { .. }));

        let view = projector.projection();
        assert_eq!(view.status, Some(RunStatus::Failed));
        assert_eq!(view.error.as_deref(), Some("upstream timeout"));
        assert_eq!(view.messages.len(), 1);
    }

    #[test]
    fn blank_error_frame_gets_fallback_message() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");

        let err = projector
            .apply_at(
                StreamFrame::Error {
                    message: "  ".to_string(),
                },
                t0(),
            )
            .expect_err("transport error");
        match err {
            GuideError::Transport { message } => assert_eq!(message, UNKNOWN_STREAM_ERROR),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(
            projector.projection().error.as_deref(),
            Some(UNKNOWN_STREAM_ERROR)
        );
    }

    #[test]
    fn reset_after_close_keeps_transcript() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");
        projector.apply_at(StreamFrame::End, t0()).expect("end");
        projector.reset();

        assert!(projector.active_run().is_none());
        assert_eq!(projector.transcript().len(), 1);
    }

    #[test]
    fn frames_after_close_are_dropped() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");
        projector.apply_at(StreamFrame::End, t0()).expect("end");

        projector
            .apply_at(message(json!({"type": "ai", "content": "late"})), t0())
            .expect("dropped");
        assert_eq!(projector.messages().len(), 1);
        assert_eq!(projector.projection().status, Some(RunStatus::Completed));
    }

    #[test]
    fn update_sets_milestone_label() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");
        projector
            .apply_at(
                StreamFrame::Update {
                    data: json!({"check_location_info": {"location": "Tokyo"}}),
                },
                t0(),
            )
            .expect("update");
        assert_eq!(
            projector.projection().milestone.as_deref(),
            Some("Checking location info")
        );
    }

    #[test]
    fn second_run_resends_transcript_and_ignores_old_ids() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");
        projector
            .apply_at(
                message(json!({"type": "ai", "id": "a1", "content": "Tokyo is great"})),
                t0(),
            )
            .expect("message");
        projector.apply_at(StreamFrame::End, t0()).expect("end");

        let payload = projector.submit_at("Kyoto", t0()).expect("second submit");
        assert_eq!(payload.messages.len(), 3);
        assert_eq!(projector.transcript().len(), 2);

        projector
            .apply_at(
                message(json!({"type": "ai", "id": "a1", "content": "Tokyo is great"})),
                t0(),
            )
            .expect("replayed");
        let view = projector.projection();
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.messages[0].display_text, "Kyoto");
    }

    #[test]
    fn reset_clears_view() {
        let mut projector = SessionProjector::default();
        projector.submit_at("Tokyo", t0()).expect("submit");
        projector.reset();

        let view = projector.projection();
        assert!(view.run_id.is_none());
        assert_eq!(view.phase, SessionPhase::AwaitingInput);
        projector.submit_at("Osaka", t0()).expect("submit after reset");
    }
}
