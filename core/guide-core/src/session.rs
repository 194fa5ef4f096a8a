//! A single run: one submitted query and everything the agent streams back.
//!
//! The run owns its raw log. Feed, phase and the finalize check are
//! recomputed from the full log on every update; nothing is folded
//! incrementally, so replays and out-of-order arrivals converge.
//!
//! ```text
//! start ──► Streaming ──► Completed   (stream end)
//!               │  └────► Failed      (agent/transport error)
//!               └───────► Cancelled   (caller stop)
//! ```

use chrono::{DateTime, Utc};
use guide_protocol::{Milestone, RawEvent};
use serde::Serialize;
use tracing::{debug, info};
use ulid::Ulid;

use crate::classifier::project;
use crate::config::ProjectorConfig;
use crate::document::{try_finalize, FinalDocument};
use crate::error::{GuideError, Result};
use crate::phase::{compute_phase, SessionPhase};
use crate::types::ProjectedMessage;

/// A raw event with the time it entered the log.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    pub event: RawEvent,
    pub received_at: DateTime<Utc>,
}

impl LoggedEvent {
    pub fn new(event: RawEvent, received_at: DateTime<Utc>) -> Self {
        Self { event, received_at }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Streaming => "streaming",
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_open(&self) -> bool {
        *self == RunStatus::Streaming
    }
}

/// What an ingested event did to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Appended,
    Replaced,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct SessionRun {
    run_id: String,
    query: String,
    started_at: DateTime<Utc>,
    log: Vec<LoggedEvent>,
    finalize_signal_seen: bool,
    document: Option<FinalDocument>,
    status: RunStatus,
    error: Option<String>,
    milestone: Option<Milestone>,
    feed: Vec<ProjectedMessage>,
    phase: SessionPhase,
}

impl SessionRun {
    pub fn start(query: &str, now: DateTime<Utc>) -> Self {
        Self {
            run_id: Ulid::new().to_string(),
            query: query.to_string(),
            started_at: now,
            log: Vec::new(),
            finalize_signal_seen: false,
            document: None,
            status: RunStatus::Streaming,
            error: None,
            milestone: None,
            feed: Vec::new(),
            phase: SessionPhase::AwaitingInput,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn log(&self) -> &[LoggedEvent] {
        &self.log
    }

    pub fn into_log(self) -> Vec<LoggedEvent> {
        self.log
    }

    pub fn feed(&self) -> &[ProjectedMessage] {
        &self.feed
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn document(&self) -> Option<&FinalDocument> {
        self.document.as_ref()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn milestone(&self) -> Option<&Milestone> {
        self.milestone.as_ref()
    }

    pub fn finalize_signal_seen(&self) -> bool {
        self.finalize_signal_seen
    }

    /// Text of the most recent assistant answer, for the live answer panel.
    ///
    /// Read from the feed, so blank turns and snapshot sentinels never show.
    pub fn latest_answer(&self) -> Option<&str> {
        self.feed
            .iter()
            .rev()
            .find(|message| message.is_answer())
            .map(|message| message.display_text.as_str())
    }

    /// Adds one event. An event whose id is already logged replaces that entry
    /// in place and keeps its original receive time.
    pub fn ingest(
        &mut self,
        event: RawEvent,
        now: DateTime<Utc>,
        config: &ProjectorConfig,
    ) -> Result<Ingested> {
        self.ensure_open()?;
        let outcome = upsert(&mut self.log, event, now);
        self.refresh(now, config);
        Ok(outcome)
    }

    /// Merges a full snapshot of the agent's message list into the log.
    ///
    /// The log stays append-only: snapshot entries upsert by id, and entries
    /// without an id are appended only when the snapshot holds more copies of
    /// them than the log does.
    pub fn merge_snapshot(
        &mut self,
        events: Vec<RawEvent>,
        now: DateTime<Utc>,
        config: &ProjectorConfig,
    ) -> Result<()> {
        self.ensure_open()?;
        let mut anonymous: Vec<RawEvent> = Vec::new();
        for event in events {
            if event.id().is_some() {
                upsert(&mut self.log, event, now);
                continue;
            }
            let occurrence = anonymous.iter().filter(|seen| **seen == event).count() + 1;
            let logged = self
                .log
                .iter()
                .filter(|entry| entry.event == event)
                .count();
            if logged < occurrence {
                self.log.push(LoggedEvent::new(event.clone(), now));
            }
            anonymous.push(event);
        }
        self.refresh(now, config);
        Ok(())
    }

    pub fn observe_milestone(
        &mut self,
        milestone: Milestone,
        now: DateTime<Utc>,
        config: &ProjectorConfig,
    ) -> Result<()> {
        self.ensure_open()?;
        if milestone == Milestone::Finalize && !self.finalize_signal_seen {
            info!(run_id = %self.run_id, "Finalize signal observed");
            self.finalize_signal_seen = true;
        }
        debug!(run_id = %self.run_id, milestone = milestone.as_str(), "Milestone");
        self.milestone = Some(milestone);
        self.refresh(now, config);
        Ok(())
    }

    pub fn fail(&mut self, message: &str) -> Result<()> {
        self.ensure_open()?;
        self.status = RunStatus::Failed;
        self.error = Some(message.to_string());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_open()?;
        info!(run_id = %self.run_id, messages = self.feed.len(), "Run cancelled");
        self.status = RunStatus::Cancelled;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        self.ensure_open()?;
        info!(
            run_id = %self.run_id,
            phase = self.phase.as_str(),
            has_document = self.document.is_some(),
            "Run completed"
        );
        self.status = RunStatus::Completed;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(GuideError::RunClosed {
                run_id: self.run_id.clone(),
                status: self.status.as_str().to_string(),
            })
        }
    }

    fn refresh(&mut self, now: DateTime<Utc>, config: &ProjectorConfig) {
        self.feed = project(&self.log, &config.classifier);
        self.phase = compute_phase(&self.feed, config.phase.finalize_threshold_chars);

        if !self.finalize_signal_seen || self.document.is_some() {
            return;
        }

        match try_finalize(&self.feed, &self.log, &config.classifier) {
            Some(answer) => {
                let document =
                    FinalDocument::build(&self.run_id, &self.query, answer, &config.guide, now);
                info!(
                    run_id = %self.run_id,
                    document_id = %document.id,
                    history = document.history.len(),
                    "Travel guide finalized"
                );
                self.document = Some(document);
            }
            None => debug!(run_id = %self.run_id, "Finalize pending; no answer yet"),
        }
    }
}

fn upsert(log: &mut Vec<LoggedEvent>, event: RawEvent, received_at: DateTime<Utc>) -> Ingested {
    let existing = event
        .id()
        .and_then(|id| log.iter().position(|entry| entry.event.id() == Some(id)));

    match existing {
        Some(index) if log[index].event == event => Ingested::Unchanged,
        Some(index) => {
            log[index].event = event;
            Ingested::Replaced
        }
        None => {
            log.push(LoggedEvent::new(event, received_at));
            Ingested::Appended
        }
    }
}
