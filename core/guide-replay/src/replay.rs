//! `replay` subcommand: one run driven by a recorded stream.

use guide_core::{load_projector_config, GuideError, Projection, SessionProjector};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::input::{frames, read_input};
use crate::OutputFormat;

pub fn run(
    query: &str,
    input: Option<&Path>,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), String> {
    let config = load_projector_config(config)?;
    let mut projector = SessionProjector::new(config);
    let payload = projector.submit(query)?;
    info!(
        run_id = %payload.run_id,
        messages = payload.messages.len(),
        "Replaying stream"
    );

    let input = read_input(input)?;
    let outcome = replay_frames(&mut projector, &input);

    let projection = projector.projection();
    match format {
        OutputFormat::Text => print!("{}", render_text(&projection)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&projection)
                .map_err(|e| format!("Failed to serialize projection: {}", e))?;
            println!("{}", json);
        }
    }

    outcome
}

/// Applies every frame in `input` to the active run.
///
/// Stops at the first unparseable line (failing the run) or transport error.
pub fn replay_frames(projector: &mut SessionProjector, input: &str) -> Result<(), String> {
    for (line, frame) in frames(input) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(info) => {
                let message = format!("line {}: {}", line, GuideError::from(info));
                if let Err(e) = projector.fail(&message) {
                    debug!(error = %e, "Run already closed");
                }
                return Err(message);
            }
        };
        projector
            .apply(frame)
            .map_err(|e| format!("line {}: {}", line, e))?;
    }

    if let Some(run) = projector.active_run().filter(|run| run.status().is_open()) {
        warn!(run_id = %run.run_id(), "Stream ended without an end frame");
    }
    Ok(())
}

pub fn render_text(projection: &Projection) -> String {
    let mut lines = Vec::new();

    match (&projection.run_id, projection.status) {
        (Some(run_id), Some(status)) => lines.push(format!("Run {} ({})", run_id, status.as_str())),
        _ => lines.push("No active run".to_string()),
    }
    if let Some(query) = &projection.query {
        lines.push(format!("Query: {}", query));
    }
    lines.push(format!(
        "Step {}/{}: {} - {}",
        projection.step.number,
        guide_core::phase::WORKFLOW_STEP_COUNT,
        projection.step.name,
        projection.step.description
    ));
    if let Some(milestone) = &projection.milestone {
        lines.push(format!("Milestone: {}", milestone));
    }
    if let Some(error) = &projection.error {
        lines.push(format!("Error: {}", error));
    }

    if !projection.messages.is_empty() {
        lines.push(String::new());
        lines.push("Feed:".to_string());
        for message in &projection.messages {
            let line = match &message.tool_name {
                Some(tool) => format!(
                    "  [{}] {} ({})",
                    message.kind.as_str(),
                    message.display_text,
                    tool
                ),
                None => format!("  [{}] {}", message.kind.as_str(), message.display_text),
            };
            lines.push(line);
        }
    }

    if let Some(document) = &projection.document {
        lines.push(String::new());
        lines.push(format!("Guide {} for {}", document.id, document.destination));
        lines.push(document.overview.clone());
        lines.push(format!("Best time to visit: {}", document.best_time_to_visit));
        lines.push(format!("Estimated budget: {}", document.estimated_budget));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use guide_core::{RunStatus, SessionPhase};

    const STREAM: &str = r#"{"event":"update","data":{"check_location_info":{}}}
{"event":"message","message":{"type":"ai","id":"ai-1","content":"","tool_calls":[{"id":"call-1","name":"maps_weather","args":{"city":"Tokyo"}}]}}
{"event":"message","message":{"type":"tool","id":"tool-1","name":"maps_weather","tool_call_id":"call-1","content":{"temp":18}}}
{"event":"update","data":{"finalize_answer":{}}}
{"event":"message","message":{"type":"ai","id":"ai-2","content":"Pack a light jacket: Tokyo in October is mild, around eighteen degrees."}}
{"event":"end"}
"#;

    #[test]
    fn replays_to_a_finished_guide() {
        let mut projector = SessionProjector::default();
        projector.submit("Tokyo").expect("submit");
        replay_frames(&mut projector, STREAM).expect("replay");

        let view = projector.projection();
        assert_eq!(view.status, Some(RunStatus::Completed));
        assert_eq!(view.phase, SessionPhase::Finalizing);
        assert!(view.document.is_some());

        let text = render_text(&view);
        assert!(text.contains("Query: Tokyo"));
        assert!(text.contains("Step 5/5: Build guide"));
        assert!(text.contains("  [ai] Checking the weather... (maps_weather)"));
        assert!(text.contains("Guide guide-"));
    }

    #[test]
    fn bad_line_fails_the_run() {
        let mut projector = SessionProjector::default();
        projector.submit("Tokyo").expect("submit");
        let input = "{\"event\":\"update\",\"data\":{\"reflection\":{}}}\n{oops\n";

        let err = replay_frames(&mut projector, input).expect_err("bad frame");
        assert!(err.starts_with("line 2: Invalid stream frame: invalid_frame:"));
        let view = projector.projection();
        assert_eq!(view.status, Some(RunStatus::Failed));
        assert!(render_text(&view).contains("Error: line 2:"));
    }

    #[test]
    fn transport_error_is_reported() {
        let mut projector = SessionProjector::default();
        projector.submit("Tokyo").expect("submit");
        let input = "{\"event\":\"error\",\"message\":\"upstream timeout\"}\n";

        let err = replay_frames(&mut projector, input).expect_err("transport");
        assert!(err.contains("upstream timeout"));
    }

    #[test]
    fn empty_projection_renders() {
        let text = render_text(&SessionProjector::default().projection());
        assert!(text.starts_with("No active run"));
        assert!(text.contains("Step 1/5"));
    }
}
