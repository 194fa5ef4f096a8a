//! # guide-core
//!
//! Session projector for the travel-guide agent. Turns the agent's raw,
//! heterogeneous message stream into a display-ready feed, a coarse
//! workflow phase, and a final travel guide.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients own the transport.
//! - **Pure projection**: Feed and phase are recomputed from the whole raw log
//!   on every update; replaying the same log gives the same view.
//! - **Graceful degradation**: Unknown or malformed agent messages are dropped,
//!   never raised.
//! - **One run at a time**: A new query discards the previous run's view.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use guide_core::SessionProjector;
//!
//! let mut projector = SessionProjector::default();
//! projector.submit("Tokyo")?;
//! projector.apply(frame)?;
//! println!("{:?}", projector.phase());
//! ```

pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod labels;
pub mod phase;
pub mod projector;
pub mod session;
pub mod types;

pub use classifier::{classify, project};
pub use config::{load_projector_config, ProjectorConfig};
pub use document::{try_finalize, FinalAnswer, FinalDocument};
pub use error::{GuideError, Result};
pub use phase::{compute_phase, SessionPhase, WorkflowStep};
pub use projector::{Projection, SessionProjector};
pub use session::{LoggedEvent, RunStatus, SessionRun};
pub use types::{MessageKind, ProjectedMessage};
