pub mod engine;
pub mod plan;
pub mod session;

pub use engine::{Orchestrator, PauseOutcome, SeekOutcome, SessionSummary};
pub use plan::{highlight_summary, PlaybackPlan, TimedArEvent, TimedHapticEvent, TimedScentEvent};
pub use session::{SessionState, SessionTable};
