use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_url: String,
    pub session_id: String,
    #[serde(with = "humantime_serde")]
    pub ticker_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub auto_run_delay: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Idle,
    Success,
    Error,
}

/// Result of one completed Run or Repair, replaced whole on every completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// stdout with stderr appended after a line break when non-empty.
    pub output: String,
    pub status: OutcomeStatus,
    /// Service-reported error kind, when a response was received at all.
    #[serde(default)]
    pub error_kind: Option<String>,
    /// Absent when the request failed at the transport level.
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub timestamp_utc: String,
}

impl ExecutionOutcome {
    /// Outcome shown before any run has happened or after the output is cleared.
    pub fn idle() -> Self {
        Self {
            output: String::new(),
            status: OutcomeStatus::Idle,
            error_kind: None,
            latency_ms: None,
            timestamp_utc: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
}

/// One line-level change attributed to a single repair iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    #[serde(default)]
    pub iteration: u32,
    #[serde(default)]
    pub fix_method: String,
    #[serde(default)]
    pub error_type: String,
    pub change_type: ChangeType,
    #[serde(default)]
    pub line_old: Option<u32>,
    #[serde(default)]
    pub line_new: Option<u32>,
    #[serde(default)]
    pub old_text: String,
    #[serde(default)]
    pub new_text: String,
    #[serde(default)]
    pub reason: String,
}

/// Result of one completed repair call. Superseded entirely by the next
/// repair; destroyed by revert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairSession {
    pub budget: u32,
    pub patches: Vec<Patch>,
    pub final_code: String,
}

/// Events emitted by the session controller and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Transient display text (rotating progress messages while repairing).
    Output { text: String },
    /// A Run or Repair completed and replaced the displayed outcome.
    Outcome { outcome: ExecutionOutcome },
    /// The session's current code changed through a repair or revert.
    Code { code: String, repaired: bool },
    /// The stored patch set changed.
    Patches { patches: Vec<Patch> },
    /// Whether any request is currently in flight.
    Busy { active: bool },
    Notice(Notice),
}

/// User-facing notifications raised by session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingInstructions,
    RepairCompleted { iterations: u32 },
    RepairFailed,
    Reverted,
}

impl Notice {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            Notice::MissingInstructions => {
                "Missing instructions: enter a prompt before repairing.".to_string()
            }
            Notice::RepairCompleted { iterations } => {
                format!("Repair completed (iterations: {})", iterations)
            }
            Notice::RepairFailed => "Repair failed: unable to repair your code.".to_string(),
            Notice::Reverted => "Reverted: restored your last edited code.".to_string(),
        }
    }
}

/// Final report assembled by the CLI drivers for text/JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub outcome: ExecutionOutcome,
    pub patches: Vec<Patch>,
    pub final_code: String,
}

/// RFC3339 timestamp for completed outcomes.
pub(crate) fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
