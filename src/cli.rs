use crate::model::{ExecutionOutcome, Notice, SessionConfig, SessionEvent, SessionReport};
use crate::orchestrator::{run_controller, SessionCommand};
use crate::personas::Persona;
use crate::service::HttpExecutionService;
use anyhow::{Context, Result};
use clap::Parser;
use rand::RngCore;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sample program used when no source file is given.
const DEFAULT_CODE: &str = "def greet(name):\n    print(f\"Hello, {name}!\")\n\ngreet(\"Developer\")\n";

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "code-repair-cli",
    version,
    about = "Run code against a remote execution service and watch it get repaired"
)]
pub struct Cli {
    /// Base URL for the run/repair service
    #[arg(long, default_value = "http://localhost:8000")]
    pub base_url: String,

    /// Source file to execute (defaults to a built-in sample program)
    #[arg(long)]
    pub file: Option<std::path::PathBuf>,

    /// Repair instructions; when set, the session repairs the code and then
    /// runs the repaired version
    #[arg(long)]
    pub repair: Option<String>,

    /// Persona for the rotating progress messages shown during a repair
    #[arg(long, value_enum, default_value_t = Persona::Hacker)]
    pub persona: Persona,

    /// Print the final report as JSON and exit
    #[arg(long)]
    pub json: bool,

    /// Interval between rotating progress messages
    #[arg(long, default_value = "3500ms")]
    pub ticker_interval: humantime::Duration,

    /// Delay before the automatic run of freshly repaired code
    #[arg(long, default_value = "1500ms")]
    pub auto_run_delay: humantime::Duration,

    /// Export the final report as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,
}

/// Generate a random session ID for this invocation.
fn gen_session_id() -> String {
    let mut b = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut b);
    u64::from_le_bytes(b).to_string()
}

/// Build a `SessionConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SessionConfig {
    SessionConfig {
        base_url: args.base_url.clone(),
        session_id: gen_session_id(),
        ticker_interval: Duration::from(args.ticker_interval),
        auto_run_delay: Duration::from(args.auto_run_delay),
        user_agent: format!("code-repair-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let code = match args.file.as_deref() {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read source file {}", p.display()))?,
        None => DEFAULT_CODE.to_string(),
    };

    let cfg = build_config(&args);
    let service = Arc::new(HttpExecutionService::new(&cfg)?);
    run_session(args, cfg, service, code).await
}

/// Drive one session to completion: load the code, trigger a run or a
/// repair, and render the final report once the last outcome lands.
async fn run_session(
    args: Cli,
    cfg: SessionConfig,
    service: Arc<HttpExecutionService>,
    code: String,
) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<SessionCommand>();

    let controller_cfg = cfg.clone();
    let initial_code = code.clone();
    let handle = tokio::spawn(async move {
        run_controller(controller_cfg, service, initial_code, evt_tx, cmd_rx).await
    });

    let _ = out_tx.send(OutputLine::Stderr(format!(
        "Session {} -> {}",
        cfg.session_id, cfg.base_url
    )));

    let repairing = args.repair.is_some();
    let _ = cmd_tx.send(SessionCommand::Edit { code: code.clone() });
    match args.repair.clone() {
        Some(instructions) => {
            let _ = cmd_tx.send(SessionCommand::Repair {
                instructions,
                persona: args.persona,
            });
        }
        None => {
            let _ = cmd_tx.send(SessionCommand::Run);
        }
    }

    let mut outcome = ExecutionOutcome::idle();
    let mut patches = Vec::new();
    let mut final_code = code;
    let mut repair_done = false;
    let mut failure: Option<String> = None;

    while let Some(ev) = evt_rx.recv().await {
        match ev {
            SessionEvent::Output { text } => {
                let _ = out_tx.send(OutputLine::Stderr(text));
            }
            SessionEvent::Notice(notice) => {
                let _ = out_tx.send(OutputLine::Stderr(notice.to_message()));
                match notice {
                    Notice::MissingInstructions | Notice::RepairFailed => {
                        failure = Some(notice.to_message());
                        break;
                    }
                    Notice::RepairCompleted { .. } => repair_done = true,
                    Notice::Reverted => {}
                }
            }
            SessionEvent::Code { code, .. } => final_code = code,
            SessionEvent::Patches { patches: p } => patches = p,
            SessionEvent::Outcome { outcome: o } => {
                outcome = o;
                // In repair mode the terminal outcome is the deferred run of
                // the repaired code, which lands after the completion notice.
                if !repairing || repair_done {
                    break;
                }
            }
            SessionEvent::Busy { .. } => {}
        }
    }

    let _ = cmd_tx.send(SessionCommand::Quit);
    drop(cmd_tx);
    handle.await.context("session controller task failed")??;

    if let Some(msg) = failure {
        drop(out_tx);
        let _ = out_handle.await;
        return Err(anyhow::anyhow!(msg));
    }

    let report = SessionReport {
        outcome,
        patches,
        final_code,
    };

    if let Some(p) = args.export_json.as_deref() {
        let raw = serde_json::to_string_pretty(&report)?;
        std::fs::write(p, raw)
            .with_context(|| format!("failed to export report to {}", p.display()))?;
        let _ = out_tx.send(OutputLine::Stderr(format!("Exported: {}", p.display())));
    }

    if args.json {
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&report)?));
    } else {
        let summary = crate::text_summary::build_text_report(&report);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
