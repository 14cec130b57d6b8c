//! Session lifecycle controller.
//!
//! Owns the session state, the progress ticker, the pending auto-run timer,
//! and all in-flight run/repair requests. Presentation layers drive it with
//! [`SessionCommand`]s and observe it through [`SessionEvent`]s; no failure
//! of the remote service ever surfaces as an error from the controller.

use crate::model::{
    now_rfc3339, ExecutionOutcome, Notice, OutcomeStatus, RepairSession, SessionConfig,
    SessionEvent,
};
use crate::orchestrator::budget::repair_budget;
use crate::orchestrator::ticker::{stop_ticker, Ticker};
use crate::personas::Persona;
use crate::service::{
    ExecutionService, RepairRequest, RunRequest, REPAIR_OK_STATUS, RUN_OK_SENTINEL,
};
use crate::session::Session;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Diagnostic shown when the run endpoint cannot be reached at all.
pub(crate) const RUN_TRANSPORT_DIAGNOSTIC: &str = "Runtime Error: Could not execute the code.";

/// Commands emitted by presentation layers to drive the session.
#[derive(Debug, Clone)]
pub(crate) enum SessionCommand {
    /// Replace the current code with a user edit.
    Edit { code: String },
    /// Execute the current code once.
    Run,
    /// Ask the service to iteratively repair the current code.
    Repair {
        instructions: String,
        persona: Persona,
    },
    /// Restore the pre-repair snapshot and discard the patch set.
    Revert,
    /// Reset the displayed outcome.
    ClearOutput,
    Quit,
}

/// Completions flowing back into the controller loop from spawned tasks.
enum TaskDone {
    Run(ExecutionOutcome),
    RepairOk {
        repair: RepairSession,
        outcome: ExecutionOutcome,
    },
    RepairErr,
    AutoRunFired { code: String },
}

/// Orchestrate run/repair requests based on commands and emit state changes
/// back to presentation layers. Returns when the command channel closes or a
/// `Quit` arrives.
pub(crate) async fn run_controller(
    cfg: SessionConfig,
    service: Arc<dyn ExecutionService>,
    initial_code: String,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<SessionCommand>,
) -> Result<()> {
    let mut session = Session::new(initial_code);
    let mut ticker: Option<Ticker> = None;
    let mut auto_run: Option<tokio::task::JoinHandle<()>> = None;
    let mut in_flight = 0usize;
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskDone>();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Edit { code }) => {
                        session.edit(code);
                    }
                    Some(SessionCommand::Run) => {
                        // A user-initiated run supersedes any pending auto-run.
                        cancel_auto_run(&mut auto_run);
                        begin_request(&mut in_flight, &event_tx);
                        spawn_run(
                            service.clone(),
                            session.current_code().to_string(),
                            done_tx.clone(),
                        );
                    }
                    Some(SessionCommand::Repair { instructions, persona }) => {
                        if instructions.trim().is_empty() {
                            let _ = event_tx.send(SessionEvent::Notice(Notice::MissingInstructions));
                        } else {
                            cancel_auto_run(&mut auto_run);
                            stop_ticker(&mut ticker);
                            ticker = Some(Ticker::start(
                                persona,
                                cfg.ticker_interval,
                                event_tx.clone(),
                            ));
                            let budget = repair_budget(session.current_code());
                            begin_request(&mut in_flight, &event_tx);
                            spawn_repair(
                                service.clone(),
                                session.current_code().to_string(),
                                instructions,
                                budget,
                                done_tx.clone(),
                            );
                        }
                    }
                    Some(SessionCommand::Revert) => {
                        stop_ticker(&mut ticker);
                        // A stale scheduled run must not overwrite the restored code.
                        cancel_auto_run(&mut auto_run);
                        if session.revert() {
                            let _ = event_tx.send(SessionEvent::Code {
                                code: session.current_code().to_string(),
                                repaired: false,
                            });
                            let _ = event_tx.send(SessionEvent::Patches { patches: vec![] });
                            let _ = event_tx.send(SessionEvent::Notice(Notice::Reverted));
                        }
                    }
                    Some(SessionCommand::ClearOutput) => {
                        let _ = event_tx.send(SessionEvent::Outcome {
                            outcome: ExecutionOutcome::idle(),
                        });
                    }
                    Some(SessionCommand::Quit) | None => break,
                }
            }
            Some(done) = done_rx.recv() => {
                match done {
                    TaskDone::Run(outcome) => {
                        finish_request(&mut in_flight, &event_tx);
                        let _ = event_tx.send(SessionEvent::Outcome { outcome });
                    }
                    TaskDone::RepairOk { repair, outcome } => {
                        // Ticker stop happens before the session mutation, and
                        // the mutation before the auto-run is armed.
                        stop_ticker(&mut ticker);
                        finish_request(&mut in_flight, &event_tx);
                        let iterations = repair.budget;
                        session.apply_repair(repair);
                        let final_code = session.current_code().to_string();
                        let _ = event_tx.send(SessionEvent::Code {
                            code: final_code.clone(),
                            repaired: true,
                        });
                        let _ = event_tx.send(SessionEvent::Patches {
                            patches: session.patches().to_vec(),
                        });
                        let _ = event_tx.send(SessionEvent::Outcome { outcome });
                        let _ = event_tx.send(SessionEvent::Notice(Notice::RepairCompleted {
                            iterations,
                        }));
                        schedule_auto_run(
                            &mut auto_run,
                            final_code,
                            cfg.auto_run_delay,
                            done_tx.clone(),
                        );
                    }
                    TaskDone::RepairErr => {
                        stop_ticker(&mut ticker);
                        finish_request(&mut in_flight, &event_tx);
                        let _ = event_tx.send(SessionEvent::Notice(Notice::RepairFailed));
                    }
                    TaskDone::AutoRunFired { code } => {
                        auto_run = None;
                        begin_request(&mut in_flight, &event_tx);
                        spawn_run(service.clone(), code, done_tx.clone());
                    }
                }
            }
        }
    }

    stop_ticker(&mut ticker);
    cancel_auto_run(&mut auto_run);
    Ok(())
}

fn begin_request(in_flight: &mut usize, event_tx: &UnboundedSender<SessionEvent>) {
    *in_flight += 1;
    if *in_flight == 1 {
        let _ = event_tx.send(SessionEvent::Busy { active: true });
    }
}

fn finish_request(in_flight: &mut usize, event_tx: &UnboundedSender<SessionEvent>) {
    *in_flight = in_flight.saturating_sub(1);
    if *in_flight == 0 {
        let _ = event_tx.send(SessionEvent::Busy { active: false });
    }
}

/// Execute `code` once and report the outcome. Transport failures are
/// absorbed into a fixed-diagnostic error outcome with no latency.
fn spawn_run(
    service: Arc<dyn ExecutionService>,
    code: String,
    done_tx: UnboundedSender<TaskDone>,
) {
    tokio::spawn(async move {
        let started = Instant::now();
        let outcome = match service.run(RunRequest { code }).await {
            Ok(resp) => {
                let mut output = resp.stdout;
                if !resp.stderr.is_empty() {
                    output.push('\n');
                    output.push_str(&resp.stderr);
                }
                let status = if resp.error_type == RUN_OK_SENTINEL {
                    OutcomeStatus::Success
                } else {
                    OutcomeStatus::Error
                };
                ExecutionOutcome {
                    output,
                    status,
                    error_kind: Some(resp.error_type),
                    latency_ms: Some(started.elapsed().as_millis() as u64),
                    timestamp_utc: now_rfc3339(),
                }
            }
            Err(_) => ExecutionOutcome {
                output: RUN_TRANSPORT_DIAGNOSTIC.to_string(),
                status: OutcomeStatus::Error,
                error_kind: None,
                latency_ms: None,
                timestamp_utc: now_rfc3339(),
            },
        };
        let _ = done_tx.send(TaskDone::Run(outcome));
    });
}

/// Issue a repair call with the computed iteration budget. A parsed response
/// becomes a `RepairOk` completion whatever its final status; a transport or
/// parse failure becomes `RepairErr` and leaves the session untouched.
fn spawn_repair(
    service: Arc<dyn ExecutionService>,
    code: String,
    instructions: String,
    budget: u32,
    done_tx: UnboundedSender<TaskDone>,
) {
    tokio::spawn(async move {
        let started = Instant::now();
        let req = RepairRequest {
            code,
            prompt: instructions,
            max_iterations: budget.to_string(),
        };
        let done = match service.repair(req).await {
            Ok(resp) => {
                let status = if resp.parsed_error.final_status == REPAIR_OK_STATUS {
                    OutcomeStatus::Success
                } else {
                    OutcomeStatus::Error
                };
                TaskDone::RepairOk {
                    repair: RepairSession {
                        budget,
                        patches: resp.changes,
                        final_code: resp.final_code,
                    },
                    outcome: ExecutionOutcome {
                        output: resp.parsed_error.last_iteration.stdout,
                        status,
                        error_kind: None,
                        latency_ms: Some(started.elapsed().as_millis() as u64),
                        timestamp_utc: now_rfc3339(),
                    },
                }
            }
            Err(_) => TaskDone::RepairErr,
        };
        let _ = done_tx.send(done);
    });
}

/// Arm the deferred run of repaired code, replacing any pending schedule.
fn schedule_auto_run(
    slot: &mut Option<tokio::task::JoinHandle<()>>,
    code: String,
    delay: Duration,
    done_tx: UnboundedSender<TaskDone>,
) {
    cancel_auto_run(slot);
    *slot = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = done_tx.send(TaskDone::AutoRunFired { code });
    }));
}

fn cancel_auto_run(slot: &mut Option<tokio::task::JoinHandle<()>>) {
    // Dropping a JoinHandle does not cancel the task; abort explicitly.
    if let Some(h) = slot.take() {
        h.abort();
    }
}
