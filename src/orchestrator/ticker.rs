//! Progress ticker: rotating persona messages while a repair is in flight.

use crate::model::SessionEvent;
use crate::personas::Persona;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Handle for a running ticker task. The controller keeps at most one alive;
/// replacing it goes through [`stop_ticker`] so the previous task is aborted
/// before a new one starts.
pub(crate) struct Ticker {
    handle: tokio::task::JoinHandle<()>,
}

impl Ticker {
    /// Spawn the ticker: emit the first message immediately, then rotate
    /// through the persona's messages every `interval`.
    pub(crate) fn start(
        persona: Persona,
        interval: Duration,
        event_tx: UnboundedSender<SessionEvent>,
    ) -> Ticker {
        let messages = persona.messages();
        let handle = tokio::spawn(async move {
            let _ = event_tx.send(SessionEvent::Output {
                text: messages[0].to_string(),
            });
            let mut ticks = tokio::time::interval(interval);
            // The first interval tick completes immediately; message[0] is
            // already on the wire, so consume it.
            ticks.tick().await;
            let mut idx = 0usize;
            loop {
                ticks.tick().await;
                idx = (idx + 1) % messages.len();
                let _ = event_tx.send(SessionEvent::Output {
                    text: messages[idx].to_string(),
                });
            }
        });
        Ticker { handle }
    }

    fn stop(self) {
        // Dropping a JoinHandle does not cancel the task in Tokio; abort
        // explicitly so no further messages are emitted.
        self.handle.abort();
    }
}

/// Stop the ticker in `slot`, if any. Safe to call repeatedly or when no
/// ticker was ever started.
pub(crate) fn stop_ticker(slot: &mut Option<Ticker>) {
    if let Some(t) = slot.take() {
        t.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const TICK: Duration = Duration::from_millis(10);

    fn recv_text(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Option<String> {
        match rx.try_recv() {
            Ok(SessionEvent::Output { text }) => Some(text),
            _ => None,
        }
    }

    #[tokio::test]
    async fn first_message_is_emitted_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = Some(Ticker::start(Persona::Hacker, Duration::from_secs(60), tx));
        let ev = rx.recv().await.unwrap();
        match ev {
            SessionEvent::Output { text } => {
                assert_eq!(text, Persona::Hacker.messages()[0]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        stop_ticker(&mut slot);
    }

    #[tokio::test]
    async fn rotation_wraps_around() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let messages = Persona::Corporate.messages();
        let mut slot = Some(Ticker::start(Persona::Corporate, TICK, tx));

        let mut seen = Vec::new();
        for _ in 0..messages.len() + 2 {
            match rx.recv().await.unwrap() {
                SessionEvent::Output { text } => seen.push(text),
                other => panic!("unexpected event: {:?}", other),
            }
        }
        stop_ticker(&mut slot);

        for (i, text) in seen.iter().enumerate() {
            assert_eq!(text, messages[i % messages.len()]);
        }
    }

    #[tokio::test]
    async fn stop_halts_emission_and_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = Some(Ticker::start(Persona::Hacker, TICK, tx));
        let _ = rx.recv().await.unwrap();

        stop_ticker(&mut slot);
        stop_ticker(&mut slot);

        // Messages queued before the abort landed are fine; nothing may
        // arrive after the drain.
        tokio::time::sleep(TICK * 5).await;
        while recv_text(&mut rx).is_some() {}
        tokio::time::sleep(TICK * 5).await;
        assert!(recv_text(&mut rx).is_none());
    }

    #[tokio::test]
    async fn replacement_leaves_one_ticker_running() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut slot = Some(Ticker::start(Persona::Hacker, TICK, tx.clone()));
        let _ = rx.recv().await.unwrap();

        stop_ticker(&mut slot);
        slot = Some(Ticker::start(Persona::Corporate, TICK, tx));
        tokio::time::sleep(TICK * 3).await;

        // Drain anything queued before the swap, then verify only corporate
        // messages keep arriving.
        let hacker = Persona::Hacker.messages();
        let mut tail = Vec::new();
        while let Some(text) = recv_text(&mut rx) {
            tail.push(text);
        }
        let last = tail.last().expect("replacement ticker should have emitted");
        assert!(!hacker.contains(&last.as_str()));
        stop_ticker(&mut slot);
    }
}
