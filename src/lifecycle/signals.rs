//! Termination triggers.
//!
//! # Responsibilities
//! - Listen for SIGINT, SIGTERM and (opt-in) end of stdin
//! - Translate them into `Trigger` events
//! - Let tests inject triggers without touching OS signal delivery
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - All sources feed one channel; the controller only sees triggers
//! - The first trigger stops the controller, later ones are no-ops

use std::fmt;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

/// Why a graceful stop was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Interrupt,
    Terminate,
    EndOfInput,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "interrupt",
            Self::Terminate => "terminate",
            Self::EndOfInput => "end-of-input",
        })
    }
}

/// Sending half returned by [`Signals::channel`].
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::UnboundedSender<Trigger>,
}

impl SignalSender {
    /// Deliver a trigger. Returns false once nothing is listening.
    pub fn fire(&self, trigger: Trigger) -> bool {
        self.tx.send(trigger).is_ok()
    }
}

/// A stream of termination triggers handed to `Controller::start_with_signals`.
#[derive(Debug)]
pub struct Signals {
    rx: mpsc::UnboundedReceiver<Trigger>,
    tx: mpsc::UnboundedSender<Trigger>,
}

impl Signals {
    /// An injectable source with no OS listeners attached.
    pub fn channel() -> (SignalSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SignalSender { tx: tx.clone() }, Self { rx, tx })
    }

    /// Interrupt and terminate signals from the OS.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn os() -> Self {
        let (_, signals) = Self::channel();

        let tx = signals.tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = tx.send(Trigger::Interrupt);
                }
                Err(e) => tracing::warn!(error = %e, "Failed to install interrupt handler"),
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let tx = signals.tx.clone();
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::spawn(async move {
                        if term.recv().await.is_some() {
                            let _ = tx.send(Trigger::Terminate);
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Failed to install terminate handler"),
            }
        }

        signals
    }

    /// Also trigger when stdin reaches end of input. Consumes stdin.
    pub fn with_end_of_input(self) -> Self {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut stdin = tokio::io::stdin();
            let mut buf = [0u8; 1024];
            loop {
                match stdin.read(&mut buf).await {
                    Ok(0) => {
                        let _ = tx.send(Trigger::EndOfInput);
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "Stopped watching stdin");
                        break;
                    }
                }
            }
        });
        self
    }

    /// Next trigger, or `None` once every source is gone.
    pub(crate) async fn recv(&mut self) -> Option<Trigger> {
        self.rx.recv().await
    }
}
