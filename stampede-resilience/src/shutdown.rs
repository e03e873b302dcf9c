//! Shutdown signalling
//!
//! A run is stopped by flipping a shared flag. Dispatchers check it before
//! launching new work and may await it alongside their own work; anything
//! already in flight is left to finish so recorded metrics stay consistent.

use log::{info, warn};
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;

/// Exit status used when a second interrupt aborts the process
pub const FORCED_EXIT_CODE: i32 = 130;

/// Why an interrupt listener stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// An interrupt arrived while shutdown was already underway
    Forced,
    /// The interrupt source failed; no further interrupts will be seen
    Unavailable,
}

/// Cloneable, level-triggered shutdown flag
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request shutdown; idempotent
    pub fn trigger(&self) {
        let changed = self.sender.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        });
        if changed {
            info!("Shutdown requested, no new work will be dispatched");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown has been requested
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as any clone of self, so this cannot fail
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }

    /// Trigger this signal on each interrupt from `next_interrupt`.
    ///
    /// The first interrupt requests a graceful shutdown. Any interrupt that
    /// arrives once shutdown is underway returns [`InterruptOutcome::Forced`].
    pub async fn watch_interrupts<F, Fut>(&self, mut next_interrupt: F) -> InterruptOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = io::Result<()>>,
    {
        loop {
            if let Err(e) = next_interrupt().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                return InterruptOutcome::Unavailable;
            }
            if self.is_triggered() {
                warn!("Interrupted again, exiting without waiting for in-flight requests");
                return InterruptOutcome::Forced;
            }
            warn!("Interrupted, finishing in-flight requests (Ctrl-C again to exit now)");
            self.trigger();
        }
    }

    /// Trigger this signal on the first Ctrl-C and exit the process on the second
    pub fn trigger_on_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            if signal.watch_interrupts(tokio::signal::ctrl_c).await == InterruptOutcome::Forced {
                std::process::exit(FORCED_EXIT_CODE);
            }
        })
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
