use crate::error::RampError;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Ctrl-C handling for a sweep. The first interrupt stops the sweep after the
/// current rate, the second one ends the process.
#[derive(Debug, Clone)]
pub struct InterruptHandler {
    interrupted: Arc<AtomicBool>,
}

impl InterruptHandler {
    pub fn new(interrupted: Arc<AtomicBool>) -> Self {
        Self { interrupted }
    }

    /// Records one interrupt, returns true when the process should exit now.
    pub fn on_interrupt(&self) -> bool {
        if self.interrupted.swap(true, Ordering::SeqCst) {
            warn!("Second interrupt received, exiting.");
            return true;
        }
        warn!("Interrupt received, stopping after the current rate...");
        false
    }

    pub async fn listen(self) {
        while tokio::signal::ctrl_c().await.is_ok() {
            if self.on_interrupt() {
                process::exit(RampError::Interrupted.exit_code().into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_interrupt_sets_the_flag_and_second_one_exits() {
        let interrupted = Arc::new(AtomicBool::new(false));
        let handler = InterruptHandler::new(interrupted.clone());

        assert!(!handler.on_interrupt());
        assert!(interrupted.load(Ordering::SeqCst));
        assert!(handler.on_interrupt());
        assert!(handler.on_interrupt());
    }
}
