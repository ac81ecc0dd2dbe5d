//! Fixed-delay pacing between deployment steps.

use std::time::Duration;

/// Default delay between paced steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(4500);

/// Inserts a fixed pause between deployment steps so a run does not hammer
/// the node with back-to-back requests. The pause counter exists purely for
/// progress logging; there is no cancellation, the delay always completes.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    pauses: u64,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pauses: 0 }
    }

    /// Number of pauses taken so far in this process lifetime.
    pub fn pauses(&self) -> u64 {
        self.pauses
    }

    pub async fn wait(&mut self) {
        self.pauses += 1;
        tracing::debug!(
            pause = self.pauses,
            delay_ms = self.delay.as_millis() as u64,
            "Waiting before the next step..."
        );
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pause_counter_increments() {
        let mut pacer = Pacer::new(Duration::from_millis(1));
        assert_eq!(pacer.pauses(), 0);

        pacer.wait().await;
        pacer.wait().await;
        assert_eq!(pacer.pauses(), 2);
    }

    #[test]
    fn test_default_delay() {
        let pacer = Pacer::default();
        assert_eq!(pacer.delay, DEFAULT_STEP_DELAY);
    }
}
