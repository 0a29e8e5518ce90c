//! Start-to-start spacing for provider calls

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Hands out start slots at least `interval` apart
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next free slot. The first caller goes immediately.
    pub async fn wait(&self) {
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();

        let start = match *next_slot {
            Some(slot) if slot > now => {
                sleep_until(slot).await;
                slot
            }
            _ => now,
        };

        *next_slot = Some(start + self.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slots_are_spaced() {
        let pacer = Pacer::new(Duration::from_millis(30));
        let begin = Instant::now();

        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(begin.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = Pacer::new(Duration::ZERO);
        let begin = Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        assert!(begin.elapsed() < Duration::from_millis(50));
    }
}
