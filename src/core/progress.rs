// ULP Validator - core/progress.rs
//
// Run event delivery and progress throttling.
//
// A run publishes `RunEvent`s to a single `RunObserver`. The stock observer
// is an `mpsc::Sender<RunEvent>` drained by the front end; tests plug in
// their own observers to act at exact line counts. Observers run on the
// worker thread, so they must not block for long.

use crate::core::model::{ProgressSnapshot, RunEvent};
use std::sync::mpsc;

/// Receiver of a run's events.
pub trait RunObserver: Send {
    fn notify(&mut self, event: RunEvent);
}

impl RunObserver for mpsc::Sender<RunEvent> {
    fn notify(&mut self, event: RunEvent) {
        // A dropped receiver (front end gone) must not abort the merge.
        if self.send(event).is_err() {
            tracing::trace!("Run event receiver dropped; event discarded");
        }
    }
}

/// Throttled publisher of progress snapshots plus pass-through for the
/// terminal events.
pub struct ProgressChannel {
    observer: Box<dyn RunObserver>,
    interval: u64,
    last_published: Option<ProgressSnapshot>,
    /// A snapshot with `processed >= total` has gone out. A target that grew
    /// after the pre-count keeps `processed == total` on every later line.
    total_reached: bool,
}

impl ProgressChannel {
    /// `interval` is clamped to at least 1.
    pub fn new(observer: Box<dyn RunObserver>, interval: u64) -> Self {
        Self {
            observer,
            interval: interval.max(1),
            last_published: None,
            total_reached: false,
        }
    }

    /// Whether a snapshot falls on a throttle point: every `interval`
    /// processed lines, and the first line that reaches the total.
    pub fn should_publish(&self, snapshot: &ProgressSnapshot) -> bool {
        snapshot.processed % self.interval == 0
            || (snapshot.processed == snapshot.total && !self.total_reached)
    }

    /// Called after each fully handled line.
    pub fn line_processed(&mut self, snapshot: ProgressSnapshot) {
        if self.should_publish(&snapshot) {
            self.publish(snapshot);
        }
    }

    /// Deliver `snapshot` unconditionally.
    pub fn publish(&mut self, snapshot: ProgressSnapshot) {
        self.last_published = Some(snapshot);
        if snapshot.processed >= snapshot.total {
            self.total_reached = true;
        }
        self.observer.notify(RunEvent::Progress(snapshot));
    }

    /// Deliver the exact final counters at teardown, unless the last
    /// published snapshot already carries them.
    pub fn publish_final(&mut self, snapshot: ProgressSnapshot) {
        if self.last_published != Some(snapshot) {
            self.publish(snapshot);
        }
    }

    /// Deliver a terminal event.
    pub fn finish(&mut self, event: RunEvent) {
        self.observer.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(total: u64, processed: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            total,
            processed,
            valid: processed,
            rejected: 0,
        }
    }

    fn collect_processed(total: u64, interval: u64) -> Vec<u64> {
        let (tx, rx) = mpsc::channel::<RunEvent>();
        let mut channel = ProgressChannel::new(Box::new(tx), interval);
        for processed in 1..=total {
            channel.line_processed(snap(total, processed));
        }
        drop(channel);
        rx.try_iter()
            .filter_map(|e| match e {
                RunEvent::Progress(s) => Some(s.processed),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_publishes_every_interval_and_at_total() {
        assert_eq!(collect_processed(250, 100), vec![100, 200, 250]);
    }

    #[test]
    fn test_total_on_interval_publishes_once() {
        assert_eq!(collect_processed(200, 100), vec![100, 200]);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        assert_eq!(collect_processed(3, 0), vec![1, 2, 3]);
    }

    #[test]
    fn test_publish_final_skips_repeat() {
        let (tx, rx) = mpsc::channel::<RunEvent>();
        let mut channel = ProgressChannel::new(Box::new(tx), 100);
        channel.line_processed(snap(100, 100));
        channel.publish_final(snap(100, 100));
        channel.publish_final(snap(150, 120));
        drop(channel);

        let seen: Vec<u64> = rx
            .try_iter()
            .filter_map(|e| match e {
                RunEvent::Progress(s) => Some(s.processed),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec![100, 120]);
    }

    #[test]
    fn test_grown_target_does_not_publish_every_line() {
        // Pre-counted 5 lines, 12 processed: the total follows `processed`.
        let (tx, rx) = mpsc::channel::<RunEvent>();
        let mut channel = ProgressChannel::new(Box::new(tx), 100);
        for processed in 1..=12 {
            channel.line_processed(snap(processed.max(5), processed));
        }
        channel.publish_final(snap(12, 12));
        drop(channel);

        let seen: Vec<u64> = rx
            .try_iter()
            .filter_map(|e| match e {
                RunEvent::Progress(s) => Some(s.processed),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec![5, 12]);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel::<RunEvent>();
        drop(rx);
        let mut channel = ProgressChannel::new(Box::new(tx), 1);
        channel.line_processed(snap(1, 1));
        channel.finish(RunEvent::Failed {
            error: "x".to_string(),
        });
    }
}
