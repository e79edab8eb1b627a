//! Batch coordinator for per-shot work
//!
//! Dispatches N independent tasks over a bounded pool and hands back every
//! outcome once all N have reported in. Progress and failure classification
//! are derived from the collected outcomes.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

/// Result of one task, tagged with its label (usually the shot name)
#[derive(Debug)]
pub struct TaskOutcome<T, E> {
    pub label: String,
    pub result: Result<T, E>,
}

/// All outcomes of a finished batch
#[derive(Debug)]
pub struct BatchReport<T, E> {
    outcomes: Vec<TaskOutcome<T, E>>,
    dispatched: usize,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl<T, E> BatchReport<T, E> {
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    /// Completion percentage
    pub fn progress(&self) -> f64 {
        progress_percent(self.completed(), self.dispatched)
    }

    pub fn outcomes(&self) -> &[TaskOutcome<T, E>] {
        &self.outcomes
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &E)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Err(e) => Some((o.label.as_str(), e)),
            Ok(_) => None,
        })
    }

    /// Labels of failed tasks, sorted
    pub fn failed_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.failures().map(|(label, _)| label.to_string()).collect();
        labels.sort();
        labels
    }

    /// Every dispatched task failed
    pub fn is_total_failure(&self) -> bool {
        self.dispatched > 0 && self.success_count() == 0
    }

    /// Some, but not all, tasks failed
    pub fn is_partial_failure(&self) -> bool {
        let succeeded = self.success_count();
        succeeded > 0 && succeeded < self.dispatched
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Successful results keyed by label, sorted by label
    pub fn into_successes(self) -> Vec<(String, T)> {
        let mut successes: Vec<(String, T)> = self
            .outcomes
            .into_iter()
            .filter_map(|o| o.result.ok().map(|value| (o.label, value)))
            .collect();
        successes.sort_by(|a, b| a.0.cmp(&b.0));
        successes
    }
}

/// Runs batches of independent tasks with bounded concurrency
#[derive(Debug, Clone, Copy)]
pub struct BatchCoordinator {
    workers: usize,
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new(8)
    }
}

impl BatchCoordinator {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` for every item and wait for all of them.
    ///
    /// `on_progress` is called with `(completed, dispatched)` after each
    /// task reports in. Tasks never see each other's results.
    pub async fn run<I, T, E, F, Fut>(
        &self,
        items: Vec<(String, I)>,
        task: F,
        mut on_progress: impl FnMut(usize, usize),
    ) -> BatchReport<T, E>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let dispatched = items.len();
        let started_at = Utc::now();
        let task = &task;

        let mut pending = stream::iter(items)
            .map(|(label, item)| async move {
                let result = task(item).await;
                TaskOutcome { label, result }
            })
            .buffer_unordered(self.workers);

        let mut outcomes = Vec::with_capacity(dispatched);
        while let Some(outcome) = pending.next().await {
            tracing::debug!(
                "Batch task {} {} ({}/{})",
                outcome.label,
                if outcome.result.is_ok() { "finished" } else { "failed" },
                outcomes.len() + 1,
                dispatched
            );
            outcomes.push(outcome);
            on_progress(outcomes.len(), dispatched);
        }

        BatchReport {
            outcomes,
            dispatched,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

fn progress_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        (done as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn items(labels: &[&str]) -> Vec<(String, String)> {
        labels
            .iter()
            .map(|l| (l.to_string(), l.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let coordinator = BatchCoordinator::new(2);
        let mut seen = Vec::new();
        let report = coordinator
            .run(
                items(&["Sh01", "Sh02", "Sh03"]),
                |shot: String| async move {
                    if shot == "Sh02" {
                        Err(format!("{shot} missing"))
                    } else {
                        Ok(shot.len())
                    }
                },
                |done, total| seen.push((done, total)),
            )
            .await;

        assert_eq!(report.dispatched(), 3);
        assert_eq!(report.completed(), 3);
        assert!(report.is_partial_failure());
        assert!(!report.is_total_failure());
        assert_eq!(report.failed_labels(), vec!["Sh02"]);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(report.progress(), 100.0);

        let ok: Vec<String> = report.into_successes().into_iter().map(|(l, _)| l).collect();
        assert_eq!(ok, vec!["Sh01", "Sh03"]);
    }

    #[tokio::test]
    async fn test_total_failure() {
        let coordinator = BatchCoordinator::new(4);
        let report = coordinator
            .run(
                items(&["Sh01", "Sh02", "Sh03", "Sh04", "Sh05"]),
                |_shot: String| async { Err::<(), _>("offline") },
                |_, _| {},
            )
            .await;
        assert!(report.is_total_failure());
        assert!(!report.is_partial_failure());
        assert_eq!(report.failures().count(), 5);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let coordinator = BatchCoordinator::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let report = coordinator
            .run(
                items(&["a", "b", "c", "d", "e", "f"]),
                |_label: String| {
                    let running = running.clone();
                    let peak = peak.clone();
                    async move {
                        let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                        running.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, ()>(())
                    }
                },
                |_, _| {},
            )
            .await;

        assert_eq!(report.success_count(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = BatchCoordinator::default()
            .run(Vec::<(String, ())>::new(), |_| async { Ok::<(), ()>(()) }, |_, _| {})
            .await;
        assert_eq!(report.dispatched(), 0);
        assert!(!report.is_total_failure());
        assert_eq!(report.progress(), 100.0);
    }
}
