//! Fan-out helper: run a batch of independent store calls concurrently and
//! keep every outcome instead of failing on the first error.

use crate::types::error::AppError;
use futures::future::join_all;
use std::future::Future;
use tracing::warn;

pub struct Batch<T> {
    pub label: String,
    pub outcomes: Vec<Result<T, AppError>>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AppError> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Logs each failure and reduces the batch to its summary.
    pub fn summarize(self) -> BatchSummary {
        let failed: Vec<String> = self.failures().map(ToString::to_string).collect();
        for err in &failed {
            warn!("{}: {}", self.label, err);
        }
        BatchSummary {
            label: self.label,
            total: self.outcomes.len(),
            failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub label: String,
    pub total: usize,
    pub failed: Vec<String>,
}

/// Outcome of a multi-step operation: one summary per fan-out step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub batches: Vec<BatchSummary>,
}

impl Report {
    pub fn push<T>(&mut self, batch: Batch<T>) {
        self.batches.push(batch.summarize());
    }

    pub fn extend(&mut self, other: Report) {
        self.batches.extend(other.batches);
    }

    pub fn failure_count(&self) -> usize {
        self.batches.iter().map(|b| b.failed.len()).sum()
    }

    pub fn issued(&self) -> usize {
        self.batches.iter().map(|b| b.total).sum()
    }

    pub fn batch(&self, label: &str) -> Option<&BatchSummary> {
        self.batches.iter().find(|b| b.label == label)
    }
}

/// Awaits every future and returns all results in input order.
pub async fn join_collect<T, F>(label: impl Into<String>, futures: impl IntoIterator<Item = F>) -> Batch<T>
where
    F: Future<Output = Result<T, AppError>>,
{
    Batch {
        label: label.into(),
        outcomes: join_all(futures).await,
    }
}
