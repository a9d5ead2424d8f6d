//! Parallel document processing utilities.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

/// Result of a parallel batch operation.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn ok_or_bail(&self, operation: &str) -> Result<()> {
        if !self.all_succeeded() {
            bail!("{operation} failed: {} succeeded, {} failed", self.succeeded, self.failed);
        }
        Ok(())
    }
}

/// Collect results from parallel operations without printing.
pub fn collect_parallel<T, R, F>(items: &[T], op: F) -> Vec<Result<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    items.par_iter().map(op).collect()
}

/// Run a report-producing operation on every file in parallel, then print the
/// reports in input order.
pub fn report_parallel<F>(paths: &[PathBuf], op: F) -> BatchResult
where
    F: Fn(&Path) -> Result<String> + Sync + Send,
{
    let results = collect_parallel(paths, |path| {
        op(path).with_context(|| format!("Failed to process {}", path.display()))
    });

    let mut batch = BatchResult::default();
    for result in results {
        match result {
            Ok(report) => {
                println!("{report}");
                batch.succeeded += 1;
            }
            Err(e) => {
                eprintln!("{e:?}");
                batch.failed += 1;
            }
        }
    }
    batch
}
