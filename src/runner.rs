//! Execution of independent analysis runs.
//!
//! Clustering runs for different offense categories or events share nothing
//! but an immutable snapshot of the input records, so they are executed in
//! parallel with each run's outcome isolated: one failed run never blocks
//! the rest. Long runs can be bounded by a time budget; on expiry the run is
//! abandoned and reported as a timeout, never retried with the same inputs.

use crate::error::{Error, Result};
use rayon::prelude::*;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs `run` over every input in parallel, collecting per-input results in
/// input order. Failures stay local to their input.
pub fn run_parallel<S, R, F>(inputs: &[S], run: F) -> Vec<Result<R>>
where
    S: Sync,
    R: Send,
    F: Fn(&S) -> Result<R> + Send + Sync,
{
    inputs.par_iter().map(run).collect()
}

/// Runs `job` on a worker thread, waiting at most `budget` for the result.
///
/// On expiry the worker is abandoned (it cannot be cancelled mid-iteration)
/// and [`Error::Timeout`] is returned; the caller must adjust parameters
/// before trying again, since an identical rerun would also time out.
pub fn run_with_timeout<R, F>(budget: Duration, job: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may have given up already; nothing to do about it
        let _ = tx.send(job());
    });
    match rx.recv_timeout(budget) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::Timeout { budget }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::RunFailed(
            "worker ended without producing a result".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_stay_isolated() {
        let inputs = vec![1_usize, 0, 3];
        let results = run_parallel(&inputs, |&n| {
            if n == 0 {
                Err(Error::RunFailed("empty input".to_string()))
            } else {
                Ok(n * 2)
            }
        });
        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), 2);
        assert!(results[1].is_err());
        assert_eq!(*results[2].as_ref().unwrap(), 6);
    }

    #[test]
    fn budget_expiry_reports_timeout() {
        let result: Result<()> = run_with_timeout(Duration::from_millis(20), || {
            thread::sleep(Duration::from_secs(5));
            Ok(())
        });
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[test]
    fn fast_jobs_complete_within_budget() {
        let result = run_with_timeout(Duration::from_secs(5), || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }
}
