//! Parallelism configuration shared by the pipeline stages.
//!
//! Per-partition work is data independent once the partitioner has run, so
//! every stage can fan out over partitions. Components don't manage thread
//! pools; they receive a [`Parallelism`] flag and respect it.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, stages may use `rayon` parallel iterators.
/// When `Sequential`, stages process partitions one after another in key order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Fallible map. Stops at the first error in sequential mode; in parallel
    /// mode every item is still owned by exactly one worker and some error is
    /// returned once all workers have joined.
    #[inline]
    pub fn maybe_par_try_map<T, B, E, I, F>(self, iter: I, f: F) -> Result<Vec<B>, E>
    where
        T: Send,
        B: Send,
        E: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> Result<B, E> + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// # Errors
///
/// Returns the rayon error message if a dedicated pool cannot be built.
///
/// # Example
///
/// ```
/// use partition_ensemble::run_with_threads;
///
/// let answer = run_with_threads(1, |_| 42).unwrap();
/// assert_eq!(answer, 42);
/// ```
#[inline]
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, String> {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .map_err(|e| e.to_string())?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}
