use rayon::prelude::*;
use thiserror::Error;

/// Number of output elements from which [`ExecutionStrategy::Auto`] switches to rayon.
pub const AUTO_PARALLEL_THRESHOLD: usize = 1 << 16;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the lines of a convolution pass are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Serial for small passes, the global rayon pool once a pass writes at least
    /// [`AUTO_PARALLEL_THRESHOLD`] elements.
    #[default]
    Auto,

    /// Run sequentially on the current thread.
    Serial,

    /// Use the global rayon thread pool to process lines in parallel.
    Parallel,

    /// Run on a local thread pool with `n` threads.
    ///
    /// The pool is built once per [`LineExecutor`], that is once per convolution call.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Whether a pass writing `numel` elements runs on more than the calling thread.
    pub fn is_parallel(&self, numel: usize) -> bool {
        match self {
            ExecutionStrategy::Auto => numel >= AUTO_PARALLEL_THRESHOLD,
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel | ExecutionStrategy::Fixed(_) => true,
        }
    }
}

/// Schedules the lines of convolution passes under an [`ExecutionStrategy`].
///
/// For [`ExecutionStrategy::Fixed`] the local thread pool is built once, so every pass run
/// through the same executor shares it.
#[derive(Debug)]
pub struct LineExecutor {
    strategy: ExecutionStrategy,
    pool: Option<rayon::ThreadPool>,
}

impl LineExecutor {
    /// Creates an executor, building the local pool of a `Fixed` strategy.
    ///
    /// # Errors
    ///
    /// Fails for `Fixed(0)` or when the local thread pool cannot be built.
    pub fn new(strategy: ExecutionStrategy) -> Result<Self, ParallelError> {
        let pool = match strategy {
            ExecutionStrategy::Fixed(0) => return Err(ParallelError::InvalidThreadCount(0)),
            ExecutionStrategy::Fixed(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?,
            ),
            _ => None,
        };
        Ok(Self { strategy, pool })
    }

    /// The strategy this executor was built for.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Splits `dst` into lines of `line_len` elements and calls `f(state, line_index, line)`
    /// on each of them, stopping at the first error.
    ///
    /// `init` creates the per-worker scratch state, so a serial run creates it once and a
    /// parallel run once per rayon job split.
    pub fn for_each_line_init<T, S, E, I, F>(
        &self,
        dst: &mut [T],
        line_len: usize,
        init: I,
        f: F,
    ) -> Result<(), E>
    where
        T: Send,
        E: Send,
        I: Fn() -> S + Sync + Send,
        F: Fn(&mut S, usize, &mut [T]) -> Result<(), E> + Sync + Send,
    {
        if line_len == 0 || dst.is_empty() {
            return Ok(());
        }

        let run_parallel = |dst: &mut [T]| {
            dst.par_chunks_mut(line_len)
                .enumerate()
                .try_for_each_init(&init, |state, (index, line)| f(state, index, line))
        };

        match &self.pool {
            Some(pool) => pool.install(|| run_parallel(dst)),
            None if self.strategy.is_parallel(dst.len()) => run_parallel(dst),
            None => {
                let mut state = init();
                dst.chunks_mut(line_len)
                    .enumerate()
                    .try_for_each(|(index, line)| f(&mut state, index, line))
            }
        }
    }
}
