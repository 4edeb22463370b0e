use std::str::FromStr;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, VistuneError};

/// Where a job's data-parallel work runs.
///
/// Parsed from Spark-style master strings: `local` (one worker),
/// `local[N]` and `local[*]` (all cores).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Master {
    /// In-process pool; `None` uses every available core.
    Local { threads: Option<usize> },
}

impl FromStr for Master {
    type Err = VistuneError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "local" {
            return Ok(Self::Local { threads: Some(1) });
        }
        let inner = s
            .strip_prefix("local[")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| VistuneError::UnsupportedMaster(s.to_string()))?;
        if inner == "*" {
            return Ok(Self::Local { threads: None });
        }
        match inner.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Self::Local { threads: Some(n) }),
            _ => Err(VistuneError::UnsupportedMaster(s.to_string())),
        }
    }
}

impl std::fmt::Display for Master {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { threads: Some(1) } => write!(f, "local"),
            Self::Local { threads: Some(n) } => write!(f, "local[{}]", n),
            Self::Local { threads: None } => write!(f, "local[*]"),
        }
    }
}

/// A compute context owned by one job. Dropping it stops the workers.
pub struct ComputeContext {
    master: Master,
    pool: rayon::ThreadPool,
    alive: Arc<()>,
}

/// Observes whether the context it came from is still running.
#[derive(Clone, Debug)]
pub struct ContextHandle(Weak<()>);

impl ContextHandle {
    pub fn is_active(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl ComputeContext {
    pub fn acquire(master: Master) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("vistune-{}", i));
        if let Master::Local { threads: Some(n) } = master {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| VistuneError::Context(e.to_string()))?;
        info!(
            master = %master,
            cores = pool.current_num_threads(),
            "Started compute context"
        );
        Ok(Self {
            master,
            pool,
            alive: Arc::new(()),
        })
    }

    pub fn master(&self) -> Master {
        self.master
    }

    /// Number of workers available to the job.
    pub fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` with this context's workers serving every nested rayon call.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    pub fn handle(&self) -> ContextHandle {
        ContextHandle(Arc::downgrade(&self.alive))
    }
}

impl Drop for ComputeContext {
    fn drop(&mut self) {
        info!(master = %self.master, "Stopped compute context");
    }
}

/// Acquire a context for the duration of `job`; it is released on every exit path.
pub fn with_context<T, F>(master: Master, job: F) -> Result<T>
where
    F: FnOnce(&ComputeContext) -> Result<T>,
{
    let ctx = ComputeContext::acquire(master)?;
    job(&ctx)
}
