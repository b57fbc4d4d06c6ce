use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;

/// Tokio bridge for the parts of the driver that run off the caller's thread.
///
/// Every engine call blocks, so [`ResultStream`](crate::ResultStream) drives
/// its cursor on the blocking pool and hands rows to an async consumer. It is
/// the only user; the connection pool runs on the caller's runtime. This enum wraps
/// a Tokio runtime, detecting an existing runtime via `Handle::try_current()`
/// or creating a new multi-threaded runtime when needed.
pub enum Runtime {
    Handle(tokio::runtime::Handle),
    TokioRuntime(tokio::runtime::Runtime),
}

impl Runtime {
    /// Creates a new runtime instance.
    ///
    /// Reuses the current Tokio runtime if there is one, otherwise creates a
    /// new multi-threaded runtime with all features enabled.
    pub fn new() -> std::io::Result<Self> {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            Ok(Self::Handle(handle))
        } else {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            Ok(Self::TokioRuntime(rt))
        }
    }

    /// Blocks on a future, bridging async calls to sync context.
    ///
    /// With a borrowed handle this goes through `block_in_place`, which needs
    /// a multi-threaded runtime.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        match self {
            Runtime::Handle(handle) => tokio::task::block_in_place(|| handle.block_on(fut)),
            Runtime::TokioRuntime(runtime) => runtime.block_on(fut),
        }
    }

    /// Runs a blocking closure on the runtime's blocking pool.
    pub fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        match self {
            Runtime::Handle(handle) => handle.spawn_blocking(f),
            Runtime::TokioRuntime(runtime) => runtime.spawn_blocking(f),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runtime::Handle(_) => f.write_str("Runtime::Handle(...)"),
            Runtime::TokioRuntime(_) => f.write_str("Runtime::TokioRuntime(...)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_outside_runtime_owns_one() {
        let rt = Runtime::new().unwrap();
        assert!(matches!(rt, Runtime::TokioRuntime(_)));
        assert_eq!(rt.block_on(async { 40 + 2 }), 42);
    }

    #[test]
    fn test_spawn_blocking_result_is_awaitable() {
        let rt = Runtime::new().unwrap();
        let handle = rt.spawn_blocking(|| "done".to_string());
        assert_eq!(rt.block_on(handle).unwrap(), "done");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_new_inside_runtime_borrows_handle() {
        let rt = Runtime::new().unwrap();
        assert!(matches!(rt, Runtime::Handle(_)));
        assert_eq!(rt.block_on(async { 7 }), 7);
    }
}

// Rust guideline compliant 2026-10-19
