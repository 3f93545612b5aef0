//! # Bridge Runtime
//!
//! Process-wide bootstrap for the foreign completion bridge: a shared tokio
//! runtime on which native operations run, the global completion registry
//! reachable from both sides of the boundary, and the tracing setup that
//! mirrors diagnostics into a host-provided sink.
//!
//! ## Overview
//!
//! An embedding host initializes the bridge exactly once, early:
//!
//! ```ignore
//! use bridge_runtime::{init, BridgeConfig};
//!
//! // 0 worker threads means "use the CPU's cores".
//! let runtime = init(BridgeConfig::default().with_worker_threads(8))?;
//! ```
//!
//! From then on, managed-side code submits native operations and receives a
//! handle synchronously; the actual result arrives later through the future
//! taken for that handle:
//!
//! ```ignore
//! let handle = runtime.submit(async move { perform_native_work().await });
//! let future = runtime.take(handle).expect("operation already resolved");
//! let payload = future.await?;
//! ```
//!
//! Repeated `init` calls are allowed; only the first takes effect and every
//! call returns the same instance. The runtime is never torn down.

pub mod error;
pub mod logging;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use error::{Error, NativeError, Result};

// Re-export the boundary types callers handle directly.
pub use bridge_registry::{CompletionError, Handle, OperationFuture};

use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use bridge_registry::CompletionRegistry;
use tokio::runtime::Runtime;
use tracing::info;

use crate::logging::LoggingConfig;

/// Result of one native operation as it crosses the boundary: an opaque byte
/// payload on success, an opaque code-and-message on failure.
pub type NativeResult = std::result::Result<Vec<u8>, NativeError>;

/// Configuration for [`init`].
#[derive(Clone, Default)]
pub struct BridgeConfig {
    /// Worker threads for the bridge runtime; `0` uses the CPU's cores.
    pub worker_threads: usize,
    /// Name prefix for the runtime's worker threads.
    pub thread_name: Option<String>,
    /// Optional tracing setup performed during `init`. Leave `None` when the
    /// embedder configures tracing itself.
    pub logging: Option<LoggingConfig>,
}

impl BridgeConfig {
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }
}

/// The shared runtime plus the process-wide registry.
///
/// Usually accessed through [`init`]/[`global`], but embedders that manage
/// their own lifecycle (and tests) can construct standalone instances with
/// [`BridgeRuntime::new`].
pub struct BridgeRuntime {
    runtime: Runtime,
    registry: Arc<CompletionRegistry<Vec<u8>, NativeError>>,
}

static INIT_LOCK: Mutex<()> = Mutex::new(());
static GLOBAL: OnceLock<BridgeRuntime> = OnceLock::new();

/// Initialize the process-wide bridge.
///
/// Safe to call multiple times; only the first call takes effect and later
/// calls return the existing instance, ignoring their configuration. The
/// instance lives for the rest of the process.
pub fn init(config: BridgeConfig) -> Result<&'static BridgeRuntime> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(runtime) = GLOBAL.get() {
        return Ok(runtime);
    }
    let runtime = BridgeRuntime::new(config)?;
    Ok(GLOBAL.get_or_init(|| runtime))
}

/// The process-wide bridge, if [`init`] has run.
pub fn global() -> Result<&'static BridgeRuntime> {
    GLOBAL.get().ok_or(Error::NotInitialized)
}

impl BridgeRuntime {
    /// Build a standalone bridge runtime from `config`.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        if let Some(logging) = config.logging.clone() {
            logging::init_logging(logging)?;
        }

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all();
        builder.thread_name(config.thread_name.as_deref().unwrap_or("bridge-worker"));
        if config.worker_threads > 0 {
            builder.worker_threads(config.worker_threads);
        }
        let runtime = builder.build()?;

        info!(
            worker_threads = config.worker_threads,
            "bridge runtime initialized"
        );

        Ok(Self {
            runtime,
            registry: Arc::new(CompletionRegistry::new()),
        })
    }

    /// Register a pending operation, run `operation` on the bridge runtime,
    /// and return the operation's handle synchronously.
    ///
    /// The handle can cross the boundary immediately; the registry entry
    /// resolves whenever `operation` finishes. This is the "fire id now,
    /// resolve later" path a boundary call uses to hand an awaitable back to
    /// the managed caller without blocking anyone.
    pub fn submit<F>(&self, operation: F) -> Handle
    where
        F: Future<Output = NativeResult> + Send + 'static,
    {
        let handle = self.registry.register();
        let registry = Arc::clone(&self.registry);
        self.runtime.spawn(async move {
            let result = operation.await;
            registry.complete(handle, result);
        });
        handle
    }

    /// The future for a submitted (or externally registered) operation.
    ///
    /// Resolved-but-unretrieved operations are still here; `None` means the
    /// handle is unknown or its result was already retrieved.
    pub fn take(&self, handle: Handle) -> Option<OperationFuture<Vec<u8>, NativeError>> {
        self.registry.take(handle)
    }

    /// The process-wide completion registry.
    pub fn registry(&self) -> &CompletionRegistry<Vec<u8>, NativeError> {
        &self.registry
    }

    /// Handle to the underlying runtime, for spawning auxiliary work such as
    /// [`bridge_registry::sweep_task`].
    pub fn runtime_handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// Run a future to completion on the bridge runtime from synchronous
    /// managed-side code.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
