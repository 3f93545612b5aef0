//! # Completion Registry
//!
//! The core of the foreign completion bridge: a process-wide registry that
//! issues unique handles for not-yet-resolved asynchronous values, lets the
//! native side of an embedding boundary complete those values purely by
//! handle, and cleans up its own bookkeeping once a value has been resolved
//! and retrieved.
//!
//! ## Overview
//!
//! A managed-side call that wants to invoke a native operation registers a
//! pending operation and receives a [`Handle`] — an opaque integer that can be
//! returned synchronously across the boundary. The native side performs its
//! work out-of-band and reports back with the same handle and a
//! result-or-error. The managed side, holding the future obtained via
//! [`CompletionRegistry::take`], observes the completion without ever
//! blocking a thread on native work.
//!
//! The registry is payload-agnostic: success and failure payloads are opaque
//! data routed into the future's resolution. Interpreting them is the
//! caller's job.
//!
//! ## Modules
//!
//! - `handle`: unique handle allocation
//! - `registry`: pending-operation lifecycle (register, take, complete)
//! - `error`: the error surface observed through a taken future

pub mod error;
pub mod handle;
pub mod registry;

pub use error::CompletionError;
pub use handle::{Handle, HandleAllocator};
pub use registry::{sweep_task, CompletionRegistry, OperationFuture, RegistryStats};
