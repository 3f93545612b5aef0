//! Pending-operation lifecycle.
//!
//! Maps handles to unresolved asynchronous values so that completion can
//! arrive from a different call site — typically a callback from the native
//! side of an embedding boundary — than the one that created the value.
//!
//! Flow:
//! 1. The managed side calls [`CompletionRegistry::register`] and receives a
//!    handle, which it hands across the boundary as a plain integer.
//! 2. The managed side calls [`CompletionRegistry::take`] to obtain the
//!    future and compose continuations onto it.
//! 3. When the native work finishes, the native side calls
//!    [`CompletionRegistry::complete`] with the same handle; the future
//!    resolves and the registry forgets the handle.
//!
//! Steps 2 and 3 may happen in either order: a native operation may finish
//! before the managed side has retrieved the future, or after. The registry
//! drops its bookkeeping for a handle once the operation is both resolved
//! and retrieved, so its steady-state size tracks in-flight operations.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::CompletionError;
use crate::handle::{Handle, HandleAllocator};

/// The single-assignment asynchronous value behind one handle.
///
/// Cloning is cheap and every clone observes the same resolution: all
/// continuations attached to any clone fire exactly once, with the same
/// result, when [`CompletionRegistry::complete`] runs for the handle. The
/// future resolves through the async runtime's normal wake path; nothing
/// polls in a loop waiting for the native side. The value stays observable
/// after the registry has dropped its own bookkeeping, so cleanup never
/// interferes with delivering the result.
pub struct OperationFuture<T, E> {
    inner: Shared<BoxFuture<'static, Result<T, CompletionError<E>>>>,
}

impl<T, E> Clone for OperationFuture<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> OperationFuture<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn new(rx: oneshot::Receiver<Result<T, E>>) -> Self {
        let inner = async move {
            match rx.await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(failure)) => Err(CompletionError::Native(failure)),
                // The sender is dropped without a send only when the slot is
                // abandoned or swept.
                Err(_) => Err(CompletionError::Abandoned),
            }
        }
        .boxed()
        .shared();
        Self { inner }
    }
}

impl<T, E> Future for OperationFuture<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Result<T, CompletionError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

/// One tracked operation: the resolver half and the shared value half.
///
/// `tx` is consumed by the first completion; `taken` records whether the
/// managed side has retrieved the value. The slot is removed once both have
/// happened, whichever came second. Both flags are only touched under the
/// slot's shard lock.
struct Slot<T, E> {
    tx: Option<oneshot::Sender<Result<T, E>>>,
    value: OperationFuture<T, E>,
    taken: bool,
    registered_at: Instant,
}

/// Counters over the registry's lifetime.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Operations registered.
    pub registered: AtomicU64,
    /// Operations completed with a success payload.
    pub completed: AtomicU64,
    /// Operations completed with a failure payload.
    pub failed: AtomicU64,
    /// Operations abandoned or swept before completion.
    pub abandoned: AtomicU64,
    /// Completion attempts for handles not present at all.
    pub unknown_completions: AtomicU64,
    /// Completion attempts for handles that had already resolved.
    pub duplicate_completions: AtomicU64,
}

/// Registry of pending operations, keyed by [`Handle`].
///
/// All operations are non-blocking and safe under arbitrary concurrent calls
/// from both sides of the boundary, including `complete` racing ahead of
/// `take`. The backing map is sharded, so unrelated handles do not contend
/// on a single lock.
///
/// # Lifecycle per handle
///
/// `Unregistered → Registered(unresolved) → Registered(resolved) →
/// Unregistered`. The final transition is automatic: the slot is dropped as
/// soon as the operation has been both resolved ([`complete`]) and retrieved
/// ([`take`]), in whichever order those happened. There is no path back to
/// `Registered` for the same handle, and no release call for the caller to
/// make.
///
/// # Retention
///
/// Two cases can hold a slot indefinitely: a native side that never reports,
/// and a resolved operation whose managed side never retrieves it. The
/// registry applies no timeout of its own; embedders that need a bound can
/// call [`abandon`] when a caller gives up, or run [`sweep_task`].
///
/// [`complete`]: CompletionRegistry::complete
/// [`take`]: CompletionRegistry::take
/// [`abandon`]: CompletionRegistry::abandon
pub struct CompletionRegistry<T, E> {
    slots: DashMap<Handle, Slot<T, E>>,
    allocator: HandleAllocator,
    stats: RegistryStats,
}

impl<T, E> Default for CompletionRegistry<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> CompletionRegistry<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            allocator: HandleAllocator::new(),
            stats: RegistryStats::default(),
        }
    }

    /// Create an unresolved pending operation and return its handle.
    ///
    /// Each call produces a distinct handle and a distinct operation; the
    /// registry holds the only owning reference to the value until [`take`]
    /// is called.
    ///
    /// [`take`]: CompletionRegistry::take
    pub fn register(&self) -> Handle {
        let handle = self.allocator.next();
        let (tx, rx) = oneshot::channel();
        let slot = Slot {
            tx: Some(tx),
            value: OperationFuture::new(rx),
            taken: false,
            registered_at: Instant::now(),
        };
        self.slots.insert(handle, slot);
        self.stats.registered.fetch_add(1, Ordering::Relaxed);
        debug!(handle = %handle, "registered pending operation");
        handle
    }

    /// The asynchronous value associated with `handle`.
    ///
    /// Returns the same underlying value on every call while the operation
    /// is pending, so continuations attached to two takes of the same handle
    /// fire both, once each, with the same result. If the native side has
    /// already completed the operation, the returned future is resolved and
    /// the registry drops the slot. Returns `None` for a handle that was
    /// never registered or whose slot is already gone; callers must treat
    /// that as "no such operation", not retry.
    pub fn take(&self, handle: Handle) -> Option<OperationFuture<T, E>> {
        let Some(mut slot) = self.slots.get_mut(&handle) else {
            debug!(handle = %handle, "take for unknown or already consumed handle");
            return None;
        };

        slot.taken = true;
        let resolved = slot.tx.is_none();
        let value = slot.value.clone();
        drop(slot);

        // Resolved and now retrieved: the registry's part is over. The clone
        // made above keeps the value observable.
        if resolved {
            self.slots.remove(&handle);
        }
        Some(value)
    }

    /// Resolve the operation behind `handle` with a success or failure
    /// payload, exactly once.
    ///
    /// Resolution is visible to every continuation attached to the taken
    /// future, in whichever order `take` and `complete` ran. Returns `false`
    /// when there is nothing to resolve — the handle was never registered,
    /// its slot is gone, or the operation already resolved. The native
    /// caller cannot distinguish these, so all are treated as a benign race:
    /// logged, counted, never raised, and the first result is never
    /// overwritten.
    pub fn complete(&self, handle: Handle, result: Result<T, E>) -> bool {
        let Some(mut slot) = self.slots.get_mut(&handle) else {
            self.stats.unknown_completions.fetch_add(1, Ordering::Relaxed);
            warn!(handle = %handle, "completion for unknown handle");
            return false;
        };

        // Taking the sender under the shard lock decides the exactly-once
        // winner; a duplicate completion finds it gone.
        let Some(tx) = slot.tx.take() else {
            drop(slot);
            self.stats
                .duplicate_completions
                .fetch_add(1, Ordering::Relaxed);
            warn!(handle = %handle, "duplicate completion for resolved handle");
            return false;
        };

        let counter = if result.is_ok() {
            &self.stats.completed
        } else {
            &self.stats.failed
        };
        let taken = slot.taken;
        drop(slot);

        // The slot still holds a clone of the shared future, so the receiver
        // is alive and this send cannot fail.
        let _ = tx.send(result);
        counter.fetch_add(1, Ordering::Relaxed);

        if taken {
            self.slots.remove(&handle);
        }
        debug!(handle = %handle, "completed pending operation");
        true
    }

    /// Drop the slot for `handle` without a native result.
    ///
    /// Any taken future resolves to [`CompletionError::Abandoned`]. Returns
    /// `false` if the handle was not present.
    pub fn abandon(&self, handle: Handle) -> bool {
        if self.slots.remove(&handle).is_some() {
            self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
            debug!(handle = %handle, "abandoned pending operation");
            true
        } else {
            false
        }
    }

    /// Remove every operation registered longer ago than `max_age`. Holders
    /// of a swept unresolved operation observe
    /// [`CompletionError::Abandoned`].
    ///
    /// Returns the number of operations removed. Nothing calls this on its
    /// own; see [`sweep_task`] for a background policy.
    pub fn sweep_expired(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.slots.retain(|handle, slot| {
            let age = now.duration_since(slot.registered_at);
            if age > max_age {
                warn!(
                    handle = %handle,
                    age_ms = age.as_millis() as u64,
                    "sweeping expired pending operation"
                );
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.stats
                .abandoned
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Number of operations the registry still tracks: unresolved, or
    /// resolved but not yet retrieved.
    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn is_registered(&self, handle: Handle) -> bool {
        self.slots.contains_key(&handle)
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}

/// Background task that periodically sweeps expired operations.
///
/// Opt-in: the registry's default contract is unbounded retention of
/// operations whose native side never reports.
pub async fn sweep_task<T, E>(
    registry: Arc<CompletionRegistry<T, E>>,
    max_age: Duration,
    interval: Duration,
) where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let removed = registry.sweep_expired(max_age);
        if removed > 0 {
            debug!(removed, "swept expired pending operations");
        }
    }
}
