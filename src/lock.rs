//! Single-flight operation lock
//!
//! Wallet operations trigger signature prompts, and prompts must never
//! stack. The lock therefore rejects overlapping calls immediately instead
//! of queuing them: the caller gets [`SdkError::OperationBusy`] and decides
//! when to retry.
//!
//! The membership check and insertion happen under one `std::sync::Mutex`
//! acquisition with no await point in between, so the test-and-set stays
//! atomic on preemptive runtimes too.

use crate::events::{EventBus, SdkEvent};
use crate::{Result, SdkError};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

/// Guard ensuring at most one wallet-affecting operation runs at a time.
#[derive(Debug)]
pub struct OperationLock {
    active: Mutex<Option<String>>,
    events: EventBus,
}

impl OperationLock {
    pub fn new(events: EventBus) -> Self {
        Self {
            active: Mutex::new(None),
            events,
        }
    }

    /// Name of the operation currently holding the lock, if any.
    pub fn active(&self) -> Option<String> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `op` under the lock.
    ///
    /// If no operation is active: marks `name` active, emits
    /// [`SdkEvent::OperationLocked`], awaits `op`, then releases and emits
    /// [`SdkEvent::OperationUnlocked`] on every exit path — the release is
    /// tied to a drop guard, so an early return or panic inside `op` cannot
    /// leave the lock held. The operation's result passes through unchanged.
    ///
    /// If an operation is already active, `op` is never polled and the call
    /// fails with [`SdkError::OperationBusy`].
    pub async fn run<T, F>(&self, name: &str, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(current) = active.as_deref() {
                tracing::debug!(
                    operation = name,
                    active = current,
                    "operation rejected, lock busy"
                );
                return Err(SdkError::OperationBusy {
                    active: current.to_string(),
                });
            }
            *active = Some(name.to_string());
        }

        tracing::debug!(operation = name, "operation lock acquired");
        self.events.publish(SdkEvent::OperationLocked {
            name: name.to_string(),
        });

        let _release = ReleaseGuard { lock: self, name };
        op.await
    }
}

struct ReleaseGuard<'a> {
    lock: &'a OperationLock,
    name: &'a str,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        *self
            .lock
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!(operation = self.name, "operation lock released");
        self.lock.events.publish(SdkEvent::OperationUnlocked {
            name: self.name.to_string(),
        });
    }
}
