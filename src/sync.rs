//! Synchronization primitives used by the gate.
//!
//! Re-exports `std::sync` normally and `loom::sync` with the `check-loom` feature, so the same
//! gate can be model checked.

#[cfg(not(feature = "check-loom"))]
pub use std::sync::{Arc, Condvar, Mutex, MutexGuard};

#[cfg(feature = "check-loom")]
pub use loom::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Runs `f` with `loom::model` if compiled with the `check-loom` feature.
pub fn model<F: Fn() + Sync + Send + 'static>(f: F) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "check-loom")] {
            loom::model(f)
        } else {
            f()
        }
    }
}

/// Spawns a thread on the model's scheduler under `check-loom`, on the OS otherwise.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    cfg_if::cfg_if! {
        if #[cfg(feature = "check-loom")] {
            loom::thread::spawn(f)
        } else {
            std::thread::spawn(f)
        }
    }
}

#[cfg(not(feature = "check-loom"))]
pub use std::thread::JoinHandle;

#[cfg(feature = "check-loom")]
pub use loom::thread::JoinHandle;
