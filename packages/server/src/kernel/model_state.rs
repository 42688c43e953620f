//! Process-wide model selection and the lock that guards switching it.
//!
//! Readers see the current model id without ever touching the switch lock; a
//! read racing a switch may see the old id. Writes require a [`SwitchPermit`],
//! which only [`SwitchLock::try_acquire`] hands out.

use std::sync::Arc;

use tokio::sync::{watch, Mutex, OwnedMutexGuard};

/// Model id sent with every chat completion.
#[derive(Clone)]
pub struct ModelState {
    tx: Arc<watch::Sender<String>>,
}

impl ModelState {
    pub fn new(initial: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(initial.into());
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    pub fn commit(&self, _permit: &SwitchPermit, model: impl Into<String>) {
        self.tx.send_replace(model.into());
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelState")
            .field("current", &*self.tx.borrow())
            .finish()
    }
}

/// Non-blocking mutual exclusion for model switches.
#[derive(Clone, Default)]
pub struct SwitchLock {
    inner: Arc<Mutex<()>>,
}

/// Proof that the holder owns the switch lock. Dropping it releases the lock.
pub struct SwitchPermit {
    _guard: OwnedMutexGuard<()>,
}

impl SwitchLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock if it is free. Never waits.
    pub fn try_acquire(&self) -> Option<SwitchPermit> {
        self.inner
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| SwitchPermit { _guard: guard })
    }

    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let lock = SwitchLock::new();

        let permit = lock.try_acquire().expect("lock should be free");
        assert!(lock.is_held());
        assert!(lock.try_acquire().is_none());

        drop(permit);
        assert!(!lock.is_held());
        assert!(lock.try_acquire().is_some());
    }

    #[test]
    fn test_commit_visible_to_all_clones() {
        let lock = SwitchLock::new();
        let state = ModelState::new("gpt-3.5-turbo");
        let reader = state.clone();

        let permit = lock.try_acquire().unwrap();
        state.commit(&permit, "gams-9b");

        assert_eq!(reader.current(), "gams-9b");
        assert_eq!(state.current(), "gams-9b");
    }
}
