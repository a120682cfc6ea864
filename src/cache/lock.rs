//! Lock Mode Module
//!
//! Chooses at the type level how a `CacheMap` shares and guards its state.
//! `Concurrent` puts the state behind an `Arc<RwLock<_>>`; `Local` puts it
//! behind an `Rc<RefCell<_>>` and takes no lock at all. A `Local` map is not
//! `Send`, so the compiler rejects any attempt to use it from two threads.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::RwLock;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Concurrent {}
    impl Sealed for super::Local {}
}

// == Lock Mode Trait ==
/// Shared-handle and access discipline for map state.
pub trait LockMode: sealed::Sealed + 'static {
    /// Whether shared/exclusive access is enforced.
    const CONCURRENT: bool;

    /// Handle type; clones point at the same state.
    #[doc(hidden)]
    type Handle<T>: Clone;

    #[doc(hidden)]
    fn wrap<T>(state: T) -> Self::Handle<T>;

    /// Runs `f` with shared access to the state.
    #[doc(hidden)]
    fn read<T, R, F>(handle: &Self::Handle<T>, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Runs `f` with exclusive access to the state.
    #[doc(hidden)]
    fn write<T, R, F>(handle: &Self::Handle<T>, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

// == Concurrent ==
/// Reader/writer locking: many readers or one writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concurrent;

impl LockMode for Concurrent {
    const CONCURRENT: bool = true;

    type Handle<T> = Arc<RwLock<T>>;

    fn wrap<T>(state: T) -> Self::Handle<T> {
        Arc::new(RwLock::new(state))
    }

    fn read<T, R, F>(handle: &Self::Handle<T>, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&*handle.read())
    }

    fn write<T, R, F>(handle: &Self::Handle<T>, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut *handle.write())
    }
}

// == Local ==
/// Single-threaded access with no locking.
#[derive(Debug, Clone, Copy, Default)]
pub struct Local;

impl LockMode for Local {
    const CONCURRENT: bool = false;

    type Handle<T> = Rc<RefCell<T>>;

    fn wrap<T>(state: T) -> Self::Handle<T> {
        Rc::new(RefCell::new(state))
    }

    fn read<T, R, F>(handle: &Self::Handle<T>, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&*handle.borrow())
    }

    fn write<T, R, F>(handle: &Self::Handle<T>, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut *handle.borrow_mut())
    }
}
