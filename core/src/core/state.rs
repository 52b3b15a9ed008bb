// provision/src/core/state.rs

//! Defines `RunState<T>`, the caller-owned state threaded through every step of a run.

use parking_lot::{MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared handle to the mutable state of one orchestration run.
///
/// Steps communicate with each other and with the caller only through the `T`
/// behind this handle (e.g. accumulating a list of pending downloads). Cloning
/// the handle shares the same state.
///
/// IMPORTANT: Lock guards obtained from this struct are blocking and MUST NOT
/// be held across `.await` suspension points in deferred step actions.
#[derive(Debug)]
pub struct RunState<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> RunState<T> {
  pub fn new(data: T) -> Self {
    RunState(Arc::new(RwLock::new(data)))
  }

  /// Acquires a read lock. The guard MUST be dropped before any `.await` point.
  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  /// Acquires a write lock. The guard MUST be dropped before any `.await` point.
  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Read lock without blocking. `None` while a synchronous step holds the write lock.
  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
    self.0.try_read()
  }

  /// Write lock narrowed to one field, e.g. `state.map_write(|s| &mut s.downloads)`.
  pub fn map_write<F, U: ?Sized>(&self, f: F) -> MappedRwLockWriteGuard<'_, U>
  where
    F: FnOnce(&mut T) -> &mut U,
  {
    RwLockWriteGuard::map(self.write(), f)
  }

  /// Takes the state back once every other handle has been dropped.
  ///
  /// Returns the handle unchanged if it is still shared (e.g. a callback step
  /// leaked a clone into a background thread).
  pub fn into_inner(self) -> Result<T, Self> {
    Arc::try_unwrap(self.0).map(RwLock::into_inner).map_err(RunState)
  }
}

impl<T: Send + Sync + 'static> Clone for RunState<T> {
  fn clone(&self) -> Self {
    RunState(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for RunState<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}

impl<T: Send + Sync + 'static> From<T> for RunState<T> {
  fn from(data: T) -> Self {
    Self::new(data)
  }
}
