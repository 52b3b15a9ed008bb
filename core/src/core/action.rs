// provision/src/core/action.rs

//! Defines `Action<T>`, the executable body of a step, and `Completion`, the
//! explicit signal used by callback-style actions.
//!
//! How an action finishes is decided when it is constructed, never by
//! inspecting the closure:
//!  - `Action::sync` runs to completion while holding the state's write lock.
//!  - `Action::deferred` returns a future; the run awaits it.
//!  - `Action::callback` receives a `Completion` and the run suspends until it fires.

use crate::core::state::RunState;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::oneshot;

pub type StepFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

pub type SyncFn<T> = Arc<dyn Fn(&mut T) -> anyhow::Result<()> + Send + Sync>;
pub type DeferredFn<T> = Arc<dyn Fn(RunState<T>) -> StepFuture + Send + Sync>;
pub type CallbackFn<T> = Arc<dyn Fn(RunState<T>, Completion) + Send + Sync>;

pub enum Action<T: Send + Sync + 'static> {
  Sync(SyncFn<T>),
  Deferred(DeferredFn<T>),
  Callback(CallbackFn<T>),
}

impl<T: Send + Sync + 'static> Action<T> {
  /// An action that reads/writes the state synchronously.
  pub fn sync<E>(f: impl Fn(&mut T) -> Result<(), E> + Send + Sync + 'static) -> Self
  where
    E: Into<anyhow::Error>,
  {
    Action::Sync(Arc::new(move |state: &mut T| -> anyhow::Result<()> { f(state).map_err(Into::into) }))
  }

  /// An action returning a future that settles when the step is done.
  pub fn deferred<F, E>(f: impl Fn(RunState<T>) -> F + Send + Sync + 'static) -> Self
  where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
  {
    Action::Deferred(Arc::new(move |state: RunState<T>| -> StepFuture {
      let user_fut = f(state);
      Box::pin(async move { user_fut.await.map_err(|err| -> anyhow::Error { err.into() }) })
    }))
  }

  /// An action that signals its own completion through the given `Completion`.
  pub fn callback(f: impl Fn(RunState<T>, Completion) + Send + Sync + 'static) -> Self {
    Action::Callback(Arc::new(f))
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Action::Sync(_) => "sync",
      Action::Deferred(_) => "deferred",
      Action::Callback(_) => "callback",
    }
  }
}

impl<T: Send + Sync + 'static> Clone for Action<T> {
  fn clone(&self) -> Self {
    match self {
      Action::Sync(f) => Action::Sync(Arc::clone(f)),
      Action::Deferred(f) => Action::Deferred(Arc::clone(f)),
      Action::Callback(f) => Action::Callback(Arc::clone(f)),
    }
  }
}

impl<T: Send + Sync + 'static> fmt::Debug for Action<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Action::{}", self.kind())
  }
}

/// One-shot completion signal handed to callback actions.
///
/// Dropping it without calling `done`/`fail` fails the step.
#[derive(Debug)]
pub struct Completion {
  tx: oneshot::Sender<anyhow::Result<()>>,
}

impl Completion {
  pub(crate) fn channel() -> (Self, oneshot::Receiver<anyhow::Result<()>>) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx }, rx)
  }

  pub fn done(self) {
    self.finish(Ok(()));
  }

  pub fn fail(self, err: impl Into<anyhow::Error>) {
    self.finish(Err(err.into()));
  }

  pub fn finish(self, result: anyhow::Result<()>) {
    // The receiver is gone only if the run itself was dropped; nothing to report to.
    let _ = self.tx.send(result);
  }
}
