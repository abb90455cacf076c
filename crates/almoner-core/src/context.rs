//! Request-scoped values passed explicitly from transport to repository.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{Error, Result};

/// Identity, cancellation and deadline of one inbound request.
///
/// Cloning is cheap and every clone observes the same cancellation.
#[derive(Debug, Clone)]
pub struct RequestContext {
  span_id:  Uuid,
  path:     String,
  deadline: Option<Instant>,
  token:    CancellationToken,
}

impl RequestContext {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      span_id:  Uuid::new_v4(),
      path:     path.into(),
      deadline: None,
      token:    CancellationToken::new(),
    }
  }

  pub fn with_span_id(mut self, span_id: Uuid) -> Self {
    self.span_id = span_id;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.deadline = Some(Instant::now() + timeout);
    self
  }

  pub fn span_id(&self) -> Uuid { self.span_id }

  pub fn path(&self) -> &str { &self.path }

  pub fn deadline(&self) -> Option<Instant> { self.deadline }

  pub fn token(&self) -> &CancellationToken { &self.token }

  pub fn cancel(&self) { self.token.cancel() }

  pub fn is_done(&self) -> bool {
    self.token.is_cancelled()
      || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
  }

  /// Fails once the request has been cancelled or has outlived its deadline.
  ///
  /// The application noticed the cancellation itself, so this is a fatal
  /// error rather than [`Error::Cancelled`].
  pub fn check(&self) -> Result<()> {
    if self.token.is_cancelled() {
      return Err(Error::fatal(format!("request {} was cancelled", self.span_id)));
    }
    if self.is_done() {
      return Err(Error::fatal(format!(
        "request {} exceeded its deadline",
        self.span_id
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fresh_context_is_live() {
    let ctx = RequestContext::new("/api/v1/resources");
    assert!(!ctx.is_done());
    assert!(ctx.check().is_ok());
    assert_eq!(ctx.path(), "/api/v1/resources");
  }

  #[test]
  fn cancellation_is_shared_between_clones() {
    let ctx = RequestContext::new("/");
    let clone = ctx.clone();
    ctx.cancel();
    assert!(clone.is_done());
    assert!(matches!(clone.check(), Err(Error::Fatal(_))));
  }

  #[test]
  fn elapsed_deadline_is_done() {
    let ctx = RequestContext::new("/").with_timeout(Duration::ZERO);
    assert!(ctx.is_done());
    assert!(matches!(ctx.check(), Err(Error::Fatal(_))));
  }
}
