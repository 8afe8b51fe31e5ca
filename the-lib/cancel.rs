use std::sync::{
  Arc,
  atomic::{
    AtomicBool,
    Ordering,
  },
};

use crate::error::{
  Error,
  Result,
};

/// Cooperative cancellation flag shared between a caller and a long-running
/// scan. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }

  /// `Err(Cancelled)` once [`CancelToken::cancel`] has been called.
  pub fn check(&self) -> Result<()> {
    if self.is_cancelled() {
      Err(Error::Cancelled)
    } else {
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_the_flag() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(token.check().is_ok());

    other.cancel();
    assert!(token.is_cancelled());
    assert!(matches!(token.check(), Err(Error::Cancelled)));
  }
}
