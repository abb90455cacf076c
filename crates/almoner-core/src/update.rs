//! Typed partial updates.
//!
//! An update model is a set of [`Change`] fields. The store flattens the
//! `Set` entries into an `UPDATE ... SET` clause; `Keep` fields are left out.

/// One field of a partial update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change<T> {
  Set(T),
  Keep,
}

impl<T> Change<T> {
  pub fn is_set(&self) -> bool { matches!(self, Self::Set(_)) }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Change<U> {
    match self {
      Self::Set(value) => Change::Set(f(value)),
      Self::Keep => Change::Keep,
    }
  }

  pub fn as_ref(&self) -> Change<&T> {
    match self {
      Self::Set(value) => Change::Set(value),
      Self::Keep => Change::Keep,
    }
  }

  pub fn into_option(self) -> Option<T> {
    match self {
      Self::Set(value) => Some(value),
      Self::Keep => None,
    }
  }
}

impl<T> Default for Change<T> {
  fn default() -> Self { Self::Keep }
}

/// A field absent from the payload is kept. A present numeric value is
/// written even when it is zero.
impl<T> From<Option<T>> for Change<T> {
  fn from(value: Option<T>) -> Self {
    match value {
      Some(value) => Self::Set(value),
      None => Self::Keep,
    }
  }
}

impl Change<String> {
  /// Text fields treat the empty string as "no change".
  pub fn non_empty(value: Option<String>) -> Self {
    match value {
      Some(value) if !value.is_empty() => Self::Set(value),
      _ => Self::Keep,
    }
  }
}
