//! Error type for `almoner-store-sqlite`, and its translation into the
//! domain taxonomy.

use rusqlite::{ErrorCode, ffi};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain outcome decided inside a database call, e.g. `Negative`.
  #[error("{0}")]
  Domain(#[from] almoner_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("connection pool is closed")]
  PoolClosed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for almoner_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Domain(e) => e,
      Error::Sqlite(ref e) if is_interrupt(e) => Self::Cancelled(e.to_string()),
      Error::Database(tokio_rusqlite::Error::Rusqlite(ref e))
        if is_interrupt(e) =>
      {
        Self::Cancelled(e.to_string())
      }
      other => Self::fatal(other),
    }
  }
}

/// SQLite aborted a statement because the connection was interrupted.
pub(crate) fn is_interrupt(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted
  )
}

/// Another connection holds the write lock.
pub(crate) fn is_busy(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::DatabaseBusy
  )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
  )
}

/// Translate a foreign-key violation on `family_id` into `NotFound`; any
/// other driver error stays fatal.
pub(crate) fn family_reference(family_id: i64) -> impl FnOnce(rusqlite::Error) -> Error {
  move |err| {
    if is_foreign_key_violation(&err) {
      almoner_core::Error::not_found(almoner_core::family::ENTITY, family_id).into()
    } else {
      err.into()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn failure(code: i32) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
  }

  #[test]
  fn interrupt_is_reported_as_cancelled() {
    let err: almoner_core::Error = Error::Sqlite(failure(ffi::SQLITE_INTERRUPT)).into();
    assert!(matches!(err, almoner_core::Error::Cancelled(_)));
  }

  #[test]
  fn foreign_key_violation_on_family_is_not_found() {
    let err = family_reference(4)(failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY));
    let err: almoner_core::Error = err.into();
    assert!(matches!(err, almoner_core::Error::NotFound(ref m) if m == "family 4 not found"));
  }

  #[test]
  fn other_constraint_violations_are_fatal() {
    let err = family_reference(4)(failure(ffi::SQLITE_CONSTRAINT_CHECK));
    let err: almoner_core::Error = err.into();
    assert!(matches!(err, almoner_core::Error::Fatal(_)));
  }

  #[test]
  fn domain_errors_pass_through() {
    let err: almoner_core::Error =
      Error::Domain(almoner_core::Error::negative(1, 5.0)).into();
    assert!(matches!(err, almoner_core::Error::Negative(_)));
  }
}
