//! The error taxonomy shared by every layer.
//!
//! Repositories produce these kinds, services pass them through untouched,
//! and only the transport maps them onto HTTP statuses.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A row is missing or soft-deleted, or an insert referenced one.
  #[error("{0}")]
  NotFound(String),

  /// A partial update carried no field to write.
  #[error("{0}")]
  EmptyModel(String),

  /// A donation would drive a resource's stock below zero.
  #[error("{0}")]
  Negative(String),

  /// The request could not be bound or failed field validation.
  #[error("{0}")]
  Validation(String),

  /// The database interrupted a statement because the request went away.
  #[error("request cancelled: {0}")]
  Cancelled(String),

  #[error("{0}")]
  Fatal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `"<entity> <id> not found"`.
  pub fn not_found(entity: &str, id: i64) -> Self {
    Self::NotFound(format!("{entity} {id} not found"))
  }

  /// `"empty <entity> model"`.
  pub fn empty_model(entity: &str) -> Self {
    Self::EmptyModel(format!("empty {entity} model"))
  }

  /// The stock is rendered with exactly one fractional digit; clients match
  /// on this text.
  pub fn negative(resource_id: i64, current_quantity: f64) -> Self {
    Self::Negative(format!(
      "resource {resource_id} quantity is {current_quantity:.1}"
    ))
  }

  pub fn fatal(
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
  ) -> Self {
    Self::Fatal(source.into())
  }

  /// Expected control-flow outcomes, as opposed to failures worth an
  /// error-level log line.
  pub fn is_expected(&self) -> bool {
    matches!(
      self,
      Self::NotFound(_)
        | Self::EmptyModel(_)
        | Self::Negative(_)
        | Self::Validation(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
