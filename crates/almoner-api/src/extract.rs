//! Request extractors: the request context, integer path ids and validated
//! JSON bodies. Every rejection becomes a `Validation` error so clients see
//! the same `{code, message}` body as for domain failures.

use std::ops::Deref;

use almoner_core::{RequestContext, repository::Repositories};
use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, OriginalUri, Path, Request},
  http::request::Parts,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::DropGuard;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{AppState, error::ApiError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ─── Request context ─────────────────────────────────────────────────────────

/// The [`RequestContext`] of the current request.
///
/// Dropping the extractor cancels the context, so a handler future dropped on
/// client disconnect interrupts whatever database work it started.
pub struct Ctx {
  ctx:    RequestContext,
  _guard: DropGuard,
}

impl Deref for Ctx {
  type Target = RequestContext;

  fn deref(&self) -> &RequestContext { &self.ctx }
}

impl<R: Repositories> FromRequestParts<AppState<R>> for Ctx {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<R>,
  ) -> Result<Self, Self::Rejection> {
    let span_id = parts
      .headers
      .get(REQUEST_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| Uuid::parse_str(v).ok())
      .unwrap_or_else(Uuid::new_v4);

    // Nested routers see the path with their mount prefix stripped.
    let path = match parts.extensions.get::<OriginalUri>() {
      Some(OriginalUri(uri)) => uri.path(),
      None => parts.uri.path(),
    };

    let mut ctx = RequestContext::new(path).with_span_id(span_id);
    if let Some(timeout) = state.request_timeout {
      ctx = ctx.with_timeout(timeout);
    }
    let _guard = ctx.token().clone().drop_guard();
    Ok(Self { ctx, _guard })
  }
}

// ─── Path id ─────────────────────────────────────────────────────────────────

/// The `{id}` path segment, parsed as an integer.
pub struct Id(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Id {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<i64>::from_request_parts(parts, state)
      .await
      .map_err(|e| ApiError::validation(format!("invalid id: {}", e.body_text())))?;
    Ok(Self(id))
  }
}

// ─── Validated body ──────────────────────────────────────────────────────────

/// A JSON body that deserialized and passed its field validation.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
  S: Send + Sync,
  T: DeserializeOwned + Validate + Send,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|e| ApiError::validation(e.body_text()))?;
    value.validate().map_err(|e| ApiError::validation(describe(&e)))?;
    Ok(Self(value))
  }
}

/// One line per failed rule, ordered by field name.
pub fn describe(errors: &ValidationErrors) -> String {
  let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
  fields.sort_by(|a, b| a.0.cmp(&b.0));

  fields
    .into_iter()
    .flat_map(|(field, errors)| {
      errors.iter().map(move |e| match &e.message {
        Some(message) => message.to_string(),
        None => format!("{field} is invalid"),
      })
    })
    .collect::<Vec<_>>()
    .join("; ")
}

/// Ids in bodies reference rows, which start at 1.
pub fn require_id(field: &str, value: i64) -> Result<i64, ApiError> {
  if value > 0 {
    Ok(value)
  } else {
    Err(ApiError::validation(format!("{field} must be greater than zero")))
  }
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  use super::*;

  #[derive(Debug, Deserialize, Validate)]
  struct Body {
    #[validate(length(min = 1, message = "name is required"))]
    name:   String,
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    amount: f64,
  }

  #[test]
  fn failures_are_listed_by_field() {
    let body = Body { name: String::new(), amount: -1.0 };
    let errors = body.validate().unwrap_err();
    assert_eq!(describe(&errors), "amount must not be negative; name is required");
  }

  #[test]
  fn body_ids_must_be_positive() {
    assert_eq!(require_id("family_id", 3).unwrap(), 3);
    let err = require_id("family_id", 0).unwrap_err();
    assert_eq!(err.to_string(), "family_id must be greater than zero");
  }
}
