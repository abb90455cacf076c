//! API error type and [`axum::response::IntoResponse`] implementation.

use almoner_core::Error;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;

/// An error returned by an API handler. Wraps the domain error unchanged;
/// this is the only place its kinds meet HTTP statuses.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
  pub fn validation(message: impl Into<String>) -> Self {
    Self(Error::Validation(message.into()))
  }

  pub fn status(&self) -> StatusCode {
    match &self.0 {
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::EmptyModel(_) | Error::Negative(_) | Error::Validation(_) => {
        StatusCode::BAD_REQUEST
      }
      Error::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
      Error::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = json!({ "code": status.as_u16(), "message": self.0.to_string() });
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_error_kind() {
    let cases = [
      (Error::not_found("family", 1), StatusCode::NOT_FOUND),
      (Error::empty_model("resource"), StatusCode::BAD_REQUEST),
      (Error::negative(1, 5.0), StatusCode::BAD_REQUEST),
      (Error::Validation("invalid id".into()), StatusCode::BAD_REQUEST),
      (Error::Cancelled("interrupted".into()), StatusCode::SERVICE_UNAVAILABLE),
      (Error::fatal("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError(err).status(), status);
    }
  }
}
