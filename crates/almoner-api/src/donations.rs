//! Handlers for the donation workflow.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/resources/{id}/donate` | Body: `{"family_id":1,"quantity":2.0}`, 204 |
//! | `DELETE` | `/resources/{id}/return` | Returns every outstanding donation, 204 |
//! | `GET`    | `/resources/{id}/donations` | Outstanding ledger entries |

use almoner_core::{
  donation::{Donation, NewDonation},
  repository::Repositories,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use validator::Validate;

use crate::{
  AppState,
  error::ApiError,
  extract::{Ctx, Id, Valid, require_id},
};

#[derive(Debug, Deserialize, Validate)]
pub struct DonateBody {
  pub family_id: i64,
  pub quantity:  f64,
}

impl DonateBody {
  fn into_donation(self, resource_id: i64) -> Result<NewDonation, ApiError> {
    if self.quantity <= 0.0 {
      return Err(ApiError::validation("quantity must be greater than zero"));
    }
    Ok(NewDonation {
      resource_id,
      family_id: require_id("family_id", self.family_id)?,
      quantity: self.quantity,
    })
  }
}

/// `POST /resources/{id}/donate`
pub async fn donate<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
  Valid(body): Valid<DonateBody>,
) -> Result<StatusCode, ApiError> {
  let input = body.into_donation(id)?;
  state.services.donations.donate(&ctx, input).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /resources/{id}/return`
pub async fn return_all<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<StatusCode, ApiError> {
  state.services.donations.return_donations(&ctx, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /resources/{id}/donations`
pub async fn list<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<Json<Vec<Donation>>, ApiError> {
  Ok(Json(state.services.donations.find_by_resource(&ctx, id).await?))
}
