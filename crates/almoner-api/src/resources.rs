//! Handlers for `/resources` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/resources` | Live resources only |
//! | `POST`  | `/resources` | 201 with the stored resource |
//! | `GET`   | `/resources/{id}` | 404 if absent or deleted |
//! | `PATCH` | `/resources/{id}` | Descriptive fields only |
//! | `DELETE`| `/resources/{id}` | Soft delete, idempotent |
//! | `PUT`   | `/resources/{id}/quantity` | Overwrites the stock |

use almoner_core::{
  Change,
  repository::Repositories,
  resource::{NewResource, Resource, ResourceUpdate},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
  AppState,
  error::ApiError,
  extract::{Ctx, Id, Valid},
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /resources`
pub async fn list<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
) -> Result<Json<Vec<Resource>>, ApiError> {
  Ok(Json(state.services.resources.find_all(&ctx).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBody {
  #[validate(length(min = 1, message = "name is required"))]
  pub name:        String,
  #[validate(range(min = 0.0, message = "amount must not be negative"))]
  pub amount:      f64,
  #[validate(length(min = 1, message = "measurement is required"))]
  pub measurement: String,
  #[validate(range(min = 0.0, message = "quantity must not be negative"))]
  pub quantity:    f64,
}

/// `POST /resources`
pub async fn create<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Valid(body): Valid<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewResource {
    name:        body.name,
    amount:      body.amount,
    measurement: body.measurement,
    quantity:    body.quantity,
  };
  let resource = state.services.resources.create(&ctx, input).await?;
  Ok((StatusCode::CREATED, Json(resource)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /resources/{id}`
pub async fn get_one<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<Json<Resource>, ApiError> {
  Ok(Json(state.services.resources.find_one_by_id(&ctx, id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Every field is optional. Empty strings leave the column alone; a present
/// `amount` is written even when zero.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBody {
  pub name:        Option<String>,
  #[validate(range(min = 0.0, message = "amount must not be negative"))]
  pub amount:      Option<f64>,
  pub measurement: Option<String>,
}

impl From<UpdateBody> for ResourceUpdate {
  fn from(body: UpdateBody) -> Self {
    Self {
      name:        Change::non_empty(body.name),
      amount:      body.amount.into(),
      measurement: Change::non_empty(body.measurement),
    }
  }
}

/// `PATCH /resources/{id}`
pub async fn update<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
  Valid(body): Valid<UpdateBody>,
) -> Result<Json<Resource>, ApiError> {
  let resource = state.services.resources.update(&ctx, id, body.into()).await?;
  Ok(Json(resource))
}

// ─── Quantity override ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct QuantityBody {
  #[validate(range(min = 0.0, message = "quantity must not be negative"))]
  pub quantity: f64,
}

/// `PUT /resources/{id}/quantity`
pub async fn set_quantity<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
  Valid(body): Valid<QuantityBody>,
) -> Result<Json<Resource>, ApiError> {
  let resource = state
    .services
    .resources
    .set_quantity(&ctx, id, body.quantity)
    .await?;
  Ok(Json(resource))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /resources/{id}`
pub async fn remove<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<StatusCode, ApiError> {
  state.services.resources.delete(&ctx, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
