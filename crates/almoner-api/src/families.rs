//! Handlers for `/families` endpoints.

use almoner_core::{
  Change,
  family::{Family, FamilyUpdate, NewFamily},
  repository::Repositories,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
  AppState,
  error::ApiError,
  extract::{Ctx, Id, Valid},
};

/// `GET /families`
pub async fn list<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
) -> Result<Json<Vec<Family>>, ApiError> {
  Ok(Json(state.services.families.find_all(&ctx).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBody {
  #[validate(length(min = 1, message = "name is required"))]
  pub name:         String,
  #[validate(length(min = 1, message = "country is required"))]
  pub country:      String,
  #[validate(length(min = 1, message = "state is required"))]
  pub state:        String,
  #[validate(length(min = 1, message = "city is required"))]
  pub city:         String,
  #[validate(length(min = 1, message = "neighborhood is required"))]
  pub neighborhood: String,
  #[validate(length(min = 1, message = "street is required"))]
  pub street:       String,
  #[validate(length(min = 1, message = "number is required"))]
  pub number:       String,
  #[validate(length(min = 1, message = "complement is required"))]
  pub complement:   String,
  #[validate(length(min = 1, message = "zipcode is required"))]
  pub zipcode:      String,
}

impl From<CreateBody> for NewFamily {
  fn from(body: CreateBody) -> Self {
    Self {
      name:         body.name,
      country:      body.country,
      state:        body.state,
      city:         body.city,
      neighborhood: body.neighborhood,
      street:       body.street,
      number:       body.number,
      complement:   body.complement,
      zipcode:      body.zipcode,
    }
  }
}

/// `POST /families`
pub async fn create<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Valid(body): Valid<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let family = state.services.families.create(&ctx, body.into()).await?;
  Ok((StatusCode::CREATED, Json(family)))
}

/// `GET /families/{id}`
pub async fn get_one<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<Json<Family>, ApiError> {
  Ok(Json(state.services.families.find_one_by_id(&ctx, id).await?))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBody {
  pub name:         Option<String>,
  pub country:      Option<String>,
  pub state:        Option<String>,
  pub city:         Option<String>,
  pub neighborhood: Option<String>,
  pub street:       Option<String>,
  pub number:       Option<String>,
  pub complement:   Option<String>,
  pub zipcode:      Option<String>,
}

impl From<UpdateBody> for FamilyUpdate {
  fn from(body: UpdateBody) -> Self {
    Self {
      name:         Change::non_empty(body.name),
      country:      Change::non_empty(body.country),
      state:        Change::non_empty(body.state),
      city:         Change::non_empty(body.city),
      neighborhood: Change::non_empty(body.neighborhood),
      street:       Change::non_empty(body.street),
      number:       Change::non_empty(body.number),
      complement:   Change::non_empty(body.complement),
      zipcode:      Change::non_empty(body.zipcode),
    }
  }
}

/// `PATCH /families/{id}`
pub async fn update<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
  Valid(body): Valid<UpdateBody>,
) -> Result<Json<Family>, ApiError> {
  Ok(Json(state.services.families.update(&ctx, id, body.into()).await?))
}

/// `DELETE /families/{id}`
pub async fn remove<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<StatusCode, ApiError> {
  state.services.families.delete(&ctx, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
