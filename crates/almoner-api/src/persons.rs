//! Handlers for `/persons` endpoints. A person must belong to a live family;
//! referencing any other family id is a 404.

use almoner_core::{
  Change,
  person::{NewPerson, Person, PersonUpdate},
  repository::Repositories,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
  AppState,
  error::ApiError,
  extract::{Ctx, Id, Valid, require_id},
};

/// `GET /persons`
pub async fn list<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
) -> Result<Json<Vec<Person>>, ApiError> {
  Ok(Json(state.services.persons.find_all(&ctx).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBody {
  pub family_id: i64,
  #[validate(length(min = 1, message = "name is required"))]
  pub name:      String,
}

/// `POST /persons`
pub async fn create<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Valid(body): Valid<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewPerson {
    family_id: require_id("family_id", body.family_id)?,
    name:      body.name,
  };
  let person = state.services.persons.create(&ctx, input).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /persons/{id}`
pub async fn get_one<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<Json<Person>, ApiError> {
  Ok(Json(state.services.persons.find_one_by_id(&ctx, id).await?))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBody {
  pub family_id: Option<i64>,
  pub name:      Option<String>,
}

impl UpdateBody {
  fn into_update(self) -> Result<PersonUpdate, ApiError> {
    let family_id = match self.family_id {
      Some(id) => Change::Set(require_id("family_id", id)?),
      None => Change::Keep,
    };
    Ok(PersonUpdate { family_id, name: Change::non_empty(self.name) })
  }
}

/// `PATCH /persons/{id}`
pub async fn update<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
  Valid(body): Valid<UpdateBody>,
) -> Result<Json<Person>, ApiError> {
  let update = body.into_update()?;
  Ok(Json(state.services.persons.update(&ctx, id, update).await?))
}

/// `DELETE /persons/{id}`
pub async fn remove<R: Repositories>(
  State(state): State<AppState<R>>,
  ctx: Ctx,
  Id(id): Id,
) -> Result<StatusCode, ApiError> {
  state.services.persons.delete(&ctx, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
