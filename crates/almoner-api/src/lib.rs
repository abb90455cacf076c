//! JSON REST API for Almoner.
//!
//! Exposes an axum [`Router`] backed by any [`Repositories`] implementation.
//! Logging layers, TLS and the listener are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", almoner_api::api_router(&store, Some(timeout)))
//! ```

pub mod donations;
pub mod error;
pub mod extract;
pub mod families;
pub mod persons;
pub mod resources;

use std::{sync::Arc, time::Duration};

use almoner_core::{repository::Repositories, service::Services};
use axum::{
  Router,
  routing::{delete, get, post, put},
};

pub use error::ApiError;

/// Shared handler state: the services over one backend, and the deadline
/// given to each request's context.
pub struct AppState<R: Repositories> {
  pub services:        Arc<Services<R>>,
  pub request_timeout: Option<Duration>,
}

impl<R: Repositories> Clone for AppState<R> {
  fn clone(&self) -> Self {
    Self {
      services:        self.services.clone(),
      request_timeout: self.request_timeout,
    }
  }
}

/// Build a fully-materialised API router over `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<R: Repositories>(
  store: &R,
  request_timeout: Option<Duration>,
) -> Router<()> {
  let state = AppState {
    services: Arc::new(Services::new(store)),
    request_timeout,
  };

  Router::new()
    // Resources
    .route("/resources", get(resources::list::<R>).post(resources::create::<R>))
    .route(
      "/resources/{id}",
      get(resources::get_one::<R>)
        .patch(resources::update::<R>)
        .delete(resources::remove::<R>),
    )
    .route("/resources/{id}/quantity", put(resources::set_quantity::<R>))
    // Donations
    .route("/resources/{id}/donate", post(donations::donate::<R>))
    .route("/resources/{id}/return", delete(donations::return_all::<R>))
    .route("/resources/{id}/donations", get(donations::list::<R>))
    // Families
    .route("/families", get(families::list::<R>).post(families::create::<R>))
    .route(
      "/families/{id}",
      get(families::get_one::<R>)
        .patch(families::update::<R>)
        .delete(families::remove::<R>),
    )
    // Persons
    .route("/persons", get(persons::list::<R>).post(persons::create::<R>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<R>)
        .patch(persons::update::<R>)
        .delete(persons::remove::<R>),
    )
    .with_state(state)
}
