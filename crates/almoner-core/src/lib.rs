//! Core types and capability traits for the Almoner donation service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! store (`almoner-store-sqlite`) implements the repository traits; the
//! transport (`almoner-api`) drives the services.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod context;
pub mod donation;
pub mod error;
pub mod family;
pub mod person;
pub mod repository;
pub mod resource;
pub mod service;
pub mod timestamp;
pub mod update;

pub use context::RequestContext;
pub use error::{Error, Result};
pub use update::Change;
