//! Repository traits, one per aggregate.
//!
//! The traits are implemented by storage backends (e.g.
//! `almoner-store-sqlite`). Services and the transport depend on this
//! abstraction, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`). Every method takes
//! the [`RequestContext`] of the call; implementations must not commit work
//! once it is cancelled.

use std::future::Future;

use crate::{
  RequestContext, Result,
  donation::{Donation, NewDonation, Refund},
  family::{Family, FamilyUpdate, NewFamily},
  person::{NewPerson, Person, PersonUpdate},
  resource::{NewResource, Resource, ResourceUpdate},
};

// ─── Resources ───────────────────────────────────────────────────────────────

pub trait ResourceRepository: Send + Sync {
  /// All live resources.
  fn find_all<'a>(
    &'a self,
    ctx: &'a RequestContext,
  ) -> impl Future<Output = Result<Vec<Resource>>> + Send + 'a;

  /// `NotFound("resource <id> not found")` if absent or soft-deleted.
  fn find_one_by_id<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
  ) -> impl Future<Output = Result<Resource>> + Send + 'a;

  /// Persist a new resource; the store assigns the id and timestamps.
  fn create<'a>(
    &'a self,
    ctx: &'a RequestContext,
    input: NewResource,
  ) -> impl Future<Output = Result<Resource>> + Send + 'a;

  /// Apply a partial update and return the stored row.
  ///
  /// `EmptyModel` when nothing is set (no statement is issued), `NotFound`
  /// when no live row matched.
  fn update<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
    update: ResourceUpdate,
  ) -> impl Future<Output = Result<Resource>> + Send + 'a;

  /// Overwrite the stock of a live resource.
  fn set_quantity<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
    quantity: f64,
  ) -> impl Future<Output = Result<Resource>> + Send + 'a;

  /// Soft-delete. Deleting an absent or already-deleted row succeeds.
  fn delete<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

// ─── Families ────────────────────────────────────────────────────────────────

/// Same contract as [`ResourceRepository`], for families.
pub trait FamilyRepository: Send + Sync {
  fn find_all<'a>(
    &'a self,
    ctx: &'a RequestContext,
  ) -> impl Future<Output = Result<Vec<Family>>> + Send + 'a;

  fn find_one_by_id<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
  ) -> impl Future<Output = Result<Family>> + Send + 'a;

  fn create<'a>(
    &'a self,
    ctx: &'a RequestContext,
    input: NewFamily,
  ) -> impl Future<Output = Result<Family>> + Send + 'a;

  fn update<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
    update: FamilyUpdate,
  ) -> impl Future<Output = Result<Family>> + Send + 'a;

  fn delete<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

// ─── Persons ─────────────────────────────────────────────────────────────────

/// Same contract as [`ResourceRepository`], for persons. `create` and an
/// `update` that moves a person fail with `NotFound("family <id> not found")`
/// unless the family is live.
pub trait PersonRepository: Send + Sync {
  fn find_all<'a>(
    &'a self,
    ctx: &'a RequestContext,
  ) -> impl Future<Output = Result<Vec<Person>>> + Send + 'a;

  fn find_one_by_id<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
  ) -> impl Future<Output = Result<Person>> + Send + 'a;

  fn create<'a>(
    &'a self,
    ctx: &'a RequestContext,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person>> + Send + 'a;

  fn update<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<Person>> + Send + 'a;

  fn delete<'a>(
    &'a self,
    ctx: &'a RequestContext,
    id: i64,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}

// ─── Donations ───────────────────────────────────────────────────────────────

/// The transactional core. Both writes run inside one serializable
/// transaction and either commit entirely or leave no trace.
pub trait DonationRepository: Send + Sync {
  /// Move `input.quantity` units of stock to a family and record the ledger
  /// entry.
  ///
  /// Fails with `NotFound` for a missing resource, `Negative` if the stock
  /// would drop below zero, then `NotFound` for a missing family, in that
  /// order. Not idempotent: a retry after a commit records a second entry.
  fn donate<'a>(
    &'a self,
    ctx: &'a RequestContext,
    input: NewDonation,
  ) -> impl Future<Output = Result<Donation>> + Send + 'a;

  /// Remove every outstanding ledger entry of `resource_id` and add their
  /// summed quantity back to its stock.
  ///
  /// Entries for different families are collapsed into one refund.
  /// `NotFound("resource <id> not found")` when there is nothing to return.
  fn return_donations<'a>(
    &'a self,
    ctx: &'a RequestContext,
    resource_id: i64,
  ) -> impl Future<Output = Result<Refund>> + Send + 'a;

  /// The outstanding ledger entries of a resource, oldest first.
  fn find_by_resource<'a>(
    &'a self,
    ctx: &'a RequestContext,
    resource_id: i64,
  ) -> impl Future<Output = Result<Vec<Donation>>> + Send + 'a;
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// A backend providing every repository. Handles are cheap to clone and share
/// the backend's connection pool.
pub trait Repositories: Clone + Send + Sync + 'static {
  type Resources: ResourceRepository + 'static;
  type Families: FamilyRepository + 'static;
  type Persons: PersonRepository + 'static;
  type Donations: DonationRepository + 'static;

  fn resources(&self) -> Self::Resources;
  fn families(&self) -> Self::Families;
  fn persons(&self) -> Self::Persons;
  fn donations(&self) -> Self::Donations;
}
