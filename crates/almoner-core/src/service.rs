//! Stateless use cases over the repositories.
//!
//! Services never wrap or rename errors. They log unexpected failures at error
//! level with the request path and span id; expected outcomes (`NotFound`,
//! `EmptyModel`, `Negative`, `Validation`) only reach debug level.

use tracing::{debug, error};

use crate::{
  Error, RequestContext, Result,
  donation::{Donation, NewDonation, Refund},
  family::{Family, FamilyUpdate, NewFamily},
  person::{NewPerson, Person, PersonUpdate},
  repository::{
    DonationRepository, FamilyRepository, PersonRepository, Repositories,
    ResourceRepository,
  },
  resource::{NewResource, Resource, ResourceUpdate},
};

fn report(ctx: &RequestContext, operation: &str, err: &Error) {
  if err.is_expected() {
    debug!(
      path = ctx.path(),
      span_id = %ctx.span_id(),
      error = %err,
      "{operation} rejected"
    );
  } else {
    error!(
      path = ctx.path(),
      span_id = %ctx.span_id(),
      error = %err,
      "{operation} failed"
    );
  }
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Every service, built over one backend.
pub struct Services<S: Repositories> {
  pub resources: ResourceService<S::Resources>,
  pub families:  FamilyService<S::Families>,
  pub persons:   PersonService<S::Persons>,
  pub donations: DonationService<S::Donations>,
}

impl<S: Repositories> Services<S> {
  pub fn new(store: &S) -> Self {
    Self {
      resources: ResourceService::new(store.resources()),
      families:  FamilyService::new(store.families()),
      persons:   PersonService::new(store.persons()),
      donations: DonationService::new(store.donations()),
    }
  }
}

// ─── Donations ───────────────────────────────────────────────────────────────

pub struct DonationService<D> {
  repo: D,
}

impl<D: DonationRepository> DonationService<D> {
  pub fn new(repo: D) -> Self { Self { repo } }

  pub async fn donate(
    &self,
    ctx: &RequestContext,
    input: NewDonation,
  ) -> Result<Donation> {
    let donation = self
      .repo
      .donate(ctx, input)
      .await
      .inspect_err(|e| report(ctx, "donate", e))?;
    debug!(
      span_id = %ctx.span_id(),
      donation_id = donation.id,
      resource_id = donation.resource_id,
      family_id = donation.family_id,
      quantity = donation.quantity,
      "donation recorded"
    );
    Ok(donation)
  }

  /// See [`DonationRepository::return_donations`] for the aggregation rule.
  pub async fn return_donations(
    &self,
    ctx: &RequestContext,
    resource_id: i64,
  ) -> Result<Refund> {
    let refund = self
      .repo
      .return_donations(ctx, resource_id)
      .await
      .inspect_err(|e| report(ctx, "return donations", e))?;
    debug!(
      span_id = %ctx.span_id(),
      resource_id,
      entries = refund.entries,
      quantity = refund.quantity,
      "donations returned"
    );
    Ok(refund)
  }

  pub async fn find_by_resource(
    &self,
    ctx: &RequestContext,
    resource_id: i64,
  ) -> Result<Vec<Donation>> {
    self
      .repo
      .find_by_resource(ctx, resource_id)
      .await
      .inspect_err(|e| report(ctx, "list donations", e))
  }
}

// ─── Resources ───────────────────────────────────────────────────────────────

pub struct ResourceService<R> {
  repo: R,
}

impl<R: ResourceRepository> ResourceService<R> {
  pub fn new(repo: R) -> Self { Self { repo } }

  pub async fn find_all(&self, ctx: &RequestContext) -> Result<Vec<Resource>> {
    self
      .repo
      .find_all(ctx)
      .await
      .inspect_err(|e| report(ctx, "list resources", e))
  }

  pub async fn find_one_by_id(
    &self,
    ctx: &RequestContext,
    id: i64,
  ) -> Result<Resource> {
    self
      .repo
      .find_one_by_id(ctx, id)
      .await
      .inspect_err(|e| report(ctx, "get resource", e))
  }

  pub async fn create(
    &self,
    ctx: &RequestContext,
    input: NewResource,
  ) -> Result<Resource> {
    self
      .repo
      .create(ctx, input)
      .await
      .inspect_err(|e| report(ctx, "create resource", e))
  }

  pub async fn update(
    &self,
    ctx: &RequestContext,
    id: i64,
    update: ResourceUpdate,
  ) -> Result<Resource> {
    self
      .repo
      .update(ctx, id, update)
      .await
      .inspect_err(|e| report(ctx, "update resource", e))
  }

  pub async fn set_quantity(
    &self,
    ctx: &RequestContext,
    id: i64,
    quantity: f64,
  ) -> Result<Resource> {
    self
      .repo
      .set_quantity(ctx, id, quantity)
      .await
      .inspect_err(|e| report(ctx, "set resource quantity", e))
  }

  pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
    self
      .repo
      .delete(ctx, id)
      .await
      .inspect_err(|e| report(ctx, "delete resource", e))
  }
}

// ─── Families ────────────────────────────────────────────────────────────────

pub struct FamilyService<F> {
  repo: F,
}

impl<F: FamilyRepository> FamilyService<F> {
  pub fn new(repo: F) -> Self { Self { repo } }

  pub async fn find_all(&self, ctx: &RequestContext) -> Result<Vec<Family>> {
    self
      .repo
      .find_all(ctx)
      .await
      .inspect_err(|e| report(ctx, "list families", e))
  }

  pub async fn find_one_by_id(
    &self,
    ctx: &RequestContext,
    id: i64,
  ) -> Result<Family> {
    self
      .repo
      .find_one_by_id(ctx, id)
      .await
      .inspect_err(|e| report(ctx, "get family", e))
  }

  pub async fn create(
    &self,
    ctx: &RequestContext,
    input: NewFamily,
  ) -> Result<Family> {
    self
      .repo
      .create(ctx, input)
      .await
      .inspect_err(|e| report(ctx, "create family", e))
  }

  pub async fn update(
    &self,
    ctx: &RequestContext,
    id: i64,
    update: FamilyUpdate,
  ) -> Result<Family> {
    self
      .repo
      .update(ctx, id, update)
      .await
      .inspect_err(|e| report(ctx, "update family", e))
  }

  pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
    self
      .repo
      .delete(ctx, id)
      .await
      .inspect_err(|e| report(ctx, "delete family", e))
  }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

pub struct PersonService<P> {
  repo: P,
}

impl<P: PersonRepository> PersonService<P> {
  pub fn new(repo: P) -> Self { Self { repo } }

  pub async fn find_all(&self, ctx: &RequestContext) -> Result<Vec<Person>> {
    self
      .repo
      .find_all(ctx)
      .await
      .inspect_err(|e| report(ctx, "list persons", e))
  }

  pub async fn find_one_by_id(
    &self,
    ctx: &RequestContext,
    id: i64,
  ) -> Result<Person> {
    self
      .repo
      .find_one_by_id(ctx, id)
      .await
      .inspect_err(|e| report(ctx, "get person", e))
  }

  pub async fn create(
    &self,
    ctx: &RequestContext,
    input: NewPerson,
  ) -> Result<Person> {
    self
      .repo
      .create(ctx, input)
      .await
      .inspect_err(|e| report(ctx, "create person", e))
  }

  pub async fn update(
    &self,
    ctx: &RequestContext,
    id: i64,
    update: PersonUpdate,
  ) -> Result<Person> {
    self
      .repo
      .update(ctx, id, update)
      .await
      .inspect_err(|e| report(ctx, "update person", e))
  }

  pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
    self
      .repo
      .delete(ctx, id)
      .await
      .inspect_err(|e| report(ctx, "delete person", e))
  }
}

#[cfg(test)]
mod tests {
  use std::future::Future;

  use super::*;

  /// Fails every call with a fixed error kind.
  struct Failing(fn() -> Error);

  impl DonationRepository for Failing {
    fn donate<'a>(
      &'a self,
      _ctx: &'a RequestContext,
      _input: NewDonation,
    ) -> impl Future<Output = Result<Donation>> + Send + 'a {
      async move { Err((self.0)()) }
    }

    fn return_donations<'a>(
      &'a self,
      _ctx: &'a RequestContext,
      _resource_id: i64,
    ) -> impl Future<Output = Result<Refund>> + Send + 'a {
      async move { Err((self.0)()) }
    }

    fn find_by_resource<'a>(
      &'a self,
      _ctx: &'a RequestContext,
      _resource_id: i64,
    ) -> impl Future<Output = Result<Vec<Donation>>> + Send + 'a {
      async move { Err((self.0)()) }
    }
  }

  fn input() -> NewDonation {
    NewDonation { resource_id: 1, family_id: 1, quantity: 10.0 }
  }

  #[tokio::test]
  async fn donate_passes_negative_through_unchanged() {
    let service = DonationService::new(Failing(|| Error::negative(1, 5.0)));
    let ctx = RequestContext::new("/api/v1/resources/1/donate");

    let err = service.donate(&ctx, input()).await.unwrap_err();
    assert!(matches!(err, Error::Negative(ref m) if m == "resource 1 quantity is 5.0"));
  }

  #[tokio::test]
  async fn return_passes_fatal_through_unchanged() {
    let service = DonationService::new(Failing(|| Error::fatal("disk I/O error")));
    let ctx = RequestContext::new("/api/v1/resources/1/return");

    let err = service.return_donations(&ctx, 1).await.unwrap_err();
    assert!(matches!(err, Error::Fatal(_)));
    assert_eq!(err.to_string(), "disk I/O error");
  }

  #[tokio::test]
  async fn listing_passes_not_found_through_unchanged() {
    let service =
      DonationService::new(Failing(|| Error::not_found("resource", 9)));
    let ctx = RequestContext::new("/api/v1/resources/9/donations");

    let err = service.find_by_resource(&ctx, 9).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref m) if m == "resource 9 not found"));
  }
}
