//! [`SqliteDonations`]: the donation ledger and the stock movements that go
//! with it.
//!
//! Donate and Return each run as one `BEGIN IMMEDIATE` transaction, so the
//! stock read at the start of the body is still the stock at commit time.

use almoner_core::{
  Error as DomainError, RequestContext, Result,
  donation::{Donation, NewDonation, Refund},
  family,
  repository::DonationRepository,
  resource, timestamp,
};
use rusqlite::OptionalExtension as _;

use crate::{
  encode::{DONATION_COLUMNS, RawDonation, decode_all, encode_ts},
  error::family_reference,
  families::is_live,
  pool::Pool,
};

#[derive(Clone)]
pub struct SqliteDonations {
  pool: Pool,
}

impl SqliteDonations {
  pub(crate) fn new(pool: Pool) -> Self { Self { pool } }
}

impl DonationRepository for SqliteDonations {
  async fn donate(
    &self,
    ctx: &RequestContext,
    input: NewDonation,
  ) -> Result<Donation> {
    let NewDonation { resource_id, family_id, quantity } = input;
    let now = timestamp::now();
    let at = encode_ts(&now);
    let scope = ctx.clone();

    let id = self
      .pool
      .transaction(ctx, move |tx| {
        let current: f64 = tx
          .query_row(
            "SELECT quantity FROM resources WHERE id = ?1 AND deleted_at IS NULL",
            rusqlite::params![resource_id],
            |row| row.get(0),
          )
          .optional()?
          .ok_or_else(|| DomainError::not_found(resource::ENTITY, resource_id))?;

        if current - quantity < 0.0 {
          return Err(DomainError::negative(resource_id, current).into());
        }
        scope.check()?;

        if !is_live(tx, family_id)? {
          return Err(DomainError::not_found(family::ENTITY, family_id).into());
        }
        tx.execute(
          "INSERT INTO resources_to_families \
             (created_at, resource_id, family_id, quantity) \
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![at, resource_id, family_id, quantity],
        )
        .map_err(family_reference(family_id))?;
        let id = tx.last_insert_rowid();
        scope.check()?;

        tx.execute(
          "UPDATE resources SET quantity = quantity - ?1, updated_at = ?2 \
           WHERE id = ?3",
          rusqlite::params![quantity, at, resource_id],
        )?;
        Ok(id)
      })
      .await?;

    Ok(Donation { id, created_at: now, resource_id, family_id, quantity })
  }

  async fn return_donations(
    &self,
    ctx: &RequestContext,
    resource_id: i64,
  ) -> Result<Refund> {
    let at = encode_ts(&timestamp::now());
    let scope = ctx.clone();

    let refund = self
      .pool
      .transaction(ctx, move |tx| {
        let quantities = {
          let mut stmt = tx.prepare(
            "SELECT quantity FROM resources_to_families WHERE resource_id = ?1",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![resource_id], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };
        if quantities.is_empty() {
          return Err(DomainError::not_found(resource::ENTITY, resource_id).into());
        }
        let quantity: f64 = quantities.iter().sum();
        scope.check()?;

        tx.execute(
          "DELETE FROM resources_to_families WHERE resource_id = ?1",
          rusqlite::params![resource_id],
        )?;
        scope.check()?;

        tx.execute(
          "UPDATE resources SET quantity = quantity + ?1, updated_at = ?2 \
           WHERE id = ?3",
          rusqlite::params![quantity, at, resource_id],
        )?;
        Ok(Refund { resource_id, entries: quantities.len(), quantity })
      })
      .await?;

    Ok(refund)
  }

  async fn find_by_resource(
    &self,
    ctx: &RequestContext,
    resource_id: i64,
  ) -> Result<Vec<Donation>> {
    let raws = self
      .pool
      .run(ctx, move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DONATION_COLUMNS} FROM resources_to_families \
           WHERE resource_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![resource_id], RawDonation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_all(raws, RawDonation::decode)?)
  }
}
