//! [`SqliteResources`]: the SQLite implementation of [`ResourceRepository`].

use almoner_core::{
  Error as DomainError, RequestContext, Result,
  repository::ResourceRepository,
  resource::{ENTITY, NewResource, Resource, ResourceUpdate},
  timestamp,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  encode::{RESOURCE_COLUMNS, RawResource, decode_all, encode_ts},
  pool::Pool,
  update::{apply, assignments, real, soft_delete, text},
};

#[derive(Clone)]
pub struct SqliteResources {
  pool: Pool,
}

impl SqliteResources {
  pub(crate) fn new(pool: Pool) -> Self { Self { pool } }
}

/// The live row `id`, if any.
pub(crate) fn select_live(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<Option<RawResource>> {
  conn
    .query_row(
      &format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources \
         WHERE id = ?1 AND deleted_at IS NULL"
      ),
      rusqlite::params![id],
      RawResource::from_row,
    )
    .optional()
}

impl ResourceRepository for SqliteResources {
  async fn find_all(&self, ctx: &RequestContext) -> Result<Vec<Resource>> {
    let raws = self
      .pool
      .run(ctx, |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESOURCE_COLUMNS} FROM resources \
           WHERE deleted_at IS NULL ORDER BY id"
        ))?;
        let rows = stmt
          .query_map([], RawResource::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_all(raws, RawResource::decode)?)
  }

  async fn find_one_by_id(
    &self,
    ctx: &RequestContext,
    id: i64,
  ) -> Result<Resource> {
    let raw = self
      .pool
      .run(ctx, move |conn| Ok(select_live(conn, id)?))
      .await?
      .ok_or_else(|| DomainError::not_found(ENTITY, id))?;

    Ok(raw.decode()?)
  }

  async fn create(
    &self,
    ctx: &RequestContext,
    input: NewResource,
  ) -> Result<Resource> {
    let now = timestamp::now();
    let at = encode_ts(&now);
    let NewResource { name, amount, measurement, quantity } = input;

    let (id, name, measurement) = self
      .pool
      .transaction(ctx, move |tx| {
        tx.execute(
          "INSERT INTO resources \
             (created_at, updated_at, name, amount, measurement, quantity) \
           VALUES (?1, ?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![at, name, amount, measurement, quantity],
        )?;
        Ok((tx.last_insert_rowid(), name, measurement))
      })
      .await?;

    Ok(Resource {
      id,
      created_at: now,
      updated_at: now,
      deleted_at: None,
      name,
      amount,
      measurement,
      quantity,
    })
  }

  async fn update(
    &self,
    ctx: &RequestContext,
    id: i64,
    update: ResourceUpdate,
  ) -> Result<Resource> {
    let (columns, values) = assignments(vec![
      ("name", text(update.name)),
      ("amount", real(update.amount)),
      ("measurement", text(update.measurement)),
    ]);
    if columns.is_empty() {
      return Err(DomainError::empty_model(ENTITY));
    }

    let raw = self
      .pool
      .transaction(ctx, move |tx| {
        if apply(tx, "resources", id, columns, values)? == 0 {
          return Err(DomainError::not_found(ENTITY, id).into());
        }
        select_live(tx, id)?
          .ok_or_else(|| DomainError::not_found(ENTITY, id).into())
      })
      .await?;

    Ok(raw.decode()?)
  }

  async fn set_quantity(
    &self,
    ctx: &RequestContext,
    id: i64,
    quantity: f64,
  ) -> Result<Resource> {
    if quantity < 0.0 {
      return Err(DomainError::Validation(format!(
        "quantity must not be negative, got {quantity:.1}"
      )));
    }
    let at = encode_ts(&timestamp::now());

    let raw = self
      .pool
      .transaction(ctx, move |tx| {
        let touched = tx.execute(
          "UPDATE resources SET quantity = ?1, updated_at = ?2 \
           WHERE id = ?3 AND deleted_at IS NULL",
          rusqlite::params![quantity, at, id],
        )?;
        if touched == 0 {
          return Err(DomainError::not_found(ENTITY, id).into());
        }
        select_live(tx, id)?
          .ok_or_else(|| DomainError::not_found(ENTITY, id).into())
      })
      .await?;

    Ok(raw.decode()?)
  }

  async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
    Ok(soft_delete(&self.pool, ctx, "resources", id).await?)
  }
}
