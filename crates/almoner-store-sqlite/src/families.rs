//! [`SqliteFamilies`]: the SQLite implementation of [`FamilyRepository`].

use almoner_core::{
  Error as DomainError, RequestContext, Result,
  family::{ENTITY, Family, FamilyUpdate, NewFamily},
  repository::FamilyRepository,
  timestamp,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  encode::{FAMILY_COLUMNS, RawFamily, decode_all, encode_ts},
  pool::Pool,
  update::{apply, assignments, soft_delete, text},
};

#[derive(Clone)]
pub struct SqliteFamilies {
  pool: Pool,
}

impl SqliteFamilies {
  pub(crate) fn new(pool: Pool) -> Self { Self { pool } }
}

/// Whether `id` names a live family. Persons and donations may only point at
/// one of these.
pub(crate) fn is_live(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM families WHERE id = ?1 AND deleted_at IS NULL",
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn select_live(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawFamily>> {
  conn
    .query_row(
      &format!(
        "SELECT {FAMILY_COLUMNS} FROM families \
         WHERE id = ?1 AND deleted_at IS NULL"
      ),
      rusqlite::params![id],
      RawFamily::from_row,
    )
    .optional()
}

impl FamilyRepository for SqliteFamilies {
  async fn find_all(&self, ctx: &RequestContext) -> Result<Vec<Family>> {
    let raws = self
      .pool
      .run(ctx, |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FAMILY_COLUMNS} FROM families \
           WHERE deleted_at IS NULL ORDER BY id"
        ))?;
        let rows = stmt
          .query_map([], RawFamily::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_all(raws, RawFamily::decode)?)
  }

  async fn find_one_by_id(&self, ctx: &RequestContext, id: i64) -> Result<Family> {
    let raw = self
      .pool
      .run(ctx, move |conn| Ok(select_live(conn, id)?))
      .await?
      .ok_or_else(|| DomainError::not_found(ENTITY, id))?;

    Ok(raw.decode()?)
  }

  async fn create(&self, ctx: &RequestContext, input: NewFamily) -> Result<Family> {
    let now = timestamp::now();
    let at = encode_ts(&now);

    let (id, input) = self
      .pool
      .transaction(ctx, move |tx| {
        tx.execute(
          "INSERT INTO families \
             (created_at, updated_at, name, country, state, city, \
              neighborhood, street, number, complement, zipcode) \
           VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            at,
            input.name,
            input.country,
            input.state,
            input.city,
            input.neighborhood,
            input.street,
            input.number,
            input.complement,
            input.zipcode,
          ],
        )?;
        Ok((tx.last_insert_rowid(), input))
      })
      .await?;

    let NewFamily {
      name,
      country,
      state,
      city,
      neighborhood,
      street,
      number,
      complement,
      zipcode,
    } = input;

    Ok(Family {
      id,
      created_at: now,
      updated_at: now,
      deleted_at: None,
      name,
      country,
      state,
      city,
      neighborhood,
      street,
      number,
      complement,
      zipcode,
    })
  }

  async fn update(
    &self,
    ctx: &RequestContext,
    id: i64,
    update: FamilyUpdate,
  ) -> Result<Family> {
    let (columns, values) = assignments(vec![
      ("name", text(update.name)),
      ("country", text(update.country)),
      ("state", text(update.state)),
      ("city", text(update.city)),
      ("neighborhood", text(update.neighborhood)),
      ("street", text(update.street)),
      ("number", text(update.number)),
      ("complement", text(update.complement)),
      ("zipcode", text(update.zipcode)),
    ]);
    if columns.is_empty() {
      return Err(DomainError::empty_model(ENTITY));
    }

    let raw = self
      .pool
      .transaction(ctx, move |tx| {
        if apply(tx, "families", id, columns, values)? == 0 {
          return Err(DomainError::not_found(ENTITY, id).into());
        }
        select_live(tx, id)?
          .ok_or_else(|| DomainError::not_found(ENTITY, id).into())
      })
      .await?;

    Ok(raw.decode()?)
  }

  async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
    Ok(soft_delete(&self.pool, ctx, "families", id).await?)
  }
}
