//! [`SqlitePersons`]: the SQLite implementation of [`PersonRepository`].

use almoner_core::{
  Change, Error as DomainError, RequestContext, Result, family,
  person::{ENTITY, NewPerson, Person, PersonUpdate},
  repository::PersonRepository,
  timestamp,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  encode::{PERSON_COLUMNS, RawPerson, decode_all, encode_ts},
  error::family_reference,
  families::is_live,
  pool::Pool,
  update::{apply, assignments, integer, soft_delete, text},
};

#[derive(Clone)]
pub struct SqlitePersons {
  pool: Pool,
}

impl SqlitePersons {
  pub(crate) fn new(pool: Pool) -> Self { Self { pool } }
}

fn select_live(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawPerson>> {
  conn
    .query_row(
      &format!(
        "SELECT {PERSON_COLUMNS} FROM persons \
         WHERE id = ?1 AND deleted_at IS NULL"
      ),
      rusqlite::params![id],
      RawPerson::from_row,
    )
    .optional()
}

fn require_family(conn: &Connection, family_id: i64) -> crate::Result<()> {
  if is_live(conn, family_id)? {
    Ok(())
  } else {
    Err(DomainError::not_found(family::ENTITY, family_id).into())
  }
}

impl PersonRepository for SqlitePersons {
  async fn find_all(&self, ctx: &RequestContext) -> Result<Vec<Person>> {
    let raws = self
      .pool
      .run(ctx, |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons \
           WHERE deleted_at IS NULL ORDER BY id"
        ))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(decode_all(raws, RawPerson::decode)?)
  }

  async fn find_one_by_id(&self, ctx: &RequestContext, id: i64) -> Result<Person> {
    let raw = self
      .pool
      .run(ctx, move |conn| Ok(select_live(conn, id)?))
      .await?
      .ok_or_else(|| DomainError::not_found(ENTITY, id))?;

    Ok(raw.decode()?)
  }

  async fn create(&self, ctx: &RequestContext, input: NewPerson) -> Result<Person> {
    let now = timestamp::now();
    let at = encode_ts(&now);
    let NewPerson { family_id, name } = input;

    let (id, name) = self
      .pool
      .transaction(ctx, move |tx| {
        require_family(tx, family_id)?;
        tx.execute(
          "INSERT INTO persons (created_at, updated_at, family_id, name) \
           VALUES (?1, ?1, ?2, ?3)",
          rusqlite::params![at, family_id, name],
        )
        .map_err(family_reference(family_id))?;
        Ok((tx.last_insert_rowid(), name))
      })
      .await?;

    Ok(Person {
      id,
      created_at: now,
      updated_at: now,
      deleted_at: None,
      family_id,
      name,
    })
  }

  async fn update(
    &self,
    ctx: &RequestContext,
    id: i64,
    update: PersonUpdate,
  ) -> Result<Person> {
    let moved_to = update.family_id;
    let (columns, values) = assignments(vec![
      ("family_id", integer(update.family_id)),
      ("name", text(update.name)),
    ]);
    if columns.is_empty() {
      return Err(DomainError::empty_model(ENTITY));
    }

    let raw = self
      .pool
      .transaction(ctx, move |tx| {
        if let Change::Set(family_id) = moved_to {
          require_family(tx, family_id)?;
        }
        if apply(tx, "persons", id, columns, values)? == 0 {
          return Err(DomainError::not_found(ENTITY, id).into());
        }
        select_live(tx, id)?
          .ok_or_else(|| DomainError::not_found(ENTITY, id).into())
      })
      .await?;

    Ok(raw.decode()?)
  }

  async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<()> {
    Ok(soft_delete(&self.pool, ctx, "persons", id).await?)
  }
}
