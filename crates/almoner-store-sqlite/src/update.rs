//! Builds the `UPDATE ... SET` clause of a partial update.

use almoner_core::{Change, RequestContext, timestamp};
use rusqlite::{Transaction, types::Value};

use crate::{Result, encode::encode_ts, pool::Pool};

/// A column paired with its requested change.
pub type Field = (&'static str, Change<Value>);

/// Keep the `Set` fields, in order, as `column = ?N` assignments and their
/// bound values. A `Set(Value::Null)` is still an assignment.
pub fn assignments(fields: Vec<Field>) -> (Vec<String>, Vec<Value>) {
  let mut columns = Vec::new();
  let mut values = Vec::new();
  for (column, change) in fields {
    if let Change::Set(value) = change {
      values.push(value);
      columns.push(format!("{column} = ?{}", values.len()));
    }
  }
  (columns, values)
}

pub fn text(change: Change<String>) -> Change<Value> { change.map(Value::Text) }

pub fn real(change: Change<f64>) -> Change<Value> { change.map(Value::Real) }

pub fn integer(change: Change<i64>) -> Change<Value> { change.map(Value::Integer) }

/// Apply the assignments to the live row `id` of `table`, stamping
/// `updated_at`. Returns the number of rows touched, which is 0 when the row
/// is absent or soft-deleted.
///
/// Callers reject an empty assignment list before getting here.
pub fn apply(
  tx: &Transaction<'_>,
  table: &str,
  id: i64,
  mut columns: Vec<String>,
  mut values: Vec<Value>,
) -> Result<usize> {
  values.push(Value::Text(encode_ts(&timestamp::now())));
  columns.push(format!("updated_at = ?{}", values.len()));
  values.push(Value::Integer(id));

  let sql = format!(
    "UPDATE {table} SET {} WHERE id = ?{} AND deleted_at IS NULL",
    columns.join(", "),
    values.len()
  );
  Ok(tx.execute(&sql, rusqlite::params_from_iter(values))?)
}

/// Stamp `deleted_at` on a live row. Absent and already-deleted rows are left
/// alone.
pub async fn soft_delete(
  pool: &Pool,
  ctx: &RequestContext,
  table: &'static str,
  id: i64,
) -> Result<()> {
  let now = encode_ts(&timestamp::now());
  pool
    .transaction(ctx, move |tx| {
      tx.execute(
        &format!(
          "UPDATE {table} SET deleted_at = ?1, updated_at = ?1 \
           WHERE id = ?2 AND deleted_at IS NULL"
        ),
        rusqlite::params![now, id],
      )?;
      Ok(())
    })
    .await
}
