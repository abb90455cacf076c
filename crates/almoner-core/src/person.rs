//! Person: a member of a [`Family`](crate::family::Family).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Change;

pub const ENTITY: &str = "person";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub id:         i64,
  #[serde(with = "crate::timestamp")]
  pub created_at: NaiveDateTime,
  #[serde(with = "crate::timestamp")]
  pub updated_at: NaiveDateTime,
  #[serde(with = "crate::timestamp::option", default)]
  pub deleted_at: Option<NaiveDateTime>,
  /// Must name a live family when the person is created or moved.
  pub family_id:  i64,
  pub name:       String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPerson {
  pub family_id: i64,
  pub name:      String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonUpdate {
  pub family_id: Change<i64>,
  pub name:      Change<String>,
}
