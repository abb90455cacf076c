//! Resource: a fungible stockpile that donations draw from.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Change;

/// Entity name used in error messages.
pub const ENTITY: &str = "resource";

/// A stockpile of one kind of good, e.g. 5 bags of 1 Kg of rice.
///
/// `quantity` is never negative at a committed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  pub id:          i64,
  #[serde(with = "crate::timestamp")]
  pub created_at:  NaiveDateTime,
  #[serde(with = "crate::timestamp")]
  pub updated_at:  NaiveDateTime,
  #[serde(with = "crate::timestamp::option", default)]
  pub deleted_at:  Option<NaiveDateTime>,
  pub name:        String,
  /// Descriptive size of one unit, in `measurement`.
  pub amount:      f64,
  pub measurement: String,
  /// Current stock.
  pub quantity:    f64,
}

/// Input to [`crate::repository::ResourceRepository::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
  pub name:        String,
  pub amount:      f64,
  pub measurement: String,
  pub quantity:    f64,
}

/// Partial update of a resource's descriptive fields.
///
/// Stock only moves through donations, returns and the explicit quantity
/// override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceUpdate {
  pub name:        Change<String>,
  pub amount:      Change<f64>,
  pub measurement: Change<String>,
}
