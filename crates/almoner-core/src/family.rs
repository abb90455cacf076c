//! Family: the recipient of donations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Change;

pub const ENTITY: &str = "family";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
  pub id:           i64,
  #[serde(with = "crate::timestamp")]
  pub created_at:   NaiveDateTime,
  #[serde(with = "crate::timestamp")]
  pub updated_at:   NaiveDateTime,
  #[serde(with = "crate::timestamp::option", default)]
  pub deleted_at:   Option<NaiveDateTime>,
  pub name:         String,
  pub country:      String,
  pub state:        String,
  pub city:         String,
  pub neighborhood: String,
  pub street:       String,
  pub number:       String,
  pub complement:   String,
  pub zipcode:      String,
}

/// Input to [`crate::repository::FamilyRepository::create`]. Every field is
/// required to be non-empty by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFamily {
  pub name:         String,
  pub country:      String,
  pub state:        String,
  pub city:         String,
  pub neighborhood: String,
  pub street:       String,
  pub number:       String,
  pub complement:   String,
  pub zipcode:      String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyUpdate {
  pub name:         Change<String>,
  pub country:      Change<String>,
  pub state:        Change<String>,
  pub city:         Change<String>,
  pub neighborhood: Change<String>,
  pub street:       Change<String>,
  pub number:       Change<String>,
  pub complement:   Change<String>,
  pub zipcode:      Change<String>,
}
