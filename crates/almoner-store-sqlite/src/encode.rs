//! Encoding and decoding between domain types and SQLite rows.
//!
//! Timestamps are stored as `YYYY-MM-DDTHH:MM:SS` text in UTC. Rows are first
//! read into plain `Raw*` structs inside the connection thread and decoded
//! into domain types afterwards, so parse failures surface as
//! [`Error::DateParse`] rather than as driver errors.

use almoner_core::{
  donation::Donation, family::Family, person::Person, resource::Resource,
  timestamp,
};
use chrono::NaiveDateTime;
use rusqlite::Row;

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_ts(ts: &NaiveDateTime) -> String { timestamp::format(ts) }

pub fn decode_ts(s: &str) -> Result<NaiveDateTime> {
  timestamp::parse(s).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_ts(s: Option<&str>) -> Result<Option<NaiveDateTime>> {
  s.map(decode_ts).transpose()
}

// ─── Resources ───────────────────────────────────────────────────────────────

pub const RESOURCE_COLUMNS: &str =
  "id, created_at, updated_at, deleted_at, name, amount, measurement, quantity";

pub struct RawResource {
  pub id:          i64,
  pub created_at:  String,
  pub updated_at:  String,
  pub deleted_at:  Option<String>,
  pub name:        String,
  pub amount:      f64,
  pub measurement: String,
  pub quantity:    f64,
}

impl RawResource {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      created_at:  row.get(1)?,
      updated_at:  row.get(2)?,
      deleted_at:  row.get(3)?,
      name:        row.get(4)?,
      amount:      row.get(5)?,
      measurement: row.get(6)?,
      quantity:    row.get(7)?,
    })
  }

  pub fn decode(self) -> Result<Resource> {
    Ok(Resource {
      id:          self.id,
      created_at:  decode_ts(&self.created_at)?,
      updated_at:  decode_ts(&self.updated_at)?,
      deleted_at:  decode_opt_ts(self.deleted_at.as_deref())?,
      name:        self.name,
      amount:      self.amount,
      measurement: self.measurement,
      quantity:    self.quantity,
    })
  }
}

// ─── Families ────────────────────────────────────────────────────────────────

pub const FAMILY_COLUMNS: &str = "id, created_at, updated_at, deleted_at, name, \
                                  country, state, city, neighborhood, street, \
                                  number, complement, zipcode";

pub struct RawFamily {
  pub id:           i64,
  pub created_at:   String,
  pub updated_at:   String,
  pub deleted_at:   Option<String>,
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

impl RawFamily {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      created_at:   row.get(1)?,
      updated_at:   row.get(2)?,
      deleted_at:   row.get(3)?,
      name:         row.get(4)?,
      country:      row.get(5)?,
      state:        row.get(6)?,
      city:         row.get(7)?,
      neighborhood: row.get(8)?,
      street:       row.get(9)?,
      number:       row.get(10)?,
      complement:   row.get(11)?,
      zipcode:      row.get(12)?,
    })
  }

  pub fn decode(self) -> Result<Family> {
    Ok(Family {
      id:           self.id,
      created_at:   decode_ts(&self.created_at)?,
      updated_at:   decode_ts(&self.updated_at)?,
      deleted_at:   decode_opt_ts(self.deleted_at.as_deref())?,
      name:         self.name,
      country:      self.country,
      state:        self.state,
      city:         self.city,
      neighborhood: self.neighborhood,
      street:       self.street,
      number:       self.number,
      complement:   self.complement,
      zipcode:      self.zipcode,
    })
  }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &str =
  "id, created_at, updated_at, deleted_at, family_id, name";

pub struct RawPerson {
  pub id:         i64,
  pub created_at: String,
  pub updated_at: String,
  pub deleted_at: Option<String>,
  pub family_id:  i64,
  pub name:       String,
}

impl RawPerson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      created_at: row.get(1)?,
      updated_at: row.get(2)?,
      deleted_at: row.get(3)?,
      family_id:  row.get(4)?,
      name:       row.get(5)?,
    })
  }

  pub fn decode(self) -> Result<Person> {
    Ok(Person {
      id:         self.id,
      created_at: decode_ts(&self.created_at)?,
      updated_at: decode_ts(&self.updated_at)?,
      deleted_at: decode_opt_ts(self.deleted_at.as_deref())?,
      family_id:  self.family_id,
      name:       self.name,
    })
  }
}

// ─── Donations ───────────────────────────────────────────────────────────────

pub const DONATION_COLUMNS: &str =
  "id, created_at, resource_id, family_id, quantity";

pub struct RawDonation {
  pub id:          i64,
  pub created_at:  String,
  pub resource_id: i64,
  pub family_id:   i64,
  pub quantity:    f64,
}

impl RawDonation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      created_at:  row.get(1)?,
      resource_id: row.get(2)?,
      family_id:   row.get(3)?,
      quantity:    row.get(4)?,
    })
  }

  pub fn decode(self) -> Result<Donation> {
    Ok(Donation {
      id:          self.id,
      created_at:  decode_ts(&self.created_at)?,
      resource_id: self.resource_id,
      family_id:   self.family_id,
      quantity:    self.quantity,
    })
  }
}

/// Decode a batch of raw rows, failing on the first bad one.
pub fn decode_all<R, T>(
  rows: Vec<R>,
  decode: impl Fn(R) -> Result<T>,
) -> Result<Vec<T>> {
  rows.into_iter().map(decode).collect()
}
