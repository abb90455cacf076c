//! Donation ledger entries.
//!
//! A ledger entry records that `quantity` units of a resource went to a
//! family. Entries are immutable: Donate inserts one, Return removes every
//! outstanding entry of a resource. There is no cancelled state; a failed
//! Donate leaves no trace.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row of the `resources_to_families` ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
  pub id:          i64,
  #[serde(with = "crate::timestamp")]
  pub created_at:  NaiveDateTime,
  pub resource_id: i64,
  pub family_id:   i64,
  /// Strictly positive.
  pub quantity:    f64,
}

/// Input to [`crate::repository::DonationRepository::donate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewDonation {
  pub resource_id: i64,
  pub family_id:   i64,
  pub quantity:    f64,
}

/// Outcome of returning every outstanding donation of a resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refund {
  pub resource_id: i64,
  /// Number of ledger entries removed.
  pub entries:     usize,
  /// Sum of their quantities, added back to the resource's stock.
  pub quantity:    f64,
}
