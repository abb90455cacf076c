//! Second-precision UTC timestamps.
//!
//! Every `created_at`/`updated_at`/`deleted_at` value is stored and sent in
//! the fixed `YYYY-MM-DDTHH:MM:SS` form, without a zone suffix. The functions
//! here double as a `#[serde(with = "...")]` module.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The current UTC time, truncated to whole seconds.
pub fn now() -> NaiveDateTime { Utc::now().naive_utc().trunc_subsecs(0) }

pub fn format(ts: &NaiveDateTime) -> String { ts.format(FORMAT).to_string() }

pub fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
  NaiveDateTime::parse_from_str(s, FORMAT)
}

pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
  S: Serializer,
{
  serializer.collect_str(&ts.format(FORMAT))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  parse(&raw).map_err(serde::de::Error::custom)
}

/// The same encoding for nullable columns such as `deleted_at`.
pub mod option {
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(
    ts: &Option<NaiveDateTime>,
    serializer: S,
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match ts {
      Some(ts) => super::serialize(ts, serializer),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D,
  ) -> Result<Option<NaiveDateTime>, D::Error>
  where
    D: Deserializer<'de>,
  {
    Option::<String>::deserialize(deserializer)?
      .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
      .transpose()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Timelike};
  use serde::{Deserialize, Serialize};

  use super::*;

  #[derive(Serialize, Deserialize)]
  struct Stamped {
    #[serde(with = "crate::timestamp")]
    at:      NaiveDateTime,
    #[serde(with = "crate::timestamp::option")]
    removed: Option<NaiveDateTime>,
  }

  #[test]
  fn now_has_no_fractional_seconds() {
    assert_eq!(now().nanosecond(), 0);
  }

  #[test]
  fn wire_form_has_no_zone_or_fraction() {
    let at = NaiveDate::from_ymd_opt(2024, 3, 9)
      .and_then(|d| d.and_hms_opt(7, 5, 1))
      .unwrap();
    let json =
      serde_json::to_value(Stamped { at, removed: None }).unwrap();
    assert_eq!(json["at"], "2024-03-09T07:05:01");
    assert!(json["removed"].is_null());

    let back: Stamped = serde_json::from_value(serde_json::json!({
      "at": "2024-03-09T07:05:01",
      "removed": "2024-03-10T00:00:00",
    }))
    .unwrap();
    assert_eq!(back.at, at);
    assert_eq!(format(&back.removed.unwrap()), "2024-03-10T00:00:00");
  }

  #[test]
  fn rejects_zone_suffix() {
    assert!(parse("2024-03-09T07:05:01Z").is_err());
  }
}
