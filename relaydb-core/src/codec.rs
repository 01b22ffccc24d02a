// SPDX-License-Identifier: AGPL-3.0-or-later
// RelayDB - Declarative SQL Chain Executor
// Copyright (C) 2026 RelayDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Portable JSON value codec
//!
//! Chain documents travel as JSON, which has no native representation for
//! timestamps or byte sequences. Both are carried as tagged data-URI
//! strings:
//!
//! ```text
//! data:object;<DateTime>,2020-10-11 00:00:00
//! data:application/octet-stream;base64,AQIDBA==
//! ```
//!
//! Any string that matches no known tag decodes to itself. The codec is
//! total: malformed tag payloads fall back to plain text instead of
//! erroring, and `decode(encode(x)) == x` for every supported value.

use crate::value::{SqlValue, DATETIME_FORMAT};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Tag prefix for timestamps.
pub const DATETIME_TAG: &str = "data:object;<DateTime>,";
/// Tag prefix for byte sequences.
pub const BYTES_TAG: &str = "data:application/octet-stream;base64,";

/// Encode a value into its portable JSON form.
pub fn encode(value: &SqlValue) -> JsonValue {
    match value {
        SqlValue::Null => JsonValue::Null,
        SqlValue::Bool(b) => JsonValue::from(*b),
        SqlValue::Int(i) => JsonValue::from(*i),
        SqlValue::UInt(u) => JsonValue::from(*u),
        SqlValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        SqlValue::Text(s) => JsonValue::from(s.clone()),
        SqlValue::Bytes(b) => JsonValue::from(format!("{}{}", BYTES_TAG, BASE64.encode(b))),
        SqlValue::DateTime(t) => {
            JsonValue::from(format!("{}{}", DATETIME_TAG, t.format(DATETIME_FORMAT)))
        }
        SqlValue::Raw(s) => JsonValue::Array(vec![JsonValue::from(s.clone())]),
        SqlValue::Array(items) => JsonValue::Array(items.iter().map(encode).collect()),
        SqlValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), encode(v)))
                .collect(),
        ),
    }
}

/// Decode a portable JSON value.
pub fn decode(value: &JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                SqlValue::UInt(u)
            } else {
                SqlValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => decode_str(s),
        JsonValue::Array(items) => {
            // One-element list of a plain string is the raw-fragment
            // convention of the document format.
            if items.len() == 1 {
                if let JsonValue::String(s) = &items[0] {
                    if !s.starts_with("data:") {
                        return SqlValue::Raw(s.clone());
                    }
                }
            }
            SqlValue::Array(items.iter().map(decode).collect())
        }
        JsonValue::Object(map) => SqlValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), decode(v)))
                .collect(),
        ),
    }
}

fn decode_str(s: &str) -> SqlValue {
    if let Some(rest) = s.strip_prefix(DATETIME_TAG) {
        if let Ok(t) = NaiveDateTime::parse_from_str(rest, DATETIME_FORMAT) {
            return SqlValue::DateTime(t);
        }
    }
    if let Some(rest) = s.strip_prefix(BYTES_TAG) {
        if let Ok(b) = BASE64.decode(rest) {
            return SqlValue::Bytes(b);
        }
    }
    SqlValue::Text(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_primitives_roundtrip() {
        for v in [
            SqlValue::Null,
            SqlValue::Bool(false),
            SqlValue::Int(-42),
            SqlValue::UInt(u64::MAX),
            SqlValue::Float(10.2),
            SqlValue::Text("Water".into()),
        ] {
            assert_eq!(decode(&encode(&v)), v);
        }
    }

    #[test]
    fn test_datetime_tag() {
        let v = SqlValue::DateTime(dt(2020, 10, 11, 0, 0, 0));
        let j = encode(&v);
        assert_eq!(
            j,
            JsonValue::from("data:object;<DateTime>,2020-10-11 00:00:00")
        );
        assert_eq!(decode(&j), v);
    }

    #[test]
    fn test_bytes_tag() {
        let v = SqlValue::Bytes(vec![1, 2, 3, 4]);
        let j = encode(&v);
        assert_eq!(
            j,
            JsonValue::from("data:application/octet-stream;base64,AQIDBA==")
        );
        assert_eq!(decode(&j), v);
    }

    #[test]
    fn test_raw_fragment_roundtrip() {
        let v = SqlValue::Raw("count + 1".into());
        let j = encode(&v);
        assert_eq!(j, serde_json::json!(["count + 1"]));
        assert_eq!(decode(&j), v);
    }

    #[test]
    fn test_untagged_string_decodes_to_itself() {
        assert_eq!(
            decode(&JsonValue::from("data:unknown;tag,zzz")),
            SqlValue::Text("data:unknown;tag,zzz".into())
        );
        assert_eq!(
            decode(&JsonValue::from("%SYS_USER%")),
            SqlValue::Text("%SYS_USER%".into())
        );
    }

    #[test]
    fn test_malformed_payload_falls_back_to_text() {
        let bad = "data:application/octet-stream;base64,!!!not-base64!!!";
        assert_eq!(decode(&JsonValue::from(bad)), SqlValue::Text(bad.into()));
        let bad_ts = "data:object;<DateTime>,2020-99-99";
        assert_eq!(
            decode(&JsonValue::from(bad_ts)),
            SqlValue::Text(bad_ts.into())
        );
    }

    #[test]
    fn test_nested_roundtrip() {
        let mut obj = HashMap::new();
        obj.insert("when".to_string(), SqlValue::DateTime(dt(2021, 1, 2, 3, 4, 5)));
        obj.insert("blob".to_string(), SqlValue::Bytes(vec![0xff, 0x00]));
        let v = SqlValue::Array(vec![
            SqlValue::Object(obj),
            SqlValue::Int(1),
            SqlValue::Null,
        ]);
        assert_eq!(decode(&encode(&v)), v);
    }
}
