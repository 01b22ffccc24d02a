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

//! Predicate trees
//!
//! A `Condition` is either a leaf comparison (`field op value`) or an
//! AND/OR group of child conditions. The operator string is emitted
//! verbatim; the only rewrite is the explicit NULL normalization for `=`,
//! `!=` and `<>`.
//!
//! On the wire a leaf is the three-element list `[field, op, value]` and a
//! group is `{"or": bool, "conditions": [...]}`; decoding dispatches on the
//! runtime shape.

use crate::codec;
use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::render;
use crate::resolve;
use crate::statement::Statement;
use crate::value::SqlValue;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// WHERE tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field op value`. The op is emitted verbatim.
    Value {
        field: String,
        op: String,
        value: SqlValue,
    },
    /// AND (`or == false`) or OR (`or == true`) of child conditions.
    Group { or: bool, children: Vec<Condition> },
}

impl Condition {
    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Condition::Value {
            field: field.into(),
            op: "=".into(),
            value: value.into(),
        }
    }

    /// `field op value`
    pub fn compare(
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Self {
        Condition::Value {
            field: field.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// AND group.
    pub fn all(children: Vec<Condition>) -> Self {
        Condition::Group {
            or: false,
            children,
        }
    }

    /// OR group.
    pub fn any(children: Vec<Condition>) -> Self {
        Condition::Group { or: true, children }
    }

    /// Render the SQL fragment for this tree.
    ///
    /// Leaf values containing placeholders are resolved against `variables`
    /// and the executed chain first. A value that stringifies to the literal
    /// `null` turns `=` into `IS NULL` and `!=`/`<>` into `IS NOT NULL`.
    pub fn build(
        &self,
        dialect: &Dialect,
        variables: &HashMap<String, SqlValue>,
        executed: &[Statement],
    ) -> String {
        match self {
            Condition::Value { field, op, value } => {
                let resolved = if resolve::value_has_placeholder(value) {
                    resolve::substitute(value, variables, executed)
                } else {
                    value.clone()
                };
                let field = dialect.quote_ident(field);
                if resolved.to_string().eq_ignore_ascii_case("null") {
                    match op.as_str() {
                        "=" => return format!("{} IS NULL", field),
                        "!=" | "<>" => return format!("{} IS NOT NULL", field),
                        _ => {}
                    }
                }
                format!("{} {} {}", field, op, render::sql_literal(&resolved, dialect))
            }
            Condition::Group { or, children } => {
                if children.is_empty() {
                    return String::new();
                }
                let parts: Vec<String> = children
                    .iter()
                    .map(|c| c.build(dialect, variables, executed))
                    .collect();
                if parts.len() == 1 {
                    return parts.into_iter().next().unwrap_or_default();
                }
                let joiner = if *or { " OR " } else { " AND " };
                format!("( {} )", parts.join(joiner))
            }
        }
    }

    /// Collect the `%NAME%` placeholders appearing in leaf values, in order
    /// of appearance, deduplicated into `out`.
    pub fn required_variables(&self, out: &mut Vec<String>) {
        match self {
            Condition::Value { value, .. } => resolve::placeholder_names(value, out),
            Condition::Group { children, .. } => {
                for child in children {
                    child.required_variables(out);
                }
            }
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Condition::Value { field, op, value } => JsonValue::Array(vec![
                JsonValue::from(field.clone()),
                JsonValue::from(op.clone()),
                codec::encode(value),
            ]),
            Condition::Group { or, children } => {
                serde_json::json!({
                    "or": or,
                    "conditions": children.iter().map(Condition::to_json).collect::<Vec<_>>(),
                })
            }
        }
    }

    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => {
                if items.len() != 3 {
                    return Err(CoreError::Document(format!(
                        "condition list must have 3 elements, got {}",
                        items.len()
                    )));
                }
                let field = items[0].as_str().ok_or_else(|| {
                    CoreError::Document("condition field must be a string".into())
                })?;
                let op = items[1]
                    .as_str()
                    .ok_or_else(|| CoreError::Document("condition op must be a string".into()))?;
                Ok(Condition::Value {
                    field: field.to_string(),
                    op: op.to_string(),
                    value: codec::decode(&items[2]),
                })
            }
            JsonValue::Object(map) => {
                let or = map.get("or").and_then(JsonValue::as_bool).unwrap_or(false);
                let children = map
                    .get("conditions")
                    .and_then(JsonValue::as_array)
                    .ok_or_else(|| {
                        CoreError::Document("condition group is missing 'conditions'".into())
                    })?
                    .iter()
                    .map(Condition::from_json)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Condition::Group { or, children })
            }
            other => Err(CoreError::Document(format!(
                "condition must be a list or an object, got {}",
                other
            ))),
        }
    }
}
