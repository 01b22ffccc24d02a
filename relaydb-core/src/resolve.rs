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

//! Variable and back-reference resolution
//!
//! Two placeholder shapes appear inside values:
//!
//! ```text
//! %NAME%            named variable, bound during the binding pass
//! #table:sqlId#     back-reference to an already-executed statement
//! ```
//!
//! A value that *is* exactly one placeholder is replaced by the bound value
//! with its type intact; a value that merely *contains* placeholders gets
//! in-string substitution with plain stringification. Back-references
//! resolve to the referenced statement's `lastId` when set, otherwise to its
//! result rows; forward references resolve to `Null`.

use crate::statement::Statement;
use crate::value::SqlValue;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref VAR_RE: Regex = Regex::new(r"%[A-Za-z_][A-Za-z0-9_]*%").unwrap();
    static ref REF_RE: Regex = Regex::new(r"#[^:#]+:[^:#]+#").unwrap();
    static ref ARITH_RE: Regex = Regex::new(r"^(-?\d+)\s*([+-])\s*(-?\d+)$").unwrap();
}

/// True when the string contains either placeholder shape.
pub fn contains_placeholder(s: &str) -> bool {
    VAR_RE.is_match(s) || REF_RE.is_match(s)
}

/// True when the value (or, for fragments and lists, anything inside it)
/// contains a placeholder.
pub fn value_has_placeholder(value: &SqlValue) -> bool {
    match value {
        SqlValue::Text(s) | SqlValue::Raw(s) => contains_placeholder(s),
        SqlValue::Array(items) => items.iter().any(value_has_placeholder),
        _ => false,
    }
}

/// Collect `%NAME%` names appearing in the value, in order of appearance,
/// deduplicated into `out`.
pub fn placeholder_names(value: &SqlValue, out: &mut Vec<String>) {
    match value {
        SqlValue::Text(s) | SqlValue::Raw(s) => {
            for m in VAR_RE.find_iter(s) {
                let name = &m.as_str()[1..m.as_str().len() - 1];
                if !out.iter().any(|n| n == name) {
                    out.push(name.to_string());
                }
            }
        }
        SqlValue::Array(items) => {
            for item in items {
                placeholder_names(item, out);
            }
        }
        _ => {}
    }
}

fn exact_var(s: &str) -> Option<&str> {
    VAR_RE
        .find(s)
        .filter(|m| m.start() == 0 && m.end() == s.len())
        .map(|m| &s[1..s.len() - 1])
}

fn exact_ref(s: &str) -> Option<(&str, &str)> {
    REF_RE
        .find(s)
        .filter(|m| m.start() == 0 && m.end() == s.len())
        .and_then(|_| s[1..s.len() - 1].split_once(':'))
}

/// Value a `#table:sqlId#` reference resolves to: the first executed
/// statement with that table and id supplies `lastId` if set, else its
/// result rows. Unknown or not-yet-executed targets give `Null`.
pub fn reference_value(table: &str, sql_id: &str, executed: &[Statement]) -> SqlValue {
    for stmt in executed {
        if stmt.executed && stmt.table == table && stmt.sql_id == sql_id {
            return match &stmt.last_id {
                Some(id) if !id.is_null() => id.clone(),
                _ => SqlValue::Array(
                    stmt.results
                        .iter()
                        .map(|row| SqlValue::Object(row.iter().cloned().collect()))
                        .collect(),
                ),
            };
        }
    }
    SqlValue::Null
}

/// Apply placeholder substitution to one value.
pub fn substitute(
    value: &SqlValue,
    variables: &HashMap<String, SqlValue>,
    executed: &[Statement],
) -> SqlValue {
    match value {
        SqlValue::Raw(s) => SqlValue::Raw(substitute_str(s, variables, executed)),
        SqlValue::Array(items) => SqlValue::Array(
            items
                .iter()
                .map(|item| substitute(item, variables, executed))
                .collect(),
        ),
        SqlValue::Text(s) => {
            if let Some(name) = exact_var(s) {
                return variables.get(name).cloned().unwrap_or(SqlValue::Null);
            }
            if let Some((table, id)) = exact_ref(s) {
                return reference_value(table, id, executed);
            }
            if contains_placeholder(s) {
                SqlValue::Text(substitute_str(s, variables, executed))
            } else {
                value.clone()
            }
        }
        _ => value.clone(),
    }
}

/// In-place substitution of every placeholder occurrence inside a string,
/// stringifying the bound values (`null` on missing).
pub fn substitute_str(
    s: &str,
    variables: &HashMap<String, SqlValue>,
    executed: &[Statement],
) -> String {
    let pass = VAR_RE.replace_all(s, |caps: &regex::Captures| {
        let whole = &caps[0];
        let name = &whole[1..whole.len() - 1];
        variables
            .get(name)
            .map(|v| v.to_string())
            .unwrap_or_else(|| "null".to_string())
    });
    REF_RE
        .replace_all(&pass, |caps: &regex::Captures| {
            let whole = &caps[0];
            let inner = &whole[1..whole.len() - 1];
            match inner.split_once(':') {
                Some((table, id)) => reference_value(table, id, executed).to_string(),
                None => "null".to_string(),
            }
        })
        .into_owned()
}

/// Decide the logical "last inserted id" for an executed statement.
///
/// The driver-reported id wins when it is a non-zero number or non-empty
/// string. Otherwise the first `returnColumns` entry nominates a column
/// whose value (substituted, then raw) is coerced to an integer; raw
/// fragments additionally support single `a + b` / `a - b` arithmetic, which
/// is how chains thread computed ids forward.
pub fn resolve_insert_id(
    driver_id: Option<&SqlValue>,
    stmt: &Statement,
    values_named: &[(String, SqlValue)],
    executed: &[Statement],
) -> Option<SqlValue> {
    if let Some(id) = driver_id {
        let usable = match id {
            SqlValue::Int(i) => *i != 0,
            SqlValue::UInt(u) => *u != 0,
            SqlValue::Float(f) => *f != 0.0,
            SqlValue::Text(s) => !s.is_empty(),
            _ => false,
        };
        if usable {
            return Some(id.clone());
        }
    }

    let (column, _) = stmt.return_columns.first()?;
    let value = values_named
        .iter()
        .find(|(c, _)| c == column)
        .map(|(_, v)| v)
        .or_else(|| {
            stmt.parameters
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, v)| v)
        })?;
    coerce_id(value, stmt, executed)
}

fn coerce_id(value: &SqlValue, stmt: &Statement, executed: &[Statement]) -> Option<SqlValue> {
    match value {
        SqlValue::Int(_) | SqlValue::UInt(_) => Some(value.clone()),
        SqlValue::Raw(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Some(SqlValue::Int(i));
            }
            let substituted = substitute_str(s, &stmt.variables_map(), executed);
            let substituted = substituted.trim();
            let caps = ARITH_RE.captures(substituted)?;
            let left: i64 = caps[1].parse().ok()?;
            let right: i64 = caps[3].parse().ok()?;
            Some(SqlValue::Int(if &caps[2] == "+" {
                left + right
            } else {
                left - right
            }))
        }
        SqlValue::Array(items) => items
            .first()
            .and_then(|first| coerce_id(first, stmt, executed)),
        SqlValue::Text(s) => s.trim().parse::<i64>().ok().map(SqlValue::Int),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Statement;

    fn executed_insert(table: &str, sql_id: &str, last_id: Option<i64>) -> Statement {
        let mut stmt = Statement::insert(sql_id, table).param("x", 1i64);
        stmt.executed = true;
        stmt.last_id = last_id.map(SqlValue::Int);
        stmt.results = vec![vec![("id".to_string(), SqlValue::Int(9))]];
        stmt
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(contains_placeholder("%SYS_USER%"));
        assert!(contains_placeholder("#order:11#"));
        assert!(contains_placeholder("x #order:11# y"));
        assert!(!contains_placeholder("100% sure"));
        assert!(!contains_placeholder("plain"));
        assert!(!contains_placeholder("a # b : c"));
    }

    #[test]
    fn test_value_has_placeholder_descends() {
        assert!(value_has_placeholder(&SqlValue::Raw("#a:1# + 10".into())));
        assert!(value_has_placeholder(&SqlValue::Array(vec![
            SqlValue::Int(1),
            SqlValue::Text("%X%".into()),
        ])));
        assert!(!value_has_placeholder(&SqlValue::Int(5)));
    }

    #[test]
    fn test_exact_variable_keeps_type() {
        let mut vars = HashMap::new();
        vars.insert("TAB_NUMBER".to_string(), SqlValue::Int(301));
        vars.insert("NOTHING".to_string(), SqlValue::Null);

        let v = substitute(&SqlValue::Text("%TAB_NUMBER%".into()), &vars, &[]);
        assert_eq!(v, SqlValue::Int(301));

        let v = substitute(&SqlValue::Text("%NOTHING%".into()), &vars, &[]);
        assert_eq!(v, SqlValue::Null);

        // Unbound names resolve to Null as well.
        let v = substitute(&SqlValue::Text("%MISSING%".into()), &vars, &[]);
        assert_eq!(v, SqlValue::Null);
    }

    #[test]
    fn test_exact_backref_prefers_last_id() {
        let chain = vec![executed_insert("order", "11", Some(101))];
        let v = substitute(&SqlValue::Text("#order:11#".into()), &HashMap::new(), &chain);
        assert_eq!(v, SqlValue::Int(101));
    }

    #[test]
    fn test_exact_backref_falls_back_to_results() {
        let chain = vec![executed_insert("order", "11", None)];
        let v = substitute(&SqlValue::Text("#order:11#".into()), &HashMap::new(), &chain);
        match v {
            SqlValue::Array(rows) => assert_eq!(rows.len(), 1),
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_reference_is_null() {
        let mut not_run = executed_insert("order", "11", Some(101));
        not_run.executed = false;
        let chain = vec![not_run];
        let v = substitute(&SqlValue::Text("#order:11#".into()), &HashMap::new(), &chain);
        assert_eq!(v, SqlValue::Null);
    }

    #[test]
    fn test_in_string_substitution() {
        let mut vars = HashMap::new();
        vars.insert("SYS_USER".to_string(), SqlValue::Text("u10".into()));
        let chain = vec![executed_insert("order", "11", Some(101))];

        let v = substitute(
            &SqlValue::Text("by %SYS_USER% for #order:11#".into()),
            &vars,
            &chain,
        );
        assert_eq!(v, SqlValue::Text("by u10 for 101".into()));

        let v = substitute(
            &SqlValue::Raw("#order:11# + 10".into()),
            &vars,
            &chain,
        );
        assert_eq!(v, SqlValue::Raw("101 + 10".into()));
    }

    #[test]
    fn test_resolve_insert_id_driver_wins() {
        let stmt = Statement::insert("5", "t").returning("id", None);
        let id = resolve_insert_id(Some(&SqlValue::Int(42)), &stmt, &[], &[]);
        assert_eq!(id, Some(SqlValue::Int(42)));
        let id = resolve_insert_id(Some(&SqlValue::Text("abc".into())), &stmt, &[], &[]);
        assert_eq!(id, Some(SqlValue::Text("abc".into())));
    }

    #[test]
    fn test_resolve_insert_id_zero_driver_falls_through() {
        let stmt = Statement::insert("5", "t")
            .param("num", 77i64)
            .returning("num", None);
        let named = vec![("num".to_string(), SqlValue::Int(77))];
        let id = resolve_insert_id(Some(&SqlValue::Int(0)), &stmt, &named, &[]);
        assert_eq!(id, Some(SqlValue::Int(77)));
    }

    #[test]
    fn test_resolve_insert_id_arithmetic() {
        let chain = vec![executed_insert("order", "11", Some(101))];
        let stmt = Statement::insert("12", "order_ref")
            .param("next_order", SqlValue::Raw("#order:11# + 10".into()))
            .returning("next_order", None);
        let named = vec![(
            "next_order".to_string(),
            SqlValue::Raw("101 + 10".into()),
        )];
        let id = resolve_insert_id(Some(&SqlValue::Int(0)), &stmt, &named, &chain);
        assert_eq!(id, Some(SqlValue::Int(111)));
    }

    #[test]
    fn test_resolve_insert_id_garbage_is_none() {
        let stmt = Statement::insert("5", "t")
            .param("name", "Water")
            .returning("name", None);
        let named = vec![("name".to_string(), SqlValue::Text("Water".into()))];
        assert_eq!(resolve_insert_id(None, &stmt, &named, &[]), None);
    }

    #[test]
    fn test_resolve_insert_id_no_return_columns() {
        let stmt = Statement::insert("5", "t").param("x", 1i64);
        assert_eq!(resolve_insert_id(Some(&SqlValue::Int(0)), &stmt, &[], &[]), None);
    }
}
