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

//! Abstract statement model
//!
//! A `Statement` describes one SQL statement declaratively: table, kind,
//! ordered parameters, predicate tree, projection, ordering, and limit.
//! Statements are built from a chain document (or in code via the builder
//! methods) and mutated only by the chain executor, which fills the result
//! slots after execution so later statements can reference them.
//!
//! A statement whose `sqlId` has the shape `%NAME%` is a *variable-producing
//! statement*: it never runs in the main pass, only on demand during the
//! binding pass, and its first result column supplies the variable `NAME`.

use crate::codec;
use crate::condition::Condition;
use crate::error::{CoreError, Result};
use crate::resolve;
use crate::value::{Row, SqlValue};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

/// The four statement kinds the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(StatementKind::Select),
            "INSERT" => Ok(StatementKind::Insert),
            "UPDATE" => Ok(StatementKind::Update),
            "DELETE" => Ok(StatementKind::Delete),
            other => Err(CoreError::Document(format!(
                "unknown statement type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One declaratively-described SQL statement plus its execution slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Identifier unique within a chain. Shape `%NAME%` marks a
    /// variable-producing statement.
    pub sql_id: String,
    /// Unquoted table name.
    pub table: String,
    pub kind: StatementKind,
    /// `column -> value`, in document order. Order is the column-list order
    /// for INSERT and the assignment order for UPDATE.
    pub parameters: Vec<(String, SqlValue)>,
    /// WHERE tree.
    pub predicate: Option<Condition>,
    /// `column -> alias` projection; also nominates the INSERT id column.
    pub return_columns: Vec<(String, Option<String>)>,
    /// Leading `>` means DESC, leading `<` means ASC, bare means ASC.
    pub order_by: Option<String>,
    pub limit: Option<u64>,
    /// Placeholder bindings this statement needs before rendering.
    /// `Null` marks a name that is declared but not yet resolved.
    pub variables: Vec<(String, SqlValue)>,
    pub return_last_id: bool,

    // Execution slots, filled by the chain executor.
    pub results: Vec<Row>,
    pub last_id: Option<SqlValue>,
    pub executed: bool,
    pub rendered_sql: Option<String>,
}

impl Statement {
    pub fn new(sql_id: impl Into<String>, table: impl Into<String>, kind: StatementKind) -> Self {
        Self {
            sql_id: sql_id.into(),
            table: table.into(),
            kind,
            parameters: Vec::new(),
            predicate: None,
            return_columns: Vec::new(),
            order_by: None,
            limit: None,
            variables: Vec::new(),
            return_last_id: false,
            results: Vec::new(),
            last_id: None,
            executed: false,
            rendered_sql: None,
        }
    }

    pub fn select(sql_id: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(sql_id, table, StatementKind::Select)
    }

    pub fn insert(sql_id: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(sql_id, table, StatementKind::Insert)
    }

    pub fn update(sql_id: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(sql_id, table, StatementKind::Update)
    }

    pub fn delete(sql_id: impl Into<String>, table: impl Into<String>) -> Self {
        Self::new(sql_id, table, StatementKind::Delete)
    }

    /// Append a parameter.
    pub fn param(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.parameters.push((column.into(), value.into()));
        self
    }

    /// Set the WHERE tree.
    pub fn where_clause(mut self, condition: Condition) -> Self {
        self.predicate = Some(condition);
        self
    }

    /// Append a projection column with an optional alias.
    pub fn returning(mut self, column: impl Into<String>, alias: Option<&str>) -> Self {
        self.return_columns
            .push((column.into(), alias.map(|a| a.to_string())));
        self
    }

    pub fn order_by(mut self, spec: impl Into<String>) -> Self {
        self.order_by = Some(spec.into());
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Declare a placeholder this statement needs, optionally pre-bound.
    pub fn variable(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.variables.push((name.into(), value));
        self
    }

    pub fn returns_last_id(mut self, yes: bool) -> Self {
        self.return_last_id = yes;
        self
    }

    /// True when `sqlId` has the `%NAME%` shape.
    pub fn is_variable_statement(&self) -> bool {
        self.sql_id.len() >= 3 && self.sql_id.starts_with('%') && self.sql_id.ends_with('%')
    }

    /// The variable name supplied by this statement, if it is one.
    pub fn variable_name(&self) -> Option<&str> {
        if self.is_variable_statement() {
            Some(&self.sql_id[1..self.sql_id.len() - 1])
        } else {
            None
        }
    }

    /// Placeholder names this statement needs bound before rendering: the
    /// declared `variables` plus every `%NAME%` appearing in the predicate
    /// or in parameter values, in order of first appearance.
    pub fn required_variables(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, _) in &self.variables {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        if let Some(p) = &self.predicate {
            p.required_variables(&mut names);
        }
        for (_, value) in &self.parameters {
            resolve::placeholder_names(value, &mut names);
        }
        names
    }

    pub fn variable_value(&self, name: &str) -> Option<&SqlValue> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Bind a variable, replacing any earlier binding of the same name.
    pub fn set_variable(&mut self, name: &str, value: SqlValue) {
        if let Some(slot) = self.variables.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.variables.push((name.to_string(), value));
        }
    }

    /// Bindings as a lookup map for rendering.
    pub fn variables_map(&self) -> HashMap<String, SqlValue> {
        self.variables.iter().cloned().collect()
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.results.first()
    }

    /// Values of one result column across all rows.
    pub fn column_values(&self, column: &str) -> Vec<SqlValue> {
        self.results
            .iter()
            .filter_map(|row| crate::value::row_value(row, column).cloned())
            .collect()
    }

    /// Short form for log lines.
    pub fn describe(&self) -> String {
        format!("{} {} ({})", self.kind, self.table, self.sql_id)
    }

    /// Serialize to the chain-document JSON shape. Result slots are not
    /// part of the document and are dropped.
    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::new();
        map.insert("sqlID".into(), JsonValue::from(self.sql_id.clone()));
        map.insert("table".into(), JsonValue::from(self.table.clone()));
        map.insert("type".into(), JsonValue::from(self.kind.as_str()));
        map.insert(
            "where".into(),
            self.predicate
                .as_ref()
                .map(Condition::to_json)
                .unwrap_or(JsonValue::Null),
        );
        let mut cols = JsonMap::new();
        for (col, alias) in &self.return_columns {
            cols.insert(
                col.clone(),
                alias
                    .as_ref()
                    .map(|a| JsonValue::from(a.clone()))
                    .unwrap_or(JsonValue::Null),
            );
        }
        map.insert("returnColumns".into(), JsonValue::Object(cols));
        map.insert("returnLastID".into(), JsonValue::from(self.return_last_id));
        map.insert(
            "orderBy".into(),
            self.order_by
                .as_ref()
                .map(|o| JsonValue::from(o.clone()))
                .unwrap_or(JsonValue::Null),
        );
        map.insert(
            "limit".into(),
            self.limit.map(JsonValue::from).unwrap_or(JsonValue::Null),
        );
        let mut params = JsonMap::new();
        for (col, value) in &self.parameters {
            params.insert(col.clone(), codec::encode(value));
        }
        map.insert("parameters".into(), JsonValue::Object(params));
        let mut vars = JsonMap::new();
        for (name, value) in &self.variables {
            vars.insert(name.clone(), codec::encode(value));
        }
        map.insert("variables".into(), JsonValue::Object(vars));
        JsonValue::Object(map)
    }

    /// Decode from the chain-document JSON shape.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| CoreError::Document("statement must be an object".into()))?;

        let sql_id = map
            .get("sqlID")
            .or_else(|| map.get("sqlId"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CoreError::Document("statement is missing 'sqlID'".into()))?;
        let table = map
            .get("table")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CoreError::Document("statement is missing 'table'".into()))?;
        let kind = map
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CoreError::Document("statement is missing 'type'".into()))
            .and_then(StatementKind::parse)?;

        let mut stmt = Statement::new(sql_id, table, kind);

        match map.get("where") {
            None | Some(JsonValue::Null) => {}
            Some(cond) => stmt.predicate = Some(Condition::from_json(cond)?),
        }

        if let Some(cols) = map.get("returnColumns").and_then(JsonValue::as_object) {
            for (col, alias) in cols {
                let alias = alias.as_str().map(|a| a.to_string());
                stmt.return_columns.push((col.clone(), alias));
            }
        }

        stmt.return_last_id = map
            .get("returnLastID")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        stmt.order_by = map
            .get("orderBy")
            .and_then(JsonValue::as_str)
            .map(|o| o.to_string());
        stmt.limit = map.get("limit").and_then(JsonValue::as_u64);

        if let Some(params) = map.get("parameters").and_then(JsonValue::as_object) {
            for (col, value) in params {
                stmt.parameters.push((col.clone(), codec::decode(value)));
            }
        }
        if let Some(vars) = map.get("variables").and_then(JsonValue::as_object) {
            for (name, value) in vars {
                stmt.variables.push((name.clone(), codec::decode(value)));
            }
        }

        Ok(stmt)
    }
}
