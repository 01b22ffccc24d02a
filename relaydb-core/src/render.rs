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

//! Statement rendering
//!
//! Produces the final SQL text for a statement by composing the dialect,
//! the predicate tree, and placeholder resolution. Values are inlined into
//! the text; the ordered/named value maps on `RenderedStatement` carry the
//! substituted values for consumers that need them (insert-id resolution,
//! future driver-bound rendering).
//!
//! String and timestamp literals are single-quoted with no escaping; chain
//! documents are trusted input. See DESIGN.md.

use crate::dialect::Dialect;
use crate::error::{CoreError, Result};
use crate::resolve;
use crate::statement::{Statement, StatementKind};
use crate::value::{SqlValue, DATETIME_FORMAT};

/// A rendered statement: the SQL text plus the substituted values.
#[derive(Debug, Clone)]
pub struct RenderedStatement {
    pub sql: String,
    pub values_ordered: Vec<SqlValue>,
    pub values_named: Vec<(String, SqlValue)>,
}

/// Render one value as a SQL literal.
pub fn sql_literal(value: &SqlValue, dialect: &Dialect) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Int(_) | SqlValue::UInt(_) | SqlValue::Float(_) => value.to_string(),
        SqlValue::Text(s) => format!("'{}'", s),
        SqlValue::DateTime(t) => format!("'{}'", t.format(DATETIME_FORMAT)),
        SqlValue::Bytes(b) => dialect.render_bytes(b),
        SqlValue::Raw(s) => s.clone(),
        // A non-empty list stands for its first element, emitted verbatim.
        SqlValue::Array(items) => match items.first() {
            Some(SqlValue::Text(s)) | Some(SqlValue::Raw(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        other => other.to_string(),
    }
}

/// Render a statement into SQL text for the given dialect, resolving
/// placeholders against the statement's bound variables and the executed
/// part of the chain.
pub fn render(
    stmt: &Statement,
    dialect: &Dialect,
    executed: &[Statement],
) -> Result<RenderedStatement> {
    match stmt.kind {
        StatementKind::Insert => render_insert(stmt, dialect, executed),
        StatementKind::Update => render_update(stmt, dialect, executed),
        StatementKind::Select => render_select(stmt, dialect, executed),
        StatementKind::Delete => render_delete(stmt, dialect, executed),
    }
}

fn substituted_parameters(
    stmt: &Statement,
    executed: &[Statement],
) -> Vec<(String, SqlValue)> {
    let variables = stmt.variables_map();
    stmt.parameters
        .iter()
        .map(|(column, value)| {
            (
                column.clone(),
                resolve::substitute(value, &variables, executed),
            )
        })
        .collect()
}

fn render_insert(
    stmt: &Statement,
    dialect: &Dialect,
    executed: &[Statement],
) -> Result<RenderedStatement> {
    if stmt.parameters.is_empty() {
        return Err(CoreError::EmptyParameters {
            kind: stmt.kind,
            table: stmt.table.clone(),
        });
    }
    let values_named = substituted_parameters(stmt, executed);
    let columns: Vec<String> = values_named
        .iter()
        .map(|(c, _)| dialect.quote_ident(c))
        .collect();
    let literals: Vec<String> = values_named
        .iter()
        .map(|(_, v)| sql_literal(v, dialect))
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_ident(&stmt.table),
        columns.join(" , "),
        literals.join(" , "),
    );
    Ok(RenderedStatement {
        sql,
        values_ordered: values_named.iter().map(|(_, v)| v.clone()).collect(),
        values_named,
    })
}

fn render_update(
    stmt: &Statement,
    dialect: &Dialect,
    executed: &[Statement],
) -> Result<RenderedStatement> {
    if stmt.parameters.is_empty() {
        return Err(CoreError::EmptyParameters {
            kind: stmt.kind,
            table: stmt.table.clone(),
        });
    }
    let where_sql = build_where(stmt, dialect, executed);
    if where_sql.is_empty() {
        return Err(CoreError::EmptyPredicate {
            table: stmt.table.clone(),
        });
    }
    let values_named = substituted_parameters(stmt, executed);
    let assignments: Vec<String> = values_named
        .iter()
        .map(|(c, v)| format!("{} = {}", dialect.quote_ident(c), sql_literal(v, dialect)))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        dialect.quote_ident(&stmt.table),
        assignments.join(" , "),
        where_sql,
    );
    Ok(RenderedStatement {
        sql,
        values_ordered: values_named.iter().map(|(_, v)| v.clone()).collect(),
        values_named,
    })
}

fn render_select(
    stmt: &Statement,
    dialect: &Dialect,
    executed: &[Statement],
) -> Result<RenderedStatement> {
    let columns = if stmt.return_columns.is_empty() {
        "*".to_string()
    } else {
        stmt.return_columns
            .iter()
            .map(|(column, alias)| match alias {
                Some(a) => format!("{} as {}", dialect.quote_ident(column), dialect.quote_ident(a)),
                None => dialect.quote_ident(column),
            })
            .collect::<Vec<_>>()
            .join(" , ")
    };
    let mut sql = format!("SELECT {} FROM {}", columns, dialect.quote_ident(&stmt.table));
    let where_sql = build_where(stmt, dialect, executed);
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    push_order_and_limit(stmt, dialect, &mut sql);
    Ok(RenderedStatement {
        sql,
        values_ordered: Vec::new(),
        values_named: Vec::new(),
    })
}

fn render_delete(
    stmt: &Statement,
    dialect: &Dialect,
    executed: &[Statement],
) -> Result<RenderedStatement> {
    let mut sql = format!("DELETE FROM {}", dialect.quote_ident(&stmt.table));
    let where_sql = build_where(stmt, dialect, executed);
    if !where_sql.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }
    push_order_and_limit(stmt, dialect, &mut sql);
    Ok(RenderedStatement {
        sql,
        values_ordered: Vec::new(),
        values_named: Vec::new(),
    })
}

fn build_where(stmt: &Statement, dialect: &Dialect, executed: &[Statement]) -> String {
    match &stmt.predicate {
        Some(condition) => condition.build(dialect, &stmt.variables_map(), executed),
        None => String::new(),
    }
}

/// `>col` orders descending, `<col` and bare `col` ascending. LIMIT is
/// emitted for positive values only.
fn push_order_and_limit(stmt: &Statement, dialect: &Dialect, sql: &mut String) {
    if let Some(spec) = stmt.order_by.as_deref() {
        let (column, descending) = match spec.strip_prefix('>') {
            Some(rest) => (rest, true),
            None => (spec.strip_prefix('<').unwrap_or(spec), false),
        };
        if !column.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&dialect.quote_ident(column));
            if descending {
                sql.push_str(" DESC");
            }
        }
    }
    if let Some(n) = stmt.limit {
        if n > 0 {
            sql.push_str(&format!(" LIMIT {}", n));
        }
    }
}
