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

//! RelayDB Core
//!
//! Declarative SQL statements, compiled to dialect-specific text.
//!
//! A client describes *what* should run (table, statement kind, ordered
//! parameters, a predicate tree, projection, ordering), serializes that
//! description to a portable JSON document, and ships it to an executor.
//! This crate is the portable half: the statement model, its JSON-stable
//! codec, the `%NAME%` / `#table:sqlId#` placeholder resolver, and the
//! renderer that turns an abstract statement into SQL text for a concrete
//! dialect.
//!
//! # Example
//!
//! ```rust,ignore
//! use relaydb_core::{Condition, Dialect, Statement, render};
//!
//! let stmt = Statement::select("%SYS_USER%", "user")
//!     .returning("user_id", Some("id"))
//!     .where_clause(Condition::compare("id", ">", 0i64))
//!     .order_by(">user_id")
//!     .limit(1);
//! let rendered = render(&stmt, &Dialect::mysql(), &[])?;
//! ```

pub mod codec;
pub mod condition;
pub mod dialect;
pub mod document;
pub mod error;
pub mod render;
pub mod resolve;
pub mod statement;
pub mod value;

pub use condition::Condition;
pub use dialect::Dialect;
pub use document::{Credentials, DbCommand};
pub use error::{CoreError, Result};
pub use render::{render, sql_literal, RenderedStatement};
pub use resolve::{
    contains_placeholder, placeholder_names, reference_value, resolve_insert_id, substitute,
    value_has_placeholder,
};
pub use statement::{Statement, StatementKind};
pub use value::{row_value, Row, SqlValue, DATETIME_FORMAT};
