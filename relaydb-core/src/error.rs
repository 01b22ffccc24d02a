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

//! Error types for statement building and document decoding

use crate::statement::StatementKind;
use thiserror::Error;

/// Errors raised while building SQL text or decoding a chain document.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// INSERT/UPDATE with no parameters cannot be rendered.
    #[error("{kind} on {table} requires at least one parameter")]
    EmptyParameters { kind: StatementKind, table: String },

    /// UPDATE whose WHERE renders empty would touch every row.
    #[error("UPDATE on {table} requires a non-empty WHERE clause")]
    EmptyPredicate { table: String },

    /// Malformed chain document.
    #[error("Invalid chain document: {0}")]
    Document(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
