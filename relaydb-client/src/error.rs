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

//! Error types for chain execution

use relaydb_core::CoreError;
use thiserror::Error;

/// Chain execution errors. Soft cases (unknown command id, unresolved
/// variable) are not errors; they are logged and reported through the
/// boolean API surface.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No connection could be opened.
    #[error("Can't open DB: {0}")]
    Connect(String),

    /// `begin` or `commit` reported failure.
    #[error("Transaction {op} failed")]
    Transaction { op: &'static str },

    /// `executeRaw` reported statement failure.
    #[error("SQL execution failed: {0}")]
    Execute(String),

    /// Statement could not be rendered.
    #[error(transparent)]
    Build(#[from] CoreError),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
