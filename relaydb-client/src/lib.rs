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

//! RelayDB Client
//!
//! Transactional execution of declarative SQL chains.
//!
//! A chain (`DbCommand`) is executed as one transaction on one connection:
//! variable-producing statements run on demand during the binding pass,
//! the remaining statements run in declaration order, and the whole chain
//! commits or rolls back as a unit. Connections come from providers
//! registered per `software` string; a bounded pool and a retrying factory
//! wrapper are provided for long-lived deployments.
//!
//! Concrete driver bindings live outside this crate; the executor only
//! consumes the `Connection` trait. `MockConnection` implements it in
//! memory for tests and dry runs.

pub mod command_set;
pub mod connection;
pub mod error;
pub mod executor;
pub mod logger;
pub mod mock;
pub mod pool;
pub mod registry;

pub use command_set::CommandSet;
pub use connection::{Connection, ConnectionProvider, ExecOutcome, RetryingProvider};
pub use error::{ClientError, Result};
pub use executor::{ChainExecutor, Overrides};
pub use logger::{ChainLogger, LogEntry, MemoryLogger, TracingLogger};
pub use mock::{Journal, MockConnection, MockProvider, MockScript};
pub use pool::ConnectionPool;
pub use registry::{provider_for, register_provider};

// The portable half of the system, re-exported for convenience.
pub use relaydb_core::{
    Condition, Credentials, DbCommand, Dialect, Row, SqlValue, Statement, StatementKind,
};
