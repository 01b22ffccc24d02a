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

//! Connection contract
//!
//! The executor consumes connections only through these traits; concrete
//! driver bindings live outside the crate. `begin`/`commit`/`rollback`
//! report failure by returning `false`, and a failed statement is a `None`
//! from `execute_raw`; neither panics nor throws.

use relaydb_core::{Credentials, Dialect, Row, SqlValue};
use std::thread;
use std::time::Duration;

/// What one executed statement produced.
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    /// Result rows, if the statement returns any.
    pub results: Option<Vec<Row>>,
    /// Driver-reported insert id, if any.
    pub last_id: Option<SqlValue>,
}

impl ExecOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            results: Some(rows),
            last_id: None,
        }
    }

    pub fn with_last_id(id: SqlValue) -> Self {
        Self {
            results: None,
            last_id: Some(id),
        }
    }
}

/// One open database connection. A chain holds exactly one for its whole
/// lifetime; all calls are strictly serial.
pub trait Connection {
    fn begin(&mut self) -> bool;
    fn commit(&mut self) -> bool;
    fn rollback(&mut self) -> bool;
    /// `None` means the statement itself failed.
    fn execute_raw(&mut self, sql: &str) -> Option<ExecOutcome>;
    fn dialect(&self) -> Dialect;
    fn close(&mut self);
}

/// Opens connections. Registered per `software` string in the registry;
/// the executor borrows providers and never owns them.
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Option<Box<dyn Connection>>;
}

/// Decorates a provider with a bounded retry loop for the connect
/// operation. Retries live here, in the factory, not in the pool.
pub struct RetryingProvider<P> {
    inner: P,
    max_retries: u32,
    retry_interval: Duration,
}

impl<P: ConnectionProvider> RetryingProvider<P> {
    pub fn new(inner: P, max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            inner,
            max_retries,
            retry_interval,
        }
    }
}

impl<P: ConnectionProvider> ConnectionProvider for RetryingProvider<P> {
    fn connect(&self, credentials: &Credentials) -> Option<Box<dyn Connection>> {
        for attempt in 0..=self.max_retries {
            if let Some(conn) = self.inner.connect(credentials) {
                return Some(conn);
            }
            if attempt < self.max_retries {
                thread::sleep(self.retry_interval);
            }
        }
        None
    }
}
