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

//! Connection pool
//!
//! A bounded channel of idle connections. Checkout is FIFO: the oldest idle
//! connection is handed out first, and a fresh one is opened when none are
//! idle. Release returns the connection to the channel if there is room,
//! otherwise closes it. Connect retries belong to the provider
//! (`RetryingProvider`), not here.

use crate::connection::{Connection, ConnectionProvider};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use relaydb_core::Credentials;
use std::sync::Arc;

pub struct ConnectionPool {
    provider: Arc<dyn ConnectionProvider>,
    credentials: Credentials,
    idle_tx: Sender<Box<dyn Connection>>,
    idle_rx: Receiver<Box<dyn Connection>>,
}

impl ConnectionPool {
    pub fn new(
        provider: Arc<dyn ConnectionProvider>,
        credentials: Credentials,
        max_connections: usize,
    ) -> Self {
        let (idle_tx, idle_rx) = bounded(max_connections);
        Self {
            provider,
            credentials,
            idle_tx,
            idle_rx,
        }
    }

    /// Oldest idle connection, or a freshly opened one. `None` when the
    /// provider cannot connect.
    pub fn acquire(&self) -> Option<Box<dyn Connection>> {
        match self.idle_rx.try_recv() {
            Ok(conn) => Some(conn),
            Err(_) => self.provider.connect(&self.credentials),
        }
    }

    /// Return a connection to the pool; closes it when the pool is full.
    pub fn release(&self, conn: Box<dyn Connection>) {
        match self.idle_tx.try_send(conn) {
            Ok(()) => {}
            Err(TrySendError::Full(mut conn)) | Err(TrySendError::Disconnected(mut conn)) => {
                conn.close();
            }
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle_rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, MockScript};

    #[test]
    fn test_acquire_release_reuses() {
        let provider = Arc::new(MockProvider::new(MockScript::default()));
        let pool = ConnectionPool::new(provider, Credentials::default(), 2);

        let conn = pool.acquire().unwrap();
        assert_eq!(pool.idle_count(), 0);
        pool.release(conn);
        assert_eq!(pool.idle_count(), 1);

        // The idle connection is handed back out instead of a fresh one.
        let _conn = pool.acquire().unwrap();
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_release_over_capacity_closes() {
        let provider = Arc::new(MockProvider::new(MockScript::default()));
        let journal = provider.journal();
        let pool = ConnectionPool::new(provider.clone(), Credentials::default(), 1);

        let first = pool.acquire().unwrap();
        let second = pool.acquire().unwrap();
        pool.release(first);
        pool.release(second);

        assert_eq!(pool.idle_count(), 1);
        assert_eq!(journal.lock().closes, 1);
    }

    #[test]
    fn test_acquire_fails_when_provider_cannot_connect() {
        let pool = ConnectionPool::new(
            Arc::new(MockProvider::failing()),
            Credentials::default(),
            1,
        );
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn test_fifo_checkout() {
        let provider = Arc::new(MockProvider::new(MockScript::default()));
        let pool = ConnectionPool::new(provider, Credentials::default(), 2);

        let mut first = pool.acquire().unwrap();
        first.execute_raw("SELECT * FROM `a`");
        let second = pool.acquire().unwrap();
        pool.release(first);
        pool.release(second);

        // Oldest released connection comes back first.
        let mut reused = pool.acquire().unwrap();
        reused.execute_raw("SELECT * FROM `b`");
        assert_eq!(pool.idle_count(), 1);
    }
}
