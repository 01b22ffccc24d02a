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

//! Scripted connection for tests and standalone dry runs
//!
//! `MockConnection` answers SELECTs from per-table scripted rows and hands
//! out auto-incrementing insert ids (with per-table overrides), while
//! journaling every SQL text it receives. `MockProvider` mints such
//! connections and shares the journal, so a test can assert on what ran
//! after the chain finishes.

use crate::connection::{Connection, ConnectionProvider, ExecOutcome};
use parking_lot::Mutex;
use relaydb_core::{Credentials, Dialect, Row, SqlValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Scripted behavior for a mock connection.
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Rows returned for SELECTs, keyed by table.
    pub select_rows: HashMap<String, Vec<Row>>,
    /// Fixed insert ids per table; tables absent here use the auto counter.
    pub insert_ids: HashMap<String, i64>,
    /// First value of the auto-incrementing insert id counter.
    pub first_insert_id: i64,
    pub fail_begin: bool,
    pub fail_commit: bool,
    /// Fail the nth `execute_raw` call (0-based, counted in the journal).
    pub fail_execute_at: Option<usize>,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            select_rows: HashMap::new(),
            insert_ids: HashMap::new(),
            first_insert_id: 101,
            fail_begin: false,
            fail_commit: false,
            fail_execute_at: None,
        }
    }
}

impl MockScript {
    pub fn rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.select_rows.insert(table.to_string(), rows);
        self
    }

    /// One single-column row, the common shape of variable SELECT answers.
    pub fn single(self, table: &str, column: &str, value: SqlValue) -> Self {
        self.rows(table, vec![vec![(column.to_string(), value)]])
    }

    pub fn insert_id(mut self, table: &str, id: i64) -> Self {
        self.insert_ids.insert(table.to_string(), id);
        self
    }
}

/// Everything the mock observed, shared between provider and connections.
#[derive(Debug, Default)]
pub struct Journal {
    pub executed: Vec<String>,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub closes: usize,
}

/// Scripted in-memory connection.
pub struct MockConnection {
    script: MockScript,
    dialect: Dialect,
    next_id: i64,
    journal: Arc<Mutex<Journal>>,
}

impl MockConnection {
    pub fn new(script: MockScript) -> Self {
        let first = script.first_insert_id;
        Self {
            script,
            dialect: Dialect::generic(),
            next_id: first,
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    fn with_journal(mut self, journal: Arc<Mutex<Journal>>) -> Self {
        self.journal = journal;
        self
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }

    pub fn executed(&self) -> Vec<String> {
        self.journal.lock().executed.clone()
    }
}

/// Table a rendered statement targets: the token after FROM/INTO/UPDATE,
/// stripped of identifier quotes.
fn target_table(sql: &str) -> Option<String> {
    let tokens: Vec<&str> = sql.split_whitespace().collect();
    let keyword = tokens
        .iter()
        .position(|t| matches!(*t, "FROM" | "INTO" | "UPDATE"))?;
    tokens
        .get(keyword + 1)
        .map(|t| t.trim_matches(|c| c == '`' || c == '"').to_string())
}

impl Connection for MockConnection {
    fn begin(&mut self) -> bool {
        if self.script.fail_begin {
            return false;
        }
        self.journal.lock().begins += 1;
        true
    }

    fn commit(&mut self) -> bool {
        if self.script.fail_commit {
            return false;
        }
        self.journal.lock().commits += 1;
        true
    }

    fn rollback(&mut self) -> bool {
        self.journal.lock().rollbacks += 1;
        true
    }

    fn execute_raw(&mut self, sql: &str) -> Option<ExecOutcome> {
        let position = {
            let mut journal = self.journal.lock();
            journal.executed.push(sql.to_string());
            journal.executed.len() - 1
        };
        if self.script.fail_execute_at == Some(position) {
            return None;
        }

        let table = target_table(sql).unwrap_or_default();
        if sql.starts_with("SELECT") {
            let rows = self
                .script
                .select_rows
                .get(&table)
                .cloned()
                .unwrap_or_default();
            return Some(ExecOutcome::with_rows(rows));
        }
        if sql.starts_with("INSERT") {
            let id = match self.script.insert_ids.get(&table) {
                Some(fixed) => *fixed,
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    id
                }
            };
            return Some(ExecOutcome::with_last_id(SqlValue::Int(id)));
        }
        Some(ExecOutcome::empty())
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn close(&mut self) {
        self.journal.lock().closes += 1;
    }
}

/// Provider minting scripted connections that share one journal.
pub struct MockProvider {
    script: MockScript,
    dialect: Dialect,
    journal: Arc<Mutex<Journal>>,
    fail_connect: bool,
}

impl MockProvider {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            dialect: Dialect::generic(),
            journal: Arc::new(Mutex::new(Journal::default())),
            fail_connect: false,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn failing() -> Self {
        let mut provider = Self::new(MockScript::default());
        provider.fail_connect = true;
        provider
    }

    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }
}

impl ConnectionProvider for MockProvider {
    fn connect(&self, _credentials: &Credentials) -> Option<Box<dyn Connection>> {
        if self.fail_connect {
            return None;
        }
        Some(Box::new(
            MockConnection::new(self.script.clone())
                .with_dialect(self.dialect)
                .with_journal(Arc::clone(&self.journal)),
        ))
    }
}
