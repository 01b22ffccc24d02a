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

//! Command set, the host surface
//!
//! A `CommandSet` owns named chains and exposes the operations embedded
//! user procedures call: execute a whole command, execute single statements
//! in their own transactions, and read back result slots. Missing ids are
//! soft: an info line is logged and the call reports `false`/`None`.

use crate::error::ClientError;
use crate::executor::{ChainExecutor, Overrides};
use crate::logger::{ChainLogger, TracingLogger};
use crate::registry;
use relaydb_core::{DbCommand, Row, SqlValue, Statement};
use std::sync::Arc;

pub struct CommandSet {
    commands: Vec<DbCommand>,
    executor: ChainExecutor,
    logger: Arc<dyn ChainLogger>,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self::with_logger(Arc::new(TracingLogger))
    }
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(logger: Arc<dyn ChainLogger>) -> Self {
        Self {
            commands: Vec::new(),
            executor: ChainExecutor::new(logger.clone()),
            logger,
        }
    }

    pub fn add(&mut self, command: DbCommand) {
        self.commands.push(command);
    }

    pub fn command(&self, id: &str) -> Option<&DbCommand> {
        self.commands.iter().find(|c| c.id.as_deref() == Some(id))
    }

    /// Run the whole named command as one transaction.
    pub fn execute_db_command_by_id(&mut self, id: &str, overrides: Option<&Overrides>) -> bool {
        let Some(index) = self
            .commands
            .iter()
            .position(|c| c.id.as_deref() == Some(id))
        else {
            self.logger.info(&format!("Can't find DB command '{}'", id));
            return false;
        };
        self.executor.execute(&mut self.commands[index], overrides)
    }

    /// Run one statement from whichever command owns it, in its own
    /// transaction.
    pub fn execute_sql_by_id(&mut self, sql_id: &str, overrides: Option<&Overrides>) -> bool {
        let Some(index) = self.owning_command(sql_id) else {
            self.logger.info(&format!("Can't find SQL '{}'", sql_id));
            return false;
        };
        self.execute_group(index, &[sql_id], overrides)
    }

    /// Run several statements, grouped by owning command; each group is one
    /// transaction and any failure short-circuits the remaining groups.
    pub fn execute_sqls_by_ids(&mut self, sql_ids: &[&str], overrides: Option<&Overrides>) -> bool {
        let mut groups: Vec<(usize, Vec<&str>)> = Vec::new();
        for &sql_id in sql_ids {
            let Some(index) = self.owning_command(sql_id) else {
                self.logger.info(&format!("Can't find SQL '{}'", sql_id));
                return false;
            };
            match groups.iter_mut().find(|(i, _)| *i == index) {
                Some((_, ids)) => ids.push(sql_id),
                None => groups.push((index, vec![sql_id])),
            }
        }
        for (index, ids) in groups {
            if !self.execute_group(index, &ids, overrides) {
                return false;
            }
        }
        true
    }

    /// Result rows of a previously executed statement.
    pub fn get_sql_results(&self, sql_id: &str) -> Option<&[Row]> {
        self.find_statement(sql_id).map(|s| s.results.as_slice())
    }

    /// First result row of a previously executed statement.
    pub fn get_sql_result(&self, sql_id: &str) -> Option<&Row> {
        self.find_statement(sql_id).and_then(Statement::first_row)
    }

    /// One column across all result rows.
    pub fn get_sql_results_column(&self, sql_id: &str, column: &str) -> Vec<SqlValue> {
        self.find_statement(sql_id)
            .map(|s| s.column_values(column))
            .unwrap_or_default()
    }

    /// One column of the first result row.
    pub fn get_sql_result_column(&self, sql_id: &str, column: &str) -> Option<SqlValue> {
        self.find_statement(sql_id)
            .and_then(Statement::first_row)
            .and_then(|row| relaydb_core::row_value(row, column))
            .cloned()
    }

    /// A property from the first command whose properties carry the key.
    pub fn get_property(&self, key: &str) -> Option<&SqlValue> {
        let found = self.commands.iter().find_map(|c| c.property(key));
        if found.is_none() {
            self.logger.info(&format!("Can't find property '{}'", key));
        }
        found
    }

    fn owning_command(&self, sql_id: &str) -> Option<usize> {
        self.commands
            .iter()
            .position(|c| c.statement(sql_id).is_some())
    }

    fn find_statement(&self, sql_id: &str) -> Option<&Statement> {
        let found = self.commands.iter().find_map(|c| c.statement(sql_id));
        if found.is_none() {
            self.logger.info(&format!("Can't find SQL '{}'", sql_id));
        }
        found
    }

    fn execute_group(&mut self, index: usize, sql_ids: &[&str], overrides: Option<&Overrides>) -> bool {
        let executor = &self.executor;
        let chain = &mut self.commands[index];
        let Some(provider) = registry::provider_for(&chain.software) else {
            let err = ClientError::Connect(format!(
                "{} (no provider for '{}')",
                chain.credentials.address(),
                chain.software
            ));
            self.logger.error(&err.to_string(), None);
            return false;
        };
        let Some(mut db) = provider.connect(&chain.credentials) else {
            let err = ClientError::Connect(chain.credentials.address());
            self.logger.error(&err.to_string(), None);
            return false;
        };
        let ok = executor.execute_subset(chain, db.as_mut(), sql_ids, overrides);
        db.close();
        ok
    }
}
