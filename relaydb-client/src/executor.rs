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

//! Chain executor
//!
//! Drives a chain through `begin -> resolve variables -> execute -> commit`
//! on one connection. The whole chain is one transaction: any failure rolls
//! back and the chain reports `false`; there is no partial commit.
//!
//! Variable-producing statements (`sqlId` of shape `%NAME%`) run only
//! during the binding pass, on demand, in declaration order. The main pass
//! then executes the remaining statements in declaration order, storing
//! result rows and the resolved insert id back into each statement so later
//! statements can reference them via `#table:sqlId#`.

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::logger::{ChainLogger, TracingLogger};
use crate::registry;
use relaydb_core::{render, resolve_insert_id, row_value, DbCommand, SqlValue, Statement};
use std::collections::HashMap;
use std::sync::Arc;

/// Caller-supplied variable overrides; they beat the chain's `properties`.
pub type Overrides = HashMap<String, SqlValue>;

pub struct ChainExecutor {
    logger: Arc<dyn ChainLogger>,
}

impl Default for ChainExecutor {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

impl ChainExecutor {
    pub fn new(logger: Arc<dyn ChainLogger>) -> Self {
        Self { logger }
    }

    /// Open a connection through the registry and run the whole chain.
    pub fn execute(&self, chain: &mut DbCommand, overrides: Option<&Overrides>) -> bool {
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
        let ok = self.execute_on(chain, db.as_mut(), overrides);
        db.close();
        ok
    }

    /// Run the whole chain on a caller-provided connection. The connection
    /// is borrowed, never closed here.
    pub fn execute_on(
        &self,
        chain: &mut DbCommand,
        db: &mut dyn Connection,
        overrides: Option<&Overrides>,
    ) -> bool {
        let targets: Vec<usize> = (0..chain.statements.len()).collect();
        self.run_transaction(chain, db, overrides, &targets)
    }

    /// Run only the statements with the given ids, in their own
    /// transaction. Variable statements they depend on still execute.
    pub fn execute_subset(
        &self,
        chain: &mut DbCommand,
        db: &mut dyn Connection,
        sql_ids: &[&str],
        overrides: Option<&Overrides>,
    ) -> bool {
        let targets: Vec<usize> = chain
            .statements
            .iter()
            .enumerate()
            .filter(|(_, s)| sql_ids.contains(&s.sql_id.as_str()))
            .map(|(i, _)| i)
            .collect();
        self.run_transaction(chain, db, overrides, &targets)
    }

    fn run_transaction(
        &self,
        chain: &mut DbCommand,
        db: &mut dyn Connection,
        overrides: Option<&Overrides>,
        targets: &[usize],
    ) -> bool {
        if !db.begin() {
            self.logger
                .error(&ClientError::Transaction { op: "begin" }.to_string(), None);
            return false;
        }
        self.logger.info("Started transaction");
        match self.run_statements(chain, db, overrides, targets) {
            Ok(()) => {
                let ok = db.commit();
                self.logger.info(&format!(
                    "Commit transaction: {}",
                    if ok { "OK" } else { "FAILED" }
                ));
                if !ok {
                    db.rollback();
                }
                ok
            }
            Err(e) => {
                self.logger.error(&e.to_string(), None);
                db.rollback();
                false
            }
        }
    }

    fn run_statements(
        &self,
        chain: &mut DbCommand,
        db: &mut dyn Connection,
        overrides: Option<&Overrides>,
        targets: &[usize],
    ) -> Result<()> {
        self.resolve_variables(chain, db, overrides, targets)?;

        for &i in targets {
            if chain.statements[i].is_variable_statement() {
                continue;
            }
            let dialect = db.dialect();
            let rendered = render(&chain.statements[i], &dialect, &chain.statements)?;
            let outcome = db.execute_raw(&rendered.sql).ok_or_else(|| {
                ClientError::Execute(format!(
                    "{}: {}",
                    chain.statements[i].describe(),
                    rendered.sql
                ))
            })?;
            let last_id = resolve_insert_id(
                outcome.last_id.as_ref(),
                &chain.statements[i],
                &rendered.values_named,
                &chain.statements,
            );
            let stmt = &mut chain.statements[i];
            stmt.results = outcome.results.unwrap_or_default();
            stmt.last_id = last_id;
            stmt.executed = true;
            stmt.rendered_sql = Some(rendered.sql);
            self.logger
                .info(&format!("SQL executed: {}", stmt.describe()));
        }
        Ok(())
    }

    /// Binding pass: bind every placeholder the target statements need, in
    /// order of first appearance. Resolution order per name: a non-null
    /// pre-binding on a statement, the chain-wide map, variable SELECTs,
    /// caller overrides, chain properties. Unresolved names bind to Null,
    /// a soft outcome, not an abort.
    fn resolve_variables(
        &self,
        chain: &mut DbCommand,
        db: &mut dyn Connection,
        overrides: Option<&Overrides>,
        targets: &[usize],
    ) -> Result<()> {
        let mut names: Vec<String> = Vec::new();
        for &i in targets {
            let stmt = &chain.statements[i];
            if stmt.is_variable_statement() {
                continue;
            }
            for name in stmt.required_variables() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        for name in names {
            if !chain.resolved_variables.contains_key(&name) {
                let mut value: Option<SqlValue> = None;
                for &i in targets {
                    let stmt = &chain.statements[i];
                    if stmt.is_variable_statement() {
                        continue;
                    }
                    if let Some(bound) = stmt.variable_value(&name) {
                        if !bound.is_null() {
                            value = Some(bound.clone());
                            break;
                        }
                    }
                }
                if value.is_none() {
                    value = self.resolve_from_statements(chain, db, &name)?;
                }
                if value.is_none() {
                    value = overrides.and_then(|o| o.get(&name)).cloned();
                }
                if value.is_none() {
                    value = chain.properties.get(&name).cloned();
                }
                chain
                    .resolved_variables
                    .insert(name.clone(), value.unwrap_or(SqlValue::Null));
            }

            let bound = chain.resolved_variables[&name].clone();
            for &i in targets {
                if chain.statements[i].is_variable_statement() {
                    continue;
                }
                if chain.statements[i]
                    .required_variables()
                    .iter()
                    .any(|n| n == &name)
                {
                    chain.statements[i].set_variable(&name, bound.clone());
                }
            }
        }
        Ok(())
    }

    /// Execute every statement whose `sqlId` is `%name%`, in declaration
    /// order; the first non-null first-column value wins. A failed variable
    /// SELECT is logged and skipped; the name falls through to overrides
    /// and properties.
    fn resolve_from_statements(
        &self,
        chain: &mut DbCommand,
        db: &mut dyn Connection,
        name: &str,
    ) -> Result<Option<SqlValue>> {
        let target_id = format!("%{}%", name);
        let mut found: Option<SqlValue> = None;
        for i in 0..chain.statements.len() {
            if chain.statements[i].sql_id != target_id {
                continue;
            }
            let dialect = db.dialect();
            let rendered = render(&chain.statements[i], &dialect, &chain.statements)?;
            match db.execute_raw(&rendered.sql) {
                None => {
                    self.logger.error(
                        &format!("SQL failed for variable {}", target_id),
                        Some(&rendered.sql),
                    );
                }
                Some(outcome) => {
                    let stmt = &mut chain.statements[i];
                    stmt.results = outcome.results.unwrap_or_default();
                    stmt.last_id = outcome.last_id;
                    stmt.executed = true;
                    stmt.rendered_sql = Some(rendered.sql);
                    self.logger
                        .info(&format!("Executed SQL for variable {}", target_id));
                    if found.is_none() {
                        found = first_column_value(stmt);
                    }
                }
            }
        }
        Ok(found)
    }
}

/// First non-null value of the first result row's first column. The first
/// `returnColumns` entry (alias if set) names the column; without one, the
/// row's first column in result order is used.
fn first_column_value(stmt: &Statement) -> Option<SqlValue> {
    let row = stmt.results.first()?;
    let value = match stmt.return_columns.first() {
        Some((column, alias)) => {
            let key = alias.as_deref().unwrap_or(column);
            row_value(row, key).or_else(|| row.first().map(|(_, v)| v))
        }
        None => row.first().map(|(_, v)| v),
    }?;
    if value.is_null() {
        None
    } else {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::mock::{MockConnection, MockScript};
    use relaydb_core::Condition;

    fn logger_and_executor() -> (Arc<MemoryLogger>, ChainExecutor) {
        let logger = Arc::new(MemoryLogger::new());
        let executor = ChainExecutor::new(logger.clone());
        (logger, executor)
    }

    #[test]
    fn test_begin_failure_aborts() {
        let (logger, executor) = logger_and_executor();
        let mut script = MockScript::default();
        script.fail_begin = true;
        let mut conn = MockConnection::new(script);
        let mut chain = DbCommand::new("generic");
        chain
            .statements
            .push(Statement::insert("1", "t").param("a", 1i64));

        assert!(!executor.execute_on(&mut chain, &mut conn, None));
        assert_eq!(logger.errors(), vec!["Transaction begin failed"]);
        assert!(conn.executed().is_empty());
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let (logger, executor) = logger_and_executor();
        let mut script = MockScript::default();
        script.fail_commit = true;
        let mut conn = MockConnection::new(script);
        let journal = conn.journal();
        let mut chain = DbCommand::new("generic");
        chain
            .statements
            .push(Statement::insert("1", "t").param("a", 1i64));

        assert!(!executor.execute_on(&mut chain, &mut conn, None));
        assert!(logger
            .infos()
            .contains(&"Commit transaction: FAILED".to_string()));
        assert_eq!(journal.lock().rollbacks, 1);
    }

    #[test]
    fn test_build_error_rolls_back_and_reports() {
        let (logger, executor) = logger_and_executor();
        let mut conn = MockConnection::new(MockScript::default());
        let journal = conn.journal();
        let mut chain = DbCommand::new("generic");
        // UPDATE without WHERE is a build error.
        chain
            .statements
            .push(Statement::update("1", "t").param("a", 1i64));

        assert!(!executor.execute_on(&mut chain, &mut conn, None));
        assert_eq!(journal.lock().rollbacks, 1);
        assert_eq!(journal.lock().commits, 0);
        assert!(logger.errors()[0].contains("WHERE"));
    }

    #[test]
    fn test_overrides_beat_properties() {
        let (_, executor) = logger_and_executor();
        let mut conn = MockConnection::new(MockScript::default());
        let mut chain = DbCommand::new("generic");
        chain
            .properties
            .insert("WHO".into(), SqlValue::Text("from-properties".into()));
        chain
            .statements
            .push(Statement::insert("1", "t").param("who", "%WHO%"));

        let mut overrides = Overrides::new();
        overrides.insert("WHO".into(), SqlValue::Text("from-overrides".into()));
        assert!(executor.execute_on(&mut chain, &mut conn, Some(&overrides)));
        assert_eq!(
            conn.executed()[0],
            "INSERT INTO `t` (`who`) VALUES ('from-overrides')"
        );
        assert_eq!(
            chain.resolved_variables.get("WHO"),
            Some(&SqlValue::Text("from-overrides".into()))
        );
    }

    #[test]
    fn test_unresolved_variable_renders_null() {
        let (logger, executor) = logger_and_executor();
        let mut conn = MockConnection::new(MockScript::default());
        let mut chain = DbCommand::new("generic");
        chain
            .statements
            .push(Statement::insert("1", "t").param("who", "%NOBODY%"));

        assert!(executor.execute_on(&mut chain, &mut conn, None));
        assert_eq!(conn.executed()[0], "INSERT INTO `t` (`who`) VALUES (NULL)");
        assert!(logger.errors().is_empty());
    }

    #[test]
    fn test_unresolved_variable_in_predicate_is_null_normalized() {
        let (_, executor) = logger_and_executor();
        let mut conn = MockConnection::new(MockScript::default());
        let mut chain = DbCommand::new("generic");
        chain.statements.push(
            Statement::select("1", "t")
                .where_clause(Condition::eq("owner", SqlValue::Text("%NOBODY%".into()))),
        );

        assert!(executor.execute_on(&mut chain, &mut conn, None));
        assert_eq!(conn.executed()[0], "SELECT * FROM `t` WHERE `owner` IS NULL");
    }

    #[test]
    fn test_prebound_statement_variable_skips_select() {
        let (logger, executor) = logger_and_executor();
        let script = MockScript::default().single("user", "id", SqlValue::Text("u10".into()));
        let mut conn = MockConnection::new(script);
        let mut chain = DbCommand::new("generic");
        chain.statements.push(
            Statement::select("%SYS_USER%", "user")
                .returning("user_id", Some("id"))
                .where_clause(Condition::compare("id", ">", 0i64)),
        );
        chain.statements.push(
            Statement::insert("2", "t")
                .param("who", "%SYS_USER%")
                .variable("SYS_USER", SqlValue::Text("prebound".into())),
        );

        assert!(executor.execute_on(&mut chain, &mut conn, None));
        // Only the INSERT ran; the variable SELECT was never needed.
        assert_eq!(conn.executed().len(), 1);
        assert_eq!(
            conn.executed()[0],
            "INSERT INTO `t` (`who`) VALUES ('prebound')"
        );
        assert!(logger
            .infos()
            .iter()
            .all(|m| !m.starts_with("Executed SQL for variable")));
    }

    #[test]
    fn test_failed_variable_select_falls_back_to_properties() {
        let (logger, executor) = logger_and_executor();
        let mut script = MockScript::default();
        script.fail_execute_at = Some(0);
        let mut conn = MockConnection::new(script);
        let mut chain = DbCommand::new("generic");
        chain
            .properties
            .insert("SYS_USER".into(), SqlValue::Text("prop-user".into()));
        chain
            .statements
            .push(Statement::select("%SYS_USER%", "user").returning("user_id", Some("id")));
        chain
            .statements
            .push(Statement::insert("2", "t").param("who", "%SYS_USER%"));

        assert!(executor.execute_on(&mut chain, &mut conn, None));
        assert_eq!(
            conn.executed()[1],
            "INSERT INTO `t` (`who`) VALUES ('prop-user')"
        );
        assert_eq!(logger.errors().len(), 1);
        assert!(logger.errors()[0].starts_with("SQL failed for variable %SYS_USER%"));
    }

    #[test]
    fn test_subset_runs_only_named_statements() {
        let (_, executor) = logger_and_executor();
        let mut conn = MockConnection::new(MockScript::default());
        let mut chain = DbCommand::new("generic");
        chain
            .statements
            .push(Statement::insert("1", "a").param("x", 1i64));
        chain
            .statements
            .push(Statement::insert("2", "b").param("x", 2i64));
        chain
            .statements
            .push(Statement::insert("3", "c").param("x", 3i64));

        assert!(executor.execute_subset(&mut chain, &mut conn, &["2"], None));
        assert_eq!(conn.executed().len(), 1);
        assert!(conn.executed()[0].starts_with("INSERT INTO `b`"));
        assert!(chain.statements[1].executed);
        assert!(!chain.statements[0].executed);
    }
}
