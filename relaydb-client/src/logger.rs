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

//! Logging surface
//!
//! The executor and command set never write to process-level sinks
//! directly; all chain progress and error reporting funnels through an
//! injected `ChainLogger`. The default forwards to `tracing`.

use parking_lot::Mutex;

/// Injected log sinks for chain progress and errors.
pub trait ChainLogger: Send + Sync {
    fn info(&self, msg: &str);
    fn error(&self, msg: &str, detail: Option<&str>);
}

/// Default logger backed by the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ChainLogger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!("{}", msg);
    }

    fn error(&self, msg: &str, detail: Option<&str>) {
        match detail {
            Some(detail) => tracing::error!(detail, "{}", msg),
            None => tracing::error!("{}", msg),
        }
    }
}

/// One recorded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Info(String),
    Error(String),
}

/// Recording logger for tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                LogEntry::Info(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter_map(|e| match e {
                LogEntry::Error(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ChainLogger for MemoryLogger {
    fn info(&self, msg: &str) {
        self.entries.lock().push(LogEntry::Info(msg.to_string()));
    }

    fn error(&self, msg: &str, detail: Option<&str>) {
        let line = match detail {
            Some(detail) => format!("{} ({})", msg, detail),
            None => msg.to_string(),
        };
        self.entries.lock().push(LogEntry::Error(line));
    }
}
