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

//! Chain documents
//!
//! A `DbCommand` is the portable description of one chain: connection
//! credentials, a dialect selector, the ordered statement list, and a
//! free-form properties map used as the variable lookup of last resort.

use crate::codec;
use crate::error::{CoreError, Result};
use crate::statement::Statement;
use crate::value::SqlValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;

/// Connection credentials carried in the chain document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Hostname; legacy documents use the key `ip`.
    #[serde(default, alias = "ip")]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default, rename = "db")]
    pub dbname: String,
}

impl Credentials {
    /// `host:port/db` form for log lines.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.dbname)
    }
}

/// One chain: credentials, dialect selector, statements, properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DbCommand {
    pub id: Option<String>,
    pub credentials: Credentials,
    /// Selects the dialect and connection provider through the registry.
    pub software: String,
    /// Variable lookup of last resort.
    pub properties: HashMap<String, SqlValue>,
    pub statements: Vec<Statement>,
    /// Chain-wide variable bindings, filled by the executor. Not part of
    /// the document.
    pub resolved_variables: HashMap<String, SqlValue>,
}

impl DbCommand {
    pub fn new(software: impl Into<String>) -> Self {
        Self {
            software: software.into(),
            ..Default::default()
        }
    }

    pub fn statement(&self, sql_id: &str) -> Option<&Statement> {
        self.statements.iter().find(|s| s.sql_id == sql_id)
    }

    pub fn statement_mut(&mut self, sql_id: &str) -> Option<&mut Statement> {
        self.statements.iter_mut().find(|s| s.sql_id == sql_id)
    }

    pub fn property(&self, key: &str) -> Option<&SqlValue> {
        self.properties.get(key)
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::new();
        if let Some(id) = &self.id {
            map.insert("id".into(), JsonValue::from(id.clone()));
        }
        if let Ok(JsonValue::Object(creds)) = serde_json::to_value(&self.credentials) {
            map.extend(creds);
        }
        map.insert("software".into(), JsonValue::from(self.software.clone()));
        let mut props = JsonMap::new();
        for (key, value) in &self.properties {
            props.insert(key.clone(), codec::encode(value));
        }
        map.insert("properties".into(), JsonValue::Object(props));
        map.insert(
            "sqls".into(),
            JsonValue::Array(self.statements.iter().map(Statement::to_json).collect()),
        );
        JsonValue::Object(map)
    }

    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| CoreError::Document("chain document must be an object".into()))?;

        let credentials: Credentials = serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Document(format!("bad credentials: {}", e)))?;

        let mut command = DbCommand {
            id: map
                .get("id")
                .and_then(JsonValue::as_str)
                .map(|s| s.to_string()),
            credentials,
            software: map
                .get("software")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            ..Default::default()
        };

        if let Some(props) = map.get("properties").and_then(JsonValue::as_object) {
            for (key, value) in props {
                command.properties.insert(key.clone(), codec::decode(value));
            }
        }
        if let Some(sqls) = map.get("sqls").and_then(JsonValue::as_array) {
            for stmt in sqls {
                command.statements.push(Statement::from_json(stmt)?);
            }
        }
        Ok(command)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(s)
            .map_err(|e| CoreError::Document(format!("bad JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementKind;

    #[test]
    fn test_roundtrip() {
        let mut command = DbCommand::new("mysql");
        command.id = Some("cmd_basic".into());
        command.credentials = Credentials {
            host: "db.internal".into(),
            port: 3306,
            user: "svc".into(),
            pass: "secret".into(),
            dbname: "shop".into(),
        };
        command
            .properties
            .insert("REGION".into(), SqlValue::Text("eu".into()));
        command
            .statements
            .push(Statement::insert("11", "order").param("product", 123i64));

        let decoded = DbCommand::from_json(&command.to_json()).unwrap();
        assert_eq!(decoded, command);

        let decoded = DbCommand::from_json_str(&command.to_json_string()).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_from_json_str_rejects_garbage() {
        assert!(DbCommand::from_json_str("not json").is_err());
        assert!(DbCommand::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_legacy_ip_alias() {
        let doc = serde_json::json!({
            "ip": "10.0.0.5",
            "port": 5432,
            "user": "u",
            "pass": "p",
            "db": "d",
            "software": "postgres",
            "sqls": [{"sqlID": "1", "table": "t", "type": "SELECT"}],
        });
        let command = DbCommand::from_json(&doc).unwrap();
        assert_eq!(command.credentials.host, "10.0.0.5");
        assert_eq!(command.credentials.dbname, "d");
        assert_eq!(command.software, "postgres");
        assert_eq!(command.statements.len(), 1);
        assert_eq!(command.statements[0].kind, StatementKind::Select);
    }

    #[test]
    fn test_missing_fields_default() {
        let command = DbCommand::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(command.credentials.host, "");
        assert_eq!(command.software, "");
        assert!(command.statements.is_empty());
    }

    #[test]
    fn test_address() {
        let creds = Credentials {
            host: "h".into(),
            port: 5432,
            dbname: "d".into(),
            ..Default::default()
        };
        assert_eq!(creds.address(), "h:5432/d");
    }
}
