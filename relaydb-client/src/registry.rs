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

//! Provider registry
//!
//! Process-wide map from a chain's `software` string (e.g. `"mysql"`,
//! `"postgres"`) to the provider that opens its connections. Written during
//! startup registration, read per chain afterwards; the lock makes first
//! use safe against concurrent registration.

use crate::connection::ConnectionProvider;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<dyn ConnectionProvider>>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, Arc<dyn ConnectionProvider>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register the provider for a `software` string, replacing any earlier
/// registration under the same name.
pub fn register_provider(software: &str, provider: Arc<dyn ConnectionProvider>) {
    registry().write().insert(software.to_string(), provider);
}

/// Provider registered for a `software` string, if any.
pub fn provider_for(software: &str) -> Option<Arc<dyn ConnectionProvider>> {
    registry().read().get(software).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, MockScript};
    use relaydb_core::Credentials;

    #[test]
    fn test_register_and_lookup() {
        register_provider(
            "registry-test-mysql",
            Arc::new(MockProvider::new(MockScript::default())),
        );
        assert!(provider_for("registry-test-mysql").is_some());
        assert!(provider_for("registry-test-unknown").is_none());
    }

    #[test]
    fn test_replacement_wins() {
        register_provider("registry-test-swap", Arc::new(MockProvider::failing()));
        register_provider(
            "registry-test-swap",
            Arc::new(MockProvider::new(MockScript::default())),
        );
        let provider = provider_for("registry-test-swap").unwrap();
        assert!(provider.connect(&Credentials::default()).is_some());
    }
}
