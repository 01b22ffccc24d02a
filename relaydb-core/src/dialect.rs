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

//! SQL dialects
//!
//! A dialect is the pair of concrete choices that parameterize the renderer:
//! the identifier quote character and the byte-literal syntax. Everything
//! else about SQL text generation is dialect-independent.

use std::fmt;

/// Immutable per-database rendering knobs.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    name: &'static str,
    quote: char,
    render_bytes: fn(&[u8]) -> String,
}

impl Dialect {
    pub const fn new(name: &'static str, quote: char, render_bytes: fn(&[u8]) -> String) -> Self {
        Self {
            name,
            quote,
            render_bytes,
        }
    }

    /// MySQL: backtick identifiers, `X'<hex>'` byte literals.
    pub fn mysql() -> Self {
        Self::new("mysql", '`', mysql_bytes)
    }

    /// PostgreSQL: double-quoted identifiers, `'\x<hex>'` byte literals.
    pub fn postgres() -> Self {
        Self::new("postgres", '"', hex_escape_bytes)
    }

    /// Fallback dialect used when no software-specific one is registered.
    pub fn generic() -> Self {
        Self::new("generic", '`', hex_escape_bytes)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    /// Surround an identifier with the dialect's quote character.
    pub fn quote_ident(&self, ident: &str) -> String {
        format!("{}{}{}", self.quote, ident, self.quote)
    }

    /// Render a byte sequence as a SQL literal.
    pub fn render_bytes(&self, bytes: &[u8]) -> String {
        (self.render_bytes)(bytes)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn mysql_bytes(bytes: &[u8]) -> String {
    format!("X'{}'", hex::encode(bytes))
}

fn hex_escape_bytes(bytes: &[u8]) -> String {
    format!("'\\x{}'", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(Dialect::mysql().quote_ident("user"), "`user`");
        assert_eq!(Dialect::postgres().quote_ident("user"), "\"user\"");
        assert_eq!(Dialect::generic().quote_ident("order"), "`order`");
    }

    #[test]
    fn test_byte_literals() {
        let bytes = [1u8, 2, 3, 4];
        assert_eq!(Dialect::mysql().render_bytes(&bytes), "X'01020304'");
        assert_eq!(Dialect::postgres().render_bytes(&bytes), "'\\x01020304'");
        assert_eq!(Dialect::generic().render_bytes(&bytes), "'\\x01020304'");
    }
}
