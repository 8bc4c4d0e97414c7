//! Keyed lookups into deferred maps.
//!
//! Where the typed map accessors hand back the whole map as one
//! deferred value, these references defer individual entries: a lookup
//! composes `<attribute>["<key>"]` onto the owning path. The boolean
//! flavor hands back raw tokens, same as scalar boolean access.

use serde::{Deserialize, Serialize};

use crate::token::{AttributePath, Token, TokenNumber, TokenString};

// ── String Map ─────────────────────────────────────────────────────────

/// Per-key access into a deferred map of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMapRef {
    path: AttributePath,
}

impl StringMapRef {
    pub fn new(path: AttributePath) -> Self {
        Self { path }
    }

    pub fn lookup(&self, key: &str) -> TokenString {
        TokenString::new(Token::interpolation(&self.path.keyed(key)))
    }
}

// ── Number Map ─────────────────────────────────────────────────────────

/// Per-key access into a deferred map of numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberMapRef {
    path: AttributePath,
}

impl NumberMapRef {
    pub fn new(path: AttributePath) -> Self {
        Self { path }
    }

    pub fn lookup(&self, key: &str) -> TokenNumber {
        TokenNumber::new(Token::interpolation(&self.path.keyed(key)))
    }
}

// ── Boolean Map ────────────────────────────────────────────────────────

/// Per-key access into a deferred map of booleans. Lookups stay raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolMapRef {
    path: AttributePath,
}

impl BoolMapRef {
    pub fn new(path: AttributePath) -> Self {
        Self { path }
    }

    pub fn lookup(&self, key: &str) -> Token {
        Token::interpolation(&self.path.keyed(key))
    }
}

// ── Any Map ────────────────────────────────────────────────────────────

/// Per-key access into a deferred map of arbitrary values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyMapRef {
    path: AttributePath,
}

impl AnyMapRef {
    pub fn new(path: AttributePath) -> Self {
        Self { path }
    }

    pub fn lookup(&self, key: &str) -> Token {
        Token::interpolation(&self.path.keyed(key))
    }
}
