//! Deferred values and the paths they interpolate.
//!
//! A [`Token`] is a placeholder expression (`${...}`) that the engine
//! resolves at plan/apply time; taproot never evaluates one. Composing
//! references is pure string work over [`AttributePath`]s, so building
//! a token has no side effects and needs no live resource.

use serde::{Deserialize, Serialize};

// ── Attribute Path ─────────────────────────────────────────────────────

/// A composed attribute path rooted at a resource address, e.g.
/// `aws_instance.web.network_interface[0].access_config`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(String);

impl AttributePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Append a plain `.`-separated segment.
    pub fn child(&self, segment: &str) -> AttributePath {
        AttributePath(format!("{}.{}", self.0, segment))
    }

    /// Append a property hop through a single nested object (`[0].p`).
    pub fn object_child(&self, property: &str) -> AttributePath {
        AttributePath(format!("{}[0].{}", self.0, property))
    }

    /// Append a string-keyed map lookup (`["k"]`).
    pub fn keyed(&self, key: &str) -> AttributePath {
        AttributePath(format!("{}[\"{}\"]", self.0, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Token ──────────────────────────────────────────────────────────────

/// A raw deferred value: the interpolation expression the engine will
/// substitute once the referenced attribute exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a composed path as an interpolation expression.
    pub fn interpolation(path: &AttributePath) -> Self {
        Self(format!("${{{}}}", path))
    }

    /// Wrap an already-built expression body, e.g. a function call.
    pub fn from_expression(expression: impl Into<String>) -> Self {
        Self(format!("${{{}}}", expression.into()))
    }

    /// The full placeholder, `${...}` included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The expression body without the placeholder wrapping. Used when
    /// a token feeds another expression (function arguments).
    pub fn expression(&self) -> &str {
        self.0
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Typed Wrappers ─────────────────────────────────────────────────────

/// A deferred string attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenString(Token);

impl TokenString {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred numeric attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenNumber(Token);

impl TokenNumber {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenList(Token);

impl TokenList {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred list of numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenNumberList(Token);

impl TokenNumberList {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenNumberList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred map of strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenStringMap(Token);

impl TokenStringMap {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenStringMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred map of numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenNumberMap(Token);

impl TokenNumberMap {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenNumberMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred map of booleans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenBoolMap(Token);

impl TokenBoolMap {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenBoolMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred map of arbitrary values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAnyMap(Token);

impl TokenAnyMap {
    pub fn new(token: Token) -> Self {
        Self(token)
    }

    pub fn token(&self) -> &Token {
        &self.0
    }
}

impl std::fmt::Display for TokenAnyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
