//! Expression helpers for values that cannot be addressed directly.
//!
//! These build engine function calls around deferred values. They exist
//! mainly for apply-time lists: `lookup(element(list, i), "prop", d)`
//! is the supported route where a direct property path would lie about
//! what is knowable before apply.

use crate::token::{Token, TokenList};

/// Select one element of a deferred list by index.
pub fn element(list: &TokenList, index: usize) -> Token {
    Token::from_expression(format!("element({}, {})", list.token().expression(), index))
}

/// Look up a property of a deferred value, with a default for the
/// absent case.
pub fn lookup(value: &Token, property: &str, default: &str) -> Token {
    Token::from_expression(format!(
        "lookup({}, \"{}\", \"{}\")",
        value.expression(),
        property,
        default
    ))
}
