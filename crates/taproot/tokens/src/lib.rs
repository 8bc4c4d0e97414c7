//! # taproot-tokens
//!
//! Lazy attribute references over synthesized resources.
//!
//! Engine-computed attribute values do not exist until apply time, so
//! the authoring layer works with *tokens*: placeholder expressions
//! that are pure functions of an owner address and an attribute path.
//!
//! ```text
//! ResourceAddress ("aws_instance.web")
//!     │ string_attribute("private_ip")      → ${aws_instance.web.private_ip}
//!     │
//!     ├── ComputedReference::Object("nic")
//!     │       │ string_attribute("ip")      → ${aws_instance.web.nic[0].ip}
//!     │
//!     ├── ComputedReference::ListItem("nic")
//!     │       │ string_attribute("ip")      → error: only known at apply time
//!     │       │ fqn()                       → ${aws_instance.web.nic}
//!     │
//!     └── StringMapRef("tags")
//!             │ lookup("team")              → ${aws_instance.web.tags["team"]}
//! ```
//!
//! Whether a reference tolerates property access is encoded in its
//! serialized `kind` tag, so the check holds even after a reference has
//! crossed a process boundary.

#![deny(unsafe_code)]

pub mod error;
pub mod expr;
pub mod maps;
pub mod reference;
pub mod token;

// Re-exports
pub use error::{TokenError, TokenResult};
pub use expr::{element, lookup};
pub use maps::{AnyMapRef, BoolMapRef, NumberMapRef, StringMapRef};
pub use reference::{ComputedReference, InterpolatingParent, ResourceAddress};
pub use token::{
    AttributePath, Token, TokenAnyMap, TokenBoolMap, TokenList, TokenNumber, TokenNumberList,
    TokenNumberMap, TokenString, TokenStringMap,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_cover_every_declared_type() {
        let db = ResourceAddress::new("aws_db_instance.main");

        assert_eq!(
            db.string_attribute("endpoint").unwrap().to_string(),
            "${aws_db_instance.main.endpoint}"
        );
        assert_eq!(
            db.number_attribute("port").unwrap().to_string(),
            "${aws_db_instance.main.port}"
        );
        assert_eq!(
            db.boolean_attribute("encrypted").unwrap().to_string(),
            "${aws_db_instance.main.encrypted}"
        );
        assert_eq!(
            db.list_attribute("replicas").unwrap().to_string(),
            "${aws_db_instance.main.replicas}"
        );
        assert_eq!(
            db.number_list_attribute("ports").unwrap().to_string(),
            "${aws_db_instance.main.ports}"
        );
        assert_eq!(
            db.string_map_attribute("tags").unwrap().to_string(),
            "${aws_db_instance.main.tags}"
        );
        assert_eq!(
            db.number_map_attribute("weights").unwrap().to_string(),
            "${aws_db_instance.main.weights}"
        );
        assert_eq!(
            db.boolean_map_attribute("flags").unwrap().to_string(),
            "${aws_db_instance.main.flags}"
        );
        assert_eq!(
            db.any_map_attribute("meta").unwrap().to_string(),
            "${aws_db_instance.main.meta}"
        );
    }

    #[test]
    fn references_are_pure_and_repeatable() {
        let a = ComputedReference::object(ResourceAddress::new("m.x"), "cfg");
        let b = ComputedReference::object(ResourceAddress::new("m.x"), "cfg");
        assert_eq!(a, b);
        assert_eq!(
            a.string_attribute("v").unwrap(),
            b.string_attribute("v").unwrap()
        );
    }
}
