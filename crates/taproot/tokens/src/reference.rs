//! Computed references: lazy handles onto attributes of synthesized
//! resources.
//!
//! A reference never touches a live resource. It is a pure function of
//! the owner's address and an attribute path, and every typed accessor
//! just composes a longer path. Single nested objects add a `[0].` hop;
//! elements of apply-time lists refuse direct property access outright
//! and point the caller at the expression helpers instead.

use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};
use crate::token::{
    AttributePath, Token, TokenAnyMap, TokenBoolMap, TokenList, TokenNumber, TokenNumberList,
    TokenNumberMap, TokenString, TokenStringMap,
};

// ── Interpolating Parent ───────────────────────────────────────────────

/// Anything attribute references can hang off: resource addresses and
/// composite references.
///
/// Implementors provide path composition; the typed accessors are
/// derived from it. `boolean_attribute` intentionally hands back the
/// raw token, because a deferred boolean only gains meaning once the
/// engine resolves it.
pub trait InterpolatingParent {
    /// Compose the full path for one attribute of this parent.
    fn attribute_path(&self, attribute: &str) -> TokenResult<AttributePath>;

    /// The deferred value for one attribute of this parent.
    fn interpolation_for_attribute(&self, attribute: &str) -> TokenResult<Token> {
        Ok(Token::interpolation(&self.attribute_path(attribute)?))
    }

    fn string_attribute(&self, attribute: &str) -> TokenResult<TokenString> {
        Ok(TokenString::new(self.interpolation_for_attribute(attribute)?))
    }

    fn number_attribute(&self, attribute: &str) -> TokenResult<TokenNumber> {
        Ok(TokenNumber::new(self.interpolation_for_attribute(attribute)?))
    }

    /// Raw deferred value, not a typed wrapper.
    fn boolean_attribute(&self, attribute: &str) -> TokenResult<Token> {
        self.interpolation_for_attribute(attribute)
    }

    fn list_attribute(&self, attribute: &str) -> TokenResult<TokenList> {
        Ok(TokenList::new(self.interpolation_for_attribute(attribute)?))
    }

    fn number_list_attribute(&self, attribute: &str) -> TokenResult<TokenNumberList> {
        Ok(TokenNumberList::new(
            self.interpolation_for_attribute(attribute)?,
        ))
    }

    fn string_map_attribute(&self, attribute: &str) -> TokenResult<TokenStringMap> {
        Ok(TokenStringMap::new(
            self.interpolation_for_attribute(attribute)?,
        ))
    }

    fn number_map_attribute(&self, attribute: &str) -> TokenResult<TokenNumberMap> {
        Ok(TokenNumberMap::new(
            self.interpolation_for_attribute(attribute)?,
        ))
    }

    fn boolean_map_attribute(&self, attribute: &str) -> TokenResult<TokenBoolMap> {
        Ok(TokenBoolMap::new(
            self.interpolation_for_attribute(attribute)?,
        ))
    }

    fn any_map_attribute(&self, attribute: &str) -> TokenResult<TokenAnyMap> {
        Ok(TokenAnyMap::new(
            self.interpolation_for_attribute(attribute)?,
        ))
    }
}

// ── Resource Address ───────────────────────────────────────────────────

/// Address of a synthesized resource, e.g. `aws_instance.web`. The
/// authoring layer mints these; references derive everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceAddress(String);

impl ResourceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl InterpolatingParent for ResourceAddress {
    fn attribute_path(&self, attribute: &str) -> TokenResult<AttributePath> {
        Ok(AttributePath::new(&self.0).child(attribute))
    }
}

// ── Computed Reference ─────────────────────────────────────────────────

/// A reference into a computed (engine-produced) composite attribute.
///
/// The variant is part of the serialized form (`kind`), so a consumer
/// on the far side of a serialization boundary can still tell whether
/// property access is allowed, without any runtime type information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ComputedReference {
    /// A single nested object; property paths gain the `[0].` hop.
    Object {
        owner: ResourceAddress,
        attribute: String,
    },
    /// An element of a list whose membership is known only at apply
    /// time. Direct property access always fails.
    ListItem {
        owner: ResourceAddress,
        attribute: String,
    },
}

impl ComputedReference {
    pub fn object(owner: ResourceAddress, attribute: impl Into<String>) -> Self {
        ComputedReference::Object {
            owner,
            attribute: attribute.into(),
        }
    }

    pub fn list_item(owner: ResourceAddress, attribute: impl Into<String>) -> Self {
        ComputedReference::ListItem {
            owner,
            attribute: attribute.into(),
        }
    }

    /// Capability check on the variant tag. Survives serialization,
    /// unlike a check against the concrete type.
    pub fn is_list_item(&self) -> bool {
        matches!(self, ComputedReference::ListItem { .. })
    }

    /// The whole composite as one deferred value (no property hop).
    pub fn as_list(&self) -> Token {
        let (owner, attribute) = self.parts();
        Token::interpolation(&AttributePath::new(owner.as_str()).child(attribute))
    }

    /// Fully qualified deferred form of this reference.
    pub fn fqn(&self) -> TokenString {
        TokenString::new(self.as_list())
    }

    /// Descend into a nested composite property. Fails on list items
    /// the same way scalar access does.
    pub fn nested_object(&self, property: &str) -> TokenResult<ComputedReference> {
        match self {
            ComputedReference::Object { owner, attribute } => Ok(ComputedReference::Object {
                owner: owner.clone(),
                attribute: format!("{}[0].{}", attribute, property),
            }),
            ComputedReference::ListItem { .. } => Err(TokenError::RuntimeListAccess {
                property: property.to_string(),
            }),
        }
    }

    fn parts(&self) -> (&ResourceAddress, &str) {
        match self {
            ComputedReference::Object { owner, attribute }
            | ComputedReference::ListItem { owner, attribute } => (owner, attribute),
        }
    }
}

impl InterpolatingParent for ComputedReference {
    fn attribute_path(&self, attribute: &str) -> TokenResult<AttributePath> {
        match self {
            ComputedReference::Object {
                owner,
                attribute: own,
            } => Ok(AttributePath::new(owner.as_str())
                .child(own)
                .object_child(attribute)),
            ComputedReference::ListItem { .. } => Err(TokenError::RuntimeListAccess {
                property: attribute.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web() -> ResourceAddress {
        ResourceAddress::new("aws_instance.web")
    }

    #[test]
    fn address_attribute_paths() {
        let ip = web().string_attribute("private_ip").unwrap();
        assert_eq!(ip.to_string(), "${aws_instance.web.private_ip}");

        let count = web().number_attribute("cpu_count").unwrap();
        assert_eq!(count.to_string(), "${aws_instance.web.cpu_count}");
    }

    #[test]
    fn boolean_attribute_returns_raw_token() {
        let token = web().boolean_attribute("monitoring").unwrap();
        assert_eq!(token.as_str(), "${aws_instance.web.monitoring}");
    }

    #[test]
    fn object_reference_adds_the_index_hop() {
        let nic = ComputedReference::object(web(), "network_interface");
        let ip = nic.string_attribute("ip_address").unwrap();
        assert_eq!(
            ip.to_string(),
            "${aws_instance.web.network_interface[0].ip_address}"
        );
    }

    #[test]
    fn nested_objects_compose() {
        let nic = ComputedReference::object(web(), "network_interface");
        let access = nic.nested_object("access_config").unwrap();
        let nat = access.string_attribute("nat_ip").unwrap();
        assert_eq!(
            nat.to_string(),
            "${aws_instance.web.network_interface[0].access_config[0].nat_ip}"
        );
    }

    #[test]
    fn list_item_refuses_every_property_access() {
        let item = ComputedReference::list_item(web(), "network_interface");

        let err = item.string_attribute("ip_address").unwrap_err();
        assert!(err.to_string().contains("ip_address"));

        let err = item.boolean_attribute("primary").unwrap_err();
        assert!(err.to_string().contains("primary"));

        let err = item.nested_object("access_config").unwrap_err();
        assert!(err.to_string().contains("access_config"));
    }

    #[test]
    fn list_item_still_resolves_as_a_whole() {
        let item = ComputedReference::list_item(web(), "network_interface");
        assert_eq!(
            item.fqn().to_string(),
            "${aws_instance.web.network_interface}"
        );
        assert_eq!(
            item.as_list().as_str(),
            "${aws_instance.web.network_interface}"
        );
    }

    #[test]
    fn capability_tag_survives_serialization() {
        let item = ComputedReference::list_item(web(), "disks");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "list-item");

        let back: ComputedReference = serde_json::from_value(json).unwrap();
        assert!(back.is_list_item());
        assert!(back.string_attribute("size").is_err());

        let object = ComputedReference::object(web(), "boot_disk");
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["kind"], "object");
        let back: ComputedReference = serde_json::from_value(json).unwrap();
        assert!(!back.is_list_item());
    }
}
