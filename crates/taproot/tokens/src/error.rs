use taproot_types::ErrorKind;
use thiserror::Error;

/// Errors from the deferred-reference subsystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Cannot directly access property {property} in a list only known at apply time.\nUse lookup(element(your_list, index), \"{property}\", default) instead")]
    RuntimeListAccess { property: String },
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::RuntimeListAccess { .. } => ErrorKind::Usage,
        }
    }
}

/// Convenience type alias for token results.
pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_list_access_names_the_property_and_the_remedy() {
        let err = TokenError::RuntimeListAccess {
            property: "ip_address".into(),
        };
        let message = err.to_string();
        assert!(message.contains("ip_address"));
        assert!(message.contains("lookup(element("));
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
