//! Order identity codec.
//!
//! Correlates a user with a gateway-side invoice through an opaque
//! external reference of the form `<prefix>_<user_id>`.

use thiserror::Error;

use crate::domain::foundation::UserId;

/// Prefix used for premium subscription invoices.
pub const DEFAULT_REFERENCE_PREFIX: &str = "premium_subscription";

/// Separator between the prefix and the user id.
pub const REFERENCE_SEPARATOR: char = '_';

/// External reference that does not attribute to a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("reference '{0}' has no separator")]
    MissingSeparator(String),

    #[error("reference '{0}' does not start with the expected prefix")]
    WrongPrefix(String),

    #[error("reference '{0}' carries an empty user id")]
    EmptyUserId(String),
}

/// Encodes and decodes external references.
///
/// Decoding strips the known prefix instead of splitting on a separator,
/// so user ids that themselves contain `_` survive a round trip intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReferenceCodec {
    prefix: String,
}

impl OrderReferenceCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds the external reference for `user_id`.
    pub fn encode(&self, user_id: &UserId) -> String {
        format!("{}{}{}", self.prefix, REFERENCE_SEPARATOR, user_id.as_str())
    }

    /// Recovers the user id from an external reference.
    pub fn decode(&self, external_reference: &str) -> Result<UserId, DecodeError> {
        let Some(rest) = external_reference.strip_prefix(self.prefix.as_str()) else {
            return Err(DecodeError::WrongPrefix(external_reference.to_string()));
        };
        let Some(id) = rest.strip_prefix(REFERENCE_SEPARATOR) else {
            return Err(DecodeError::MissingSeparator(external_reference.to_string()));
        };
        if id.trim().is_empty() {
            return Err(DecodeError::EmptyUserId(external_reference.to_string()));
        }
        UserId::new(id).map_err(|_| DecodeError::EmptyUserId(external_reference.to_string()))
    }
}

impl Default for OrderReferenceCodec {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_appends_user_id_after_prefix() {
        let codec = OrderReferenceCodec::default();
        let user = UserId::new("u-42").unwrap();
        assert_eq!(codec.encode(&user), "premium_subscription_u-42");
    }

    #[test]
    fn decode_recovers_user_id() {
        let codec = OrderReferenceCodec::default();
        assert_eq!(
            codec.decode("premium_subscription_u-42").unwrap().as_str(),
            "u-42"
        );
    }

    #[test]
    fn user_ids_containing_separator_survive() {
        let codec = OrderReferenceCodec::default();
        let user = UserId::new("org_7_user_9").unwrap();
        assert_eq!(codec.decode(&codec.encode(&user)).unwrap(), user);
    }

    #[test]
    fn empty_id_after_prefix_is_rejected() {
        let codec = OrderReferenceCodec::default();
        assert_eq!(
            codec.decode("premium_subscription_"),
            Err(DecodeError::EmptyUserId("premium_subscription_".to_string()))
        );
        assert!(matches!(
            codec.decode("premium_subscription_   "),
            Err(DecodeError::EmptyUserId(_))
        ));
    }

    #[test]
    fn prefix_without_separator_is_rejected() {
        let codec = OrderReferenceCodec::default();
        assert!(matches!(
            codec.decode("premium_subscription"),
            Err(DecodeError::MissingSeparator(_))
        ));
        assert!(matches!(
            codec.decode("premium_subscriptionX"),
            Err(DecodeError::MissingSeparator(_))
        ));
    }

    #[test]
    fn foreign_reference_is_rejected() {
        let codec = OrderReferenceCodec::default();
        assert!(matches!(
            codec.decode("order-123"),
            Err(DecodeError::WrongPrefix(_))
        ));
        assert!(matches!(codec.decode(""), Err(DecodeError::WrongPrefix(_))));
    }

    #[test]
    fn custom_prefix_is_honoured() {
        let codec = OrderReferenceCodec::new("plan");
        let user = UserId::new("abc").unwrap();
        assert_eq!(codec.encode(&user), "plan_abc");
        assert_eq!(codec.decode("plan_abc").unwrap(), user);
        assert!(codec.decode("premium_subscription_abc").is_err());
    }

    proptest! {
        #[test]
        fn round_trip_for_any_user_id(id in "[A-Za-z0-9_\\-]{0,8}[A-Za-z0-9\\-][A-Za-z0-9_\\-]{0,24}") {
            let codec = OrderReferenceCodec::default();
            let user = UserId::new(id.clone()).unwrap();
            let decoded = codec.decode(&codec.encode(&user)).unwrap();
            prop_assert_eq!(decoded.as_str(), id.as_str());
        }

        #[test]
        fn decode_never_yields_empty_id(reference in ".*") {
            let codec = OrderReferenceCodec::default();
            if let Ok(user) = codec.decode(&reference) {
                prop_assert!(!user.as_str().trim().is_empty());
            }
        }
    }
}
