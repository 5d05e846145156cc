use thiserror::Error;

use crate::policy::DataType;
use crate::strategy::MaskingStrategy;

/// Errors raised by salt handling and strategy application.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaskingError {
    /// The salt failed validation; the message names the failed rule.
    #[error("invalid salt: {0}")]
    InvalidSalt(&'static str),

    /// The value is of the right shape but cannot be masked.
    #[error("invalid {data_type} value: {reason}")]
    InvalidValue { data_type: DataType, reason: String },

    /// A strategy was asked to mask a value shape it does not handle.
    #[error("strategy {strategy} cannot mask a {found} value")]
    Unsupported {
        strategy: MaskingStrategy,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_salt_message() {
        let err = MaskingError::InvalidSalt("Salt has insufficient entropy");
        assert_eq!(err.to_string(), "invalid salt: Salt has insufficient entropy");
    }

    #[test]
    fn unsupported_message_names_strategy() {
        let err = MaskingError::Unsupported {
            strategy: MaskingStrategy::AddressTiered,
            found: "text",
        };
        assert_eq!(
            err.to_string(),
            "strategy address_tiered cannot mask a text value"
        );
    }

    #[test]
    fn invalid_value_message() {
        let err = MaskingError::InvalidValue {
            data_type: DataType::Amount,
            reason: "negative".into(),
        };
        assert_eq!(err.to_string(), "invalid amount value: negative");
    }
}
