//! Command value types and parse errors.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value-transfer verb senders may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Pay,
    Transfer,
}

impl Action {
    /// Wire spelling of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Pay => "PAY",
            Action::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAY" => Ok(Action::Pay),
            "TRANSFER" => Ok(Action::Transfer),
            other => Err(ParseError::ActionNotAllowed(other.to_string())),
        }
    }
}

/// A validated transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    /// Requested verb.
    pub action: Action,
    /// Amount in whole native units, strictly positive.
    pub amount: Decimal,
    /// Destination as the sender wrote it (`0x` + 40 hex digits).
    pub recipient: String,
}

/// Reasons inbound text is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Text does not match `ACTION AMOUNT ADDRESS`.
    #[error("malformed command")]
    Malformed,

    /// Action is not on the allow-list.
    #[error("action '{0}' is not allowed")]
    ActionNotAllowed(String),

    /// Amount is zero, above the maximum, or not exactly representable.
    #[error("amount {0} is out of range")]
    AmountOutOfRange(String),

    /// Recipient failed address validation.
    #[error("invalid recipient address {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trips_wire_spelling() {
        assert_eq!("PAY".parse::<Action>().unwrap(), Action::Pay);
        assert_eq!("TRANSFER".parse::<Action>().unwrap(), Action::Transfer);
        assert_eq!(Action::Transfer.to_string(), "TRANSFER");
    }

    #[test]
    fn test_unknown_action_is_not_allowed() {
        assert_eq!(
            "BUY".parse::<Action>(),
            Err(ParseError::ActionNotAllowed("BUY".to_string()))
        );
        // Case sensitive, like the grammar.
        assert!("pay".parse::<Action>().is_err());
    }
}
