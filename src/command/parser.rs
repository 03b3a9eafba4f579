//! Grammar check and policy validation for sanitized commands.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::command::sanitize::sanitize;
use crate::command::types::{Action, Command, ParseError};
use crate::command::units;
use crate::config::CommandConfig;

/// `ACTION AMOUNT ADDRESS`. The action is matched loosely here so that an
/// unknown verb reports `ActionNotAllowed` rather than `Malformed`.
static GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+([0-9]+\.?[0-9]*)\s+(0x[a-fA-F0-9]{40})$")
        .expect("static pattern")
});

/// Parses raw channel text into a [`Command`] under a fixed policy.
#[derive(Debug, Clone)]
pub struct CommandParser {
    allowed_actions: Vec<Action>,
    max_amount: Decimal,
}

impl CommandParser {
    /// Create a parser with an explicit policy.
    pub fn new(allowed_actions: Vec<Action>, max_amount: Decimal) -> Self {
        Self {
            allowed_actions,
            max_amount,
        }
    }

    /// Create a parser from the `[commands]` configuration section.
    pub fn from_config(config: &CommandConfig) -> Self {
        Self::new(config.allowed_actions.clone(), config.max_amount)
    }

    /// Sanitize and parse `raw`.
    ///
    /// Address validation is delegated to `is_valid_address`, normally the
    /// chain client's checksum check.
    pub fn parse<F>(&self, raw: &str, is_valid_address: F) -> Result<Command, ParseError>
    where
        F: Fn(&str) -> bool,
    {
        let text = sanitize(raw);
        let captures = GRAMMAR.captures(&text).ok_or(ParseError::Malformed)?;

        let action_token = &captures[1];
        let action = Action::from_str(action_token)?;
        if !self.allowed_actions.contains(&action) {
            return Err(ParseError::ActionNotAllowed(action_token.to_string()));
        }

        let amount_token = &captures[2];
        let amount = self.parse_amount(amount_token)?;

        let recipient = &captures[3];
        if !is_valid_address(recipient) {
            return Err(ParseError::InvalidAddress(recipient.to_string()));
        }

        Ok(Command {
            action,
            amount,
            recipient: recipient.to_string(),
        })
    }

    fn parse_amount(&self, token: &str) -> Result<Decimal, ParseError> {
        let out_of_range = || ParseError::AmountOutOfRange(token.to_string());

        // "5." is accepted by the grammar but not by the decimal parser.
        let literal = token.trim_end_matches('.');

        // The decimal parser rounds past 28 places; count digits before it can.
        let significant_places = literal
            .split_once('.')
            .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len());
        if significant_places > units::CHAIN_DECIMALS as usize {
            return Err(out_of_range());
        }

        let amount = Decimal::from_str(literal).map_err(|_| out_of_range())?;

        if amount <= Decimal::ZERO || amount > self.max_amount {
            return Err(out_of_range());
        }
        units::to_smallest_unit(amount).map_err(|_| out_of_range())?;

        Ok(amount)
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::from_config(&CommandConfig::default())
    }
}
