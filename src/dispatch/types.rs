//! Pipeline stages, errors and outcomes.

use std::fmt;

use alloy::primitives::TxHash;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::TxError;
use crate::command::ParseError;
use crate::routing::{DeliveryError, ReplyEnvelope};
use crate::security::AuthError;

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Sanitized,
    Authorized,
    Submitted,
    Replied,
    /// Absorbing; reachable from any earlier stage.
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Sanitized => "sanitized",
            Stage::Authorized => "authorized",
            Stage::Submitted => "submitted",
            Stage::Replied => "replied",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure between receipt and submission.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Webhook sender is not a phone number.
    #[error("invalid sender identity")]
    InvalidSender,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Tx(#[from] TxError),
}

impl PipelineError {
    /// Fixed reply wording. Internal error text is never sent to senders.
    pub fn reply_reason(&self) -> &'static str {
        match self {
            PipelineError::InvalidSender => "Invalid phone number",
            PipelineError::Parse(ParseError::Malformed) => "Invalid request format",
            PipelineError::Parse(ParseError::ActionNotAllowed(_)) => "Action not allowed",
            PipelineError::Parse(ParseError::AmountOutOfRange(_)) => "Amount out of range",
            PipelineError::Parse(ParseError::InvalidAddress(_)) => "Invalid recipient address",
            PipelineError::Auth(AuthError::UnknownSender) => "Unauthorized sender",
            PipelineError::Auth(AuthError::RateLimited { .. }) => "Rate limit exceeded",
            PipelineError::Auth(AuthError::CounterUnavailable(_)) => {
                "Service temporarily unavailable"
            }
            PipelineError::Tx(TxError::EstimationFailed(_)) => "Could not prepare transaction",
            PipelineError::Tx(TxError::FeeTooHigh { .. }) => "Network fees too high, try later",
            PipelineError::Tx(TxError::SigningFailed(_)) => "Could not sign transaction",
            PipelineError::Tx(TxError::SubmissionFailed(_)) => "Transaction submission failed",
        }
    }

    /// Metrics label.
    pub fn status(&self) -> &'static str {
        match self {
            PipelineError::InvalidSender | PipelineError::Parse(_) => "rejected",
            PipelineError::Auth(AuthError::UnknownSender) => "unauthorized",
            PipelineError::Auth(AuthError::RateLimited { .. }) => "rate_limited",
            PipelineError::Auth(AuthError::CounterUnavailable(_)) => "unavailable",
            PipelineError::Tx(_) => "tx_failed",
        }
    }
}

/// Reply text for a finished pipeline run.
pub fn reply_message(result: &Result<TxHash, PipelineError>) -> String {
    match result {
        Ok(hash) => format!("Transaction successful: {}", hash),
        Err(e) => format!("Error: {}", e.reply_reason()),
    }
}

/// Everything that happened to one inbound request.
#[derive(Debug)]
pub struct Outcome {
    pub request_id: Uuid,
    /// Last stage reached before the reply step.
    pub reached: Stage,
    /// `Replied` once a transaction was sent and its reply delivered,
    /// `Failed` otherwise.
    pub stage: Stage,
    pub result: Result<TxHash, PipelineError>,
    /// The single reply produced for the request.
    pub envelope: ReplyEnvelope,
    pub delivery: Result<(), DeliveryError>,
}

impl Outcome {
    /// Whether a transaction was submitted.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
