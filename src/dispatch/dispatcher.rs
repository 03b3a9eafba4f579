//! Single entry point for both inbound channels.
//!
//! Sequences parse → authorize → build/submit → count → reply for one
//! request and turns every failure into exactly one reply.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::TxHash;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::TxBuilder;
use crate::command::CommandParser;
use crate::dispatch::inflight::InFlight;
use crate::dispatch::types::{reply_message, Outcome, PipelineError, Stage};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::routing::{is_valid_phone, Channel, ReplyRouter};
use crate::security::Authorizer;

/// Request pipeline shared by the webhook and bus adapters.
#[derive(Clone)]
pub struct Dispatcher {
    parser: CommandParser,
    authorizer: Authorizer,
    builder: TxBuilder,
    router: ReplyRouter,
    in_flight: InFlight,
}

impl Dispatcher {
    /// Create a dispatcher from its collaborators.
    pub fn new(
        parser: CommandParser,
        authorizer: Authorizer,
        builder: TxBuilder,
        router: ReplyRouter,
    ) -> Self {
        Self {
            parser,
            authorizer,
            builder,
            router,
            in_flight: InFlight::new(),
        }
    }

    /// Run one request on its own task.
    ///
    /// The task is detached from the caller: dropping the handle (for
    /// example when an HTTP client disconnects) does not cancel a request
    /// that has already been broadcast. It is counted in flight from this
    /// call until its reply has been attempted.
    pub fn spawn(self: &Arc<Self>, sender: String, body: String, channel: Channel) -> JoinHandle<Outcome> {
        let guard = self.in_flight.enter();
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = dispatcher.handle(&sender, &body, channel).await;
            drop(guard);
            outcome
        })
    }

    /// Dispatches spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Wait up to `deadline` for every spawned dispatch to finish.
    ///
    /// Returns `false` if some were still running when the deadline passed.
    pub async fn drain(&self, deadline: Duration) -> bool {
        let pending = self.in_flight.count();
        if pending > 0 {
            tracing::info!(pending, "Waiting for in-flight requests");
        }
        match with_deadline(deadline, self.in_flight.drained()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    pending = self.in_flight.count(),
                    "In-flight requests still running at drain deadline"
                );
                false
            }
        }
    }

    /// Process one inbound request to completion and deliver its reply.
    pub async fn handle(&self, sender: &str, raw: &str, channel: Channel) -> Outcome {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request_id,
            channel = %channel,
            sender = %sender
        );

        async move {
            let start = Instant::now();
            let mut reached = Stage::Received;
            let result = self.run(sender, raw, channel, &mut reached).await;

            match &result {
                Ok(hash) => tracing::info!(tx_hash = %hash, "Transaction sent"),
                Err(e) => tracing::warn!(stage = %reached, error = %e, "Request failed"),
            }
            let status = match &result {
                Ok(_) => "success",
                Err(e) => e.status(),
            };
            metrics::record_request(channel.as_str(), status, start);

            let envelope = self.router.envelope(channel, sender, reply_message(&result));
            let delivery = self.router.deliver(envelope.clone()).await;

            let stage = if result.is_ok() && delivery.is_ok() {
                Stage::Replied
            } else {
                Stage::Failed
            };

            Outcome {
                request_id,
                reached,
                stage,
                result,
                envelope,
                delivery,
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        sender: &str,
        raw: &str,
        channel: Channel,
        reached: &mut Stage,
    ) -> Result<TxHash, PipelineError> {
        if channel == Channel::Webhook && !is_valid_phone(sender) {
            return Err(PipelineError::InvalidSender);
        }

        let chain = self.builder.chain();
        let command = self.parser.parse(raw, |a| chain.is_valid_address(a))?;
        advance(reached, Stage::Sanitized);

        let credential = self.authorizer.authorize(sender, &command).await?;
        advance(reached, Stage::Authorized);

        // Never retried: each call is a new on-chain transaction.
        let submitted = self.builder.build_and_submit(&credential, &command).await;
        metrics::record_submission(submitted.is_ok());
        let hash = submitted?;
        advance(reached, Stage::Submitted);

        self.authorizer.record_accepted(sender).await;
        Ok(hash)
    }
}

fn advance(reached: &mut Stage, next: Stage) {
    tracing::debug!(from = %reached, to = %next, "Stage transition");
    *reached = next;
}
