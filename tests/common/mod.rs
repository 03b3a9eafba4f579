//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use payment_gateway::blockchain::{
    is_valid_address, BlockchainError, ChainClient, Credential, TxBuilder,
};
use payment_gateway::blockchain::types::BlockchainResult;
use payment_gateway::bus::BusPublisher;
use payment_gateway::command::{Action, CommandParser};
use payment_gateway::dispatch::Dispatcher;
use payment_gateway::routing::{DeliveryError, ReplyRouter, Telephony};
use payment_gateway::security::rate_limit::window_key;
use payment_gateway::security::{
    Authorizer, CounterStore, CredentialStore, MemoryCounterStore, RateLimiter,
};
use rust_decimal::Decimal;

/// Anvil's first development key.
pub const SENDER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const PHONE_SENDER: &str = "+15551234567";
pub const BUS_SENDER: &str = "payment/requests";
pub const RESPONSE_TOPIC: &str = "payment/requests/response";
pub const RECIPIENT: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

/// Chain client that signs for real and counts broadcasts.
#[derive(Default)]
pub struct FakeChain {
    pub submits: AtomicU32,
    pub calls: AtomicU32,
    pub fail_submit: AtomicBool,
    pub unhealthy: AtomicBool,
    /// Milliseconds `submit` holds before answering.
    pub submit_delay_ms: AtomicU64,
}

impl FakeChain {
    pub fn submits(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    /// Every chain call, reads included.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn get_nonce(&self, _address: Address) -> BlockchainResult<u64> {
        self.touch();
        Ok(u64::from(self.submits()))
    }
    async fn get_fee_rate(&self) -> BlockchainResult<u128> {
        self.touch();
        Ok(1_000_000_000)
    }
    async fn get_chain_id(&self) -> BlockchainResult<u64> {
        self.touch();
        Ok(31337)
    }
    async fn estimate_gas(&self, _tx: &TransactionRequest) -> BlockchainResult<u64> {
        self.touch();
        Ok(21_000)
    }
    async fn sign(
        &self,
        tx: TransactionRequest,
        credential: &Credential,
    ) -> BlockchainResult<Bytes> {
        self.touch();
        credential.sign_transaction(tx).await
    }
    async fn submit(&self, _signed_tx: Bytes) -> BlockchainResult<TxHash> {
        self.touch();
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.submit_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BlockchainError::Rpc("nonce too low".to_string()));
        }
        Ok(B256::left_padding_from(&n.to_be_bytes()))
    }
    fn is_valid_address(&self, candidate: &str) -> bool {
        is_valid_address(candidate)
    }
    async fn is_healthy(&self) -> bool {
        !self.unhealthy.load(Ordering::SeqCst)
    }
}

/// Telephony capability that records what it was asked to send.
///
/// With `fail` set every send is refused and nothing is recorded.
#[derive(Default)]
pub struct RecordingTelephony {
    pub sent: Mutex<Vec<(String, String)>>,
    pub attempts: AtomicU32,
    pub fail: AtomicBool,
}

impl RecordingTelephony {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Telephony for RecordingTelephony {
    async fn send_message(&self, to: &str, text: &str) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Telephony("HTTP 503".to_string()));
        }
        self.sent.lock().unwrap().push((to.to_string(), text.to_string()));
        Ok(())
    }
}

/// Bus capability that records published payloads.
///
/// With `fail` set every publish is refused and nothing is recorded.
#[derive(Default)]
pub struct RecordingBus {
    pub published: Mutex<Vec<(String, String)>>,
    pub attempts: AtomicU32,
    pub fail: AtomicBool,
}

impl RecordingBus {
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BusPublisher for RecordingBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Bus("connection reset".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

/// A dispatcher wired entirely to fakes.
pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub chain: Arc<FakeChain>,
    pub telephony: Arc<RecordingTelephony>,
    pub bus: Arc<RecordingBus>,
    pub store: Arc<MemoryCounterStore>,
}

impl Harness {
    /// Gateway allowing `calls` accepted requests per minute for the phone
    /// and bus senders.
    pub fn new(calls: u64) -> Self {
        let credential = Credential::from_private_key(SENDER_KEY).unwrap();
        let credentials = Arc::new(CredentialStore::from_pairs([
            (PHONE_SENDER.to_string(), credential.clone()),
            (BUS_SENDER.to_string(), credential),
        ]));

        let store = Arc::new(MemoryCounterStore::new());
        let limiter = RateLimiter::new(store.clone(), calls, Duration::from_secs(60));

        let chain = Arc::new(FakeChain::default());
        let telephony = Arc::new(RecordingTelephony::default());
        let bus = Arc::new(RecordingBus::default());

        let dispatcher = Dispatcher::new(
            CommandParser::new(vec![Action::Pay, Action::Transfer], Decimal::from(100)),
            Authorizer::new(credentials, limiter),
            TxBuilder::new(chain.clone(), Duration::from_secs(5), None),
            ReplyRouter::new(telephony.clone(), bus.clone(), RESPONSE_TOPIC, 160),
        );

        Self {
            dispatcher: Arc::new(dispatcher),
            chain,
            telephony,
            bus,
            store,
        }
    }

    /// Accepted requests counted for `sender` in the current window.
    pub async fn counted(&self, sender: &str) -> u64 {
        self.store.get(&window_key(sender)).await.unwrap()
    }

    /// Replies delivered on either channel.
    pub fn replies(&self) -> usize {
        self.telephony.sent().len() + self.bus.published().len()
    }

    /// Delivery attempts on either channel, refused ones included.
    pub fn reply_attempts(&self) -> u32 {
        self.telephony.attempts() + self.bus.attempts()
    }
}

pub fn pay(amount: &str) -> String {
    format!("PAY {} {}", amount, RECIPIENT)
}
