//! Static sender → signing credential lookup.

use std::collections::HashMap;

use crate::blockchain::types::BlockchainResult;
use crate::blockchain::wallet::Credential;
use crate::config::SenderConfig;

/// Read-only registry of senders allowed to transact.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credentials: HashMap<String, Credential>,
}

impl CredentialStore {
    /// Build from explicit `(sender, credential)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Credential)>,
    {
        Self {
            credentials: pairs.into_iter().collect(),
        }
    }

    /// Load every configured sender's key from its environment variable.
    ///
    /// Fails on the first missing or unparsable key.
    pub fn from_config(senders: &[SenderConfig]) -> BlockchainResult<Self> {
        let mut credentials = HashMap::with_capacity(senders.len());
        for sender in senders {
            let credential = Credential::from_env(&sender.private_key_env)?;
            tracing::info!(
                sender = %sender.id,
                address = %credential.address(),
                "Registered sender"
            );
            credentials.insert(sender.id.clone(), credential);
        }
        Ok(Self { credentials })
    }

    /// Credential registered for `sender`.
    pub fn get(&self, sender: &str) -> Option<&Credential> {
        self.credentials.get(sender)
    }

    /// Number of registered senders.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no sender is registered.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
