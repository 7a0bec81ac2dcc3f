//!
//! Deferred-transaction scheduling seam. Ordering and retirement of
//! deferred transactions belongs to the block-production loop; the core
//! only hands them over (and cancels by sender id).
//!

use chain_ee::types::{AccountName, Transaction};
use chain_ee::ChainError;
use std::collections::BTreeMap;

pub trait DeferredScheduler {
    fn schedule(
        &mut self,
        sender_id: u128,
        payer: AccountName,
        trx: Transaction,
        replace_existing: bool,
    ) -> Result<(), ChainError>;

    /// True when a pending transaction with this sender id was removed.
    fn cancel(&mut self, sender_id: u128) -> bool;
}

/// Holds scheduled transactions until the block loop drains them.
#[derive(Default)]
pub struct InMemoryScheduler {
    pending: BTreeMap<u128, (AccountName, Transaction)>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl DeferredScheduler for InMemoryScheduler {
    fn schedule(
        &mut self,
        sender_id: u128,
        payer: AccountName,
        trx: Transaction,
        replace_existing: bool,
    ) -> Result<(), ChainError> {
        if self.pending.contains_key(&sender_id) && !replace_existing {
            return Err(ChainError::ActionValidate(
                "deferred transaction with the same sender id already exists".into(),
            ));
        }
        self.pending.insert(sender_id, (payer, trx));
        Ok(())
    }

    fn cancel(&mut self, sender_id: u128) -> bool {
        self.pending.remove(&sender_id).is_some()
    }
}
