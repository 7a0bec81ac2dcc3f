//!
//! The controller view: chain state plus the runtime knobs and collaborator
//! handles the intrinsic layer reaches through.
//!

use crate::scheduler::{DeferredScheduler, InMemoryScheduler};
use crate::vote::{NullVoteLedger, TransactionVoteLedger};
use chain_ee::logger::{Logger, NullLogger};
use chain_ee::types::{AccountName, TimePoint};
use chain_ee::ChainError;
use state_store::ChainDatabase;

/// Default subjective cap on signature variable-length components while
/// producing a block.
pub const DEFAULT_SIG_VARIABLE_SIZE_LIMIT: usize = 24;

pub struct Controller {
    pub db: ChainDatabase,
    pub pending_block_time: TimePoint,
    /// When false, the console intrinsics drop their output.
    pub contracts_console: bool,
    /// Subjective checks (signature length cap) only apply while producing.
    pub producing_block: bool,
    pub sig_variable_size_limit: usize,
    /// How many key/signature type discriminators the protocol accepts.
    pub num_supported_key_types: u8,
    pub scheduler: Box<dyn DeferredScheduler>,
    pub vote_ledger: Box<dyn TransactionVoteLedger>,
    /// Host-side diagnostics sink; consensus state never depends on it.
    pub logger: Box<dyn Logger>,
    activated_features: Vec<[u8; 32]>,
    preactivated_features: Vec<[u8; 32]>,
}

impl Default for Controller {
    fn default() -> Self {
        Controller {
            db: ChainDatabase::new(),
            pending_block_time: TimePoint(0),
            contracts_console: true,
            producing_block: false,
            sig_variable_size_limit: DEFAULT_SIG_VARIABLE_SIZE_LIMIT,
            num_supported_key_types: chain_ee::config::GENESIS_NUM_SUPPORTED_KEY_TYPES,
            scheduler: Box::new(InMemoryScheduler::new()),
            vote_ledger: Box::new(NullVoteLedger),
            logger: Box::new(NullLogger),
            activated_features: Vec::new(),
            preactivated_features: Vec::new(),
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_privileged(&self, account: AccountName) -> bool {
        self.db
            .account(account)
            .map(|meta| meta.is_privileged())
            .unwrap_or(false)
    }

    pub fn is_protocol_feature_activated(&self, digest: [u8; 32]) -> bool {
        self.activated_features.contains(&digest)
    }

    pub fn preactivate_feature(&mut self, digest: [u8; 32]) -> Result<(), ChainError> {
        if self.activated_features.contains(&digest) || self.preactivated_features.contains(&digest)
        {
            return Err(ChainError::ActionValidate(
                "protocol feature was already activated or pre-activated".into(),
            ));
        }
        self.preactivated_features.push(digest);
        Ok(())
    }

    /// Adoption of a pre-activated feature, driven by the block loop.
    pub fn activate_feature_digest(&mut self, digest: [u8; 32]) {
        self.preactivated_features.retain(|d| d != &digest);
        self.activated_features.push(digest);
    }

    ///
    /// Updates an account's resource limits. Returns true when a limit was
    /// decreased, in which case usage must be re-validated at the end of
    /// the transaction. New values take effect at the next resource tick.
    ///
    pub fn set_account_limits(
        &mut self,
        account: AccountName,
        ram_bytes: i64,
        net_weight: i64,
        cpu_weight: i64,
    ) -> Result<bool, ChainError> {
        let current = self
            .db
            .account(account)
            .copied()
            .ok_or_else(|| ChainError::ActionValidate(format!("unknown account {account}")))?;
        let decreased = ram_bytes >= 0 && (current.ram_limit < 0 || ram_bytes < current.ram_limit);
        self.db.modify_account(account, |meta| {
            meta.ram_limit = ram_bytes;
            meta.net_weight = net_weight;
            meta.cpu_weight = cpu_weight;
        });
        Ok(decreased)
    }

    pub fn get_account_limits(
        &self,
        account: AccountName,
    ) -> Result<(i64, i64, i64), ChainError> {
        let meta = self
            .db
            .account(account)
            .ok_or_else(|| ChainError::ActionValidate(format!("unknown account {account}")))?;
        Ok((meta.ram_limit, meta.net_weight, meta.cpu_weight))
    }

    /// RAM usage of `account` must not exceed its limit.
    pub fn validate_ram_usage(&self, account: AccountName) -> Result<(), ChainError> {
        if let Some(meta) = self.db.account(account) {
            if meta.ram_limit >= 0 && meta.ram_usage > meta.ram_limit {
                return Err(ChainError::ActionValidate(format!(
                    "account {account} has insufficient ram"
                )));
            }
        }
        Ok(())
    }

    pub fn active_producers(&self) -> Vec<AccountName> {
        self.db.global().active_producers.clone()
    }
}
