//!
//! Chain configuration and the consensus constants of the core.
//!

use crate::errors::ChainError;
use crate::types::{name_from_str, Name};

/// Account that owns the privileged system contract.
pub const SYSTEM_ACCOUNT: Name = name_from_str("eosio");
/// Default permission used when the core dispatches fee actions.
pub const ACTIVE_PERMISSION: Name = name_from_str("active");

/// Name of the built-in fee-charging action dispatched by the token manager.
pub const TXFEE_ACTION: Name = name_from_str("txfee");

/// Key and signature types available from genesis (K1, R1).
pub const GENESIS_NUM_SUPPORTED_KEY_TYPES: u8 = 2;

/// Block interval between incremental-hash yields to the deadline checker.
pub const HASHING_CHECKTIME_BLOCK_SIZE: u32 = 10 * 1024;

/// Upper bound on the producer schedule length.
pub const MAX_PRODUCERS: usize = 125;

/// Upper bound on the weighted fee-token list.
pub const MAX_SYSTEM_TOKENS: usize = 5;

/// Baseline fee weight: a token with weight `1x` is charged 1:1.
pub const TOKEN_WEIGHT_1X: i64 = 10_000;

/// Fee applied when no `(code, action)`, per-action or global row exists.
pub const DEFAULT_TX_FEE_VALUE: i64 = 10_000;

/// Cap on guest assert messages copied out of linear memory.
pub const MAX_ASSERT_MESSAGE: usize = 1024;

// RAM billing overheads. Each stored row is billed for its payload plus the
// bookkeeping bytes of the indices that reference it.
pub const OVERHEAD_PER_ROW_PER_INDEX_RAM_BYTES: i64 = 32;
pub const BILLABLE_SIZE_TABLE: i64 = 44 + 2 * OVERHEAD_PER_ROW_PER_INDEX_RAM_BYTES;
pub const BILLABLE_SIZE_ROW: i64 = 112;
pub const BILLABLE_SIZE_TOKEN_META: i64 = 320;
pub const BILLABLE_SIZE_TOKEN_BALANCE: i64 = 144;

///
/// Consensus-configurable parameters, set by the privileged
/// `set_blockchain_parameters_packed` intrinsic.
///
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainConfig {
    pub max_block_net_usage: u64,
    pub max_transaction_net_usage: u32,
    pub max_block_cpu_usage: u32,
    pub max_transaction_cpu_usage: u32,
    pub max_inline_action_size: u32,
    pub max_inline_action_depth: u16,
    pub max_authority_depth: u16,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            max_block_net_usage: 1024 * 1024,
            max_transaction_net_usage: 512 * 1024,
            max_block_cpu_usage: 200_000,
            max_transaction_cpu_usage: 150_000,
            max_inline_action_size: 4096,
            max_inline_action_depth: 4,
            max_authority_depth: 6,
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.max_transaction_net_usage as u64 >= self.max_block_net_usage {
            return Err(ChainError::ActionValidate(
                "transaction net usage limit must be less than the block limit".into(),
            ));
        }
        if self.max_transaction_cpu_usage >= self.max_block_cpu_usage {
            return Err(ChainError::ActionValidate(
                "transaction cpu usage limit must be less than the block limit".into(),
            ));
        }
        if self.max_inline_action_size == 0 || self.max_inline_action_depth == 0 {
            return Err(ChainError::ActionValidate(
                "inline action limits must be positive".into(),
            ));
        }
        Ok(())
    }
}

use crate::codec::{CodecError, Pack, Unpack};

impl Pack for ChainConfig {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.max_block_net_usage.pack_into(out);
        self.max_transaction_net_usage.pack_into(out);
        self.max_block_cpu_usage.pack_into(out);
        self.max_transaction_cpu_usage.pack_into(out);
        self.max_inline_action_size.pack_into(out);
        self.max_inline_action_depth.pack_into(out);
        self.max_authority_depth.pack_into(out);
    }
}

impl Unpack for ChainConfig {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(ChainConfig {
            max_block_net_usage: u64::unpack_from(input)?,
            max_transaction_net_usage: u32::unpack_from(input)?,
            max_block_cpu_usage: u32::unpack_from(input)?,
            max_transaction_cpu_usage: u32::unpack_from(input)?,
            max_inline_action_size: u32::unpack_from(input)?,
            max_inline_action_depth: u16::unpack_from(input)?,
            max_authority_depth: u16::unpack_from(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChainConfig::default().validate().is_ok());
    }

    #[test]
    fn config_roundtrip() {
        let cfg = ChainConfig::default();
        assert_eq!(ChainConfig::unpack_all(&cfg.packed()).unwrap(), cfg);
    }

    #[test]
    fn rejects_inverted_limits() {
        let cfg = ChainConfig {
            max_transaction_cpu_usage: 500_000,
            ..ChainConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
