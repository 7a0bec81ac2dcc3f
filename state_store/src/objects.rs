//!
//! The consensus row types held by the database.
//!

use chain_ee::codec::{CodecError, Pack, Unpack, VarUint32};
use chain_ee::config::TOKEN_WEIGHT_1X;
use chain_ee::types::{AccountName, ActionName, Name, ProducerAuthority, Symbol, TimePoint};

bitflags::bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct AccountFlags: u8 {
        const PRIVILEGED = 0x01;
    }
}

///
/// Per-account bookkeeping: privilege flag, creation time, resource limits
/// (`-1` means unlimited) and the RAM bytes currently billed to the account.
///
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AccountMetadata {
    pub name: AccountName,
    pub flags: AccountFlags,
    pub creation_time: TimePoint,
    /// Hash of the deployed contract, if any.
    pub code_hash: Option<[u8; 32]>,
    pub ram_limit: i64,
    pub net_weight: i64,
    pub cpu_weight: i64,
    pub ram_usage: i64,
}

impl AccountMetadata {
    pub fn new(name: AccountName, creation_time: TimePoint) -> Self {
        AccountMetadata {
            name,
            flags: AccountFlags::empty(),
            creation_time,
            code_hash: None,
            ram_limit: -1,
            net_weight: -1,
            cpu_weight: -1,
            ram_usage: 0,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.flags.contains(AccountFlags::PRIVILEGED)
    }

    pub fn set_privileged(&mut self, privileged: bool) {
        self.flags.set(AccountFlags::PRIVILEGED, privileged);
    }
}

/// Identity of one contract table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct TableKey {
    pub code: Name,
    pub scope: Name,
    pub table: Name,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TableMeta {
    pub key: TableKey,
    pub payer: AccountName,
    pub row_count: u32,
}

/// One primary-index row: opaque contract bytes billed to `payer`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RowValue {
    pub payer: AccountName,
    pub value: Vec<u8>,
}

///
/// Token metadata, one row per token account. The symbol is immutable once
/// the row exists.
///
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TokenMetaObject {
    pub token_id: AccountName,
    pub symbol: Symbol,
    pub total_supply: i64,
    pub url: String,
    pub description: String,
}

/// `(token, account)` balance row; zero balances are removed, never stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TokenBalanceObject {
    pub token_id: AccountName,
    pub account: AccountName,
    pub balance: i64,
}

/// A fee-payment token with its relative weight (`TOKEN_WEIGHT_1X` = 1:1).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SystemToken {
    pub token_id: AccountName,
    pub token_weight: i64,
}

impl SystemToken {
    pub fn valid(&self) -> bool {
        !self.token_id.empty() && self.token_weight > 0
    }

    pub const fn weight_1x() -> i64 {
        TOKEN_WEIGHT_1X
    }
}

/// The curated system-token list plus its monotonically increasing version.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SystemTokenListObject {
    pub version: i64,
    pub tokens: Vec<SystemToken>,
}

pub const FEE_TYPE_FIXED_PER_ACTION: u32 = 1;

/// A `(code, action)` fee row; `(0, action)` and `(0, 0)` are the fallback
/// sentinel keys.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TransactionFeeObject {
    pub code: AccountName,
    pub action: ActionName,
    pub value: i64,
    pub fee_type: u32,
}

/// A proposed producer schedule waiting for adoption by the block loop.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProposedSchedule {
    pub version: u64,
    pub producers: Vec<ProducerAuthority>,
}

///
/// Singleton global state: chain configuration and producer schedules.
///
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GlobalPropertyObject {
    pub config: chain_ee::config::ChainConfig,
    pub active_producers: Vec<AccountName>,
    pub schedule_version: u64,
    pub proposed_schedule: Option<ProposedSchedule>,
}

impl Pack for SystemToken {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.token_id.pack_into(out);
        self.token_weight.pack_into(out);
    }
}

impl Unpack for SystemToken {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(SystemToken {
            token_id: AccountName::unpack_from(input)?,
            token_weight: i64::unpack_from(input)?,
        })
    }
}

impl Pack for Vec<SystemToken> {
    fn pack_into(&self, out: &mut Vec<u8>) {
        VarUint32(self.len() as u32).pack_into(out);
        for token in self {
            token.pack_into(out);
        }
    }
}

impl Unpack for Vec<SystemToken> {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        let len = VarUint32::unpack_from(input)?.0 as usize;
        if len > input.len() {
            return Err(CodecError::LengthOutOfBounds);
        }
        let mut tokens = Vec::with_capacity(len);
        for _ in 0..len {
            tokens.push(SystemToken::unpack_from(input)?);
        }
        Ok(tokens)
    }
}

impl Pack for TokenMetaObject {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.token_id.pack_into(out);
        self.symbol.pack_into(out);
        self.total_supply.pack_into(out);
        self.url.pack_into(out);
        self.description.pack_into(out);
    }
}

impl Unpack for TokenMetaObject {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TokenMetaObject {
            token_id: AccountName::unpack_from(input)?,
            symbol: Symbol::unpack_from(input)?,
            total_supply: i64::unpack_from(input)?,
            url: String::unpack_from(input)?,
            description: String::unpack_from(input)?,
        })
    }
}

impl Pack for TokenBalanceObject {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.token_id.pack_into(out);
        self.account.pack_into(out);
        self.balance.pack_into(out);
    }
}

impl Unpack for TokenBalanceObject {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TokenBalanceObject {
            token_id: AccountName::unpack_from(input)?,
            account: AccountName::unpack_from(input)?,
            balance: i64::unpack_from(input)?,
        })
    }
}

impl Pack for TransactionFeeObject {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.code.pack_into(out);
        self.action.pack_into(out);
        self.value.pack_into(out);
        self.fee_type.pack_into(out);
    }
}

impl Unpack for TransactionFeeObject {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TransactionFeeObject {
            code: AccountName::unpack_from(input)?,
            action: ActionName::unpack_from(input)?,
            value: i64::unpack_from(input)?,
            fee_type: u32::unpack_from(input)?,
        })
    }
}
