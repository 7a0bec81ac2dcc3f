//!
//! The error taxonomy of the execution core.
//!
//! Every error here is fatal to the action that raised it: the apply
//! context discards the action's writes (including queued inline actions)
//! and the transaction controller decides what to do next. `Deadline` is
//! the one transaction-fatal member. There is no recoverable variant; the
//! dispatcher translates any of these into a module-exit trap.
//!

use crate::types::AccountName;
use core::fmt;

///
/// Internal error, should not be triggered by guest input.
///
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct InternalError(pub &'static str);

/// Error codes reserved for the system; guest `eosio_assert_code` may not
/// use anything at or above `GENERIC_SYSTEM_ERROR` (10^19, the EOSIO
/// `system_error_code::generic_system_error` value).
pub mod system_error_code {
    pub const GENERIC_SYSTEM_ERROR: u64 = 10_000_000_000_000_000_000;
    pub const CONTRACT_RESTRICTED_ERROR_CODE: u64 = 10_000_000_000_000_000_001;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Privileged or context-free gate rejected the caller.
    UnaccessibleApi(&'static str),
    /// Intrinsic argument validation, packed-data decode failure, float→int
    /// overflow, producer schedule validation.
    WasmExecution(String),
    /// Division or modulo by zero in the 128-bit builtins.
    Arithmetic(&'static str),
    /// Guest `eosio_assert` / `eosio_assert_message` with a false condition.
    AssertMessage(String),
    /// Guest `eosio_assert_code` with a non-reserved code.
    AssertCode(u64),
    /// Guest `eosio_assert_code` with a reserved code; the payload carries
    /// the substituted `contract_restricted_error_code`.
    RestrictedErrorCode { substituted: u64 },
    /// Guest called `abort()`.
    AbortCalled,
    /// Hash mismatch or recovered-key mismatch.
    CryptoApi(&'static str),
    /// Key type beyond the activated protocol range.
    UnactivatedKeyType,
    /// Signature type beyond the activated protocol range.
    UnactivatedSignatureType,
    /// `checktime` deadline expiry. Fatal to the whole transaction.
    Deadline,
    /// Token balance row missing or smaller than the subtracted value.
    InsufficientTokenBalance { account: AccountName },
    /// Balance mutation attempted by a receiver other than the token owner.
    InvalidTokenBalanceUpdateAccess(&'static str),
    /// Token metadata validation (symbol, url, description, no-op update).
    TokenMetaValidation(&'static str),
    /// Fee charging or fee table setup failure.
    TransactionFee(String),
    /// Packed inline action at or above `max_inline_action_size`.
    InlineActionTooBig,
    /// Subjective signature length cap exceeded during block production.
    SigVariableSizeLimit,
    /// Guest `memcpy` with aliasing regions.
    OverlappingMemory,
    /// Database iterator/table misuse.
    DbApi(String),
    /// Action-level validation outside the categories above.
    ActionValidate(String),
    /// Hardfork feature activation is not supported.
    UnsupportedFeature(&'static str),
    /// A bug in the core itself.
    Internal(InternalError),
}

impl ChainError {
    pub fn wasm_execution(msg: impl Into<String>) -> ChainError {
        ChainError::WasmExecution(msg.into())
    }

    pub fn db_api(msg: impl Into<String>) -> ChainError {
        ChainError::DbApi(msg.into())
    }

    /// True for the single transaction-fatal member of the taxonomy.
    pub fn is_transaction_fatal(&self) -> bool {
        matches!(self, ChainError::Deadline)
    }
}

impl From<InternalError> for ChainError {
    fn from(e: InternalError) -> Self {
        ChainError::Internal(e)
    }
}

impl From<crate::codec::CodecError> for ChainError {
    fn from(e: crate::codec::CodecError) -> Self {
        ChainError::WasmExecution(e.to_string())
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::UnaccessibleApi(msg) => write!(f, "unaccessible api: {msg}"),
            ChainError::WasmExecution(msg) => write!(f, "wasm execution error: {msg}"),
            ChainError::Arithmetic(msg) => write!(f, "arithmetic exception: {msg}"),
            ChainError::AssertMessage(msg) => {
                write!(f, "assertion failure with message: {msg}")
            }
            ChainError::AssertCode(code) => {
                write!(f, "assertion failure with error code: {code}")
            }
            ChainError::RestrictedErrorCode { substituted } => write!(
                f,
                "eosio_assert_code called with reserved error code, substituted: {substituted}"
            ),
            ChainError::AbortCalled => f.write_str("abort() called"),
            ChainError::CryptoApi(msg) => write!(f, "crypto api exception: {msg}"),
            ChainError::UnactivatedKeyType => f.write_str("unactivated key type used"),
            ChainError::UnactivatedSignatureType => {
                f.write_str("unactivated signature type used")
            }
            ChainError::Deadline => f.write_str("transaction deadline exceeded"),
            ChainError::InsufficientTokenBalance { account } => {
                write!(f, "account {account} has insufficient token balance")
            }
            ChainError::InvalidTokenBalanceUpdateAccess(msg) => f.write_str(msg),
            ChainError::TokenMetaValidation(msg) => f.write_str(msg),
            ChainError::TransactionFee(msg) => f.write_str(msg),
            ChainError::InlineActionTooBig => f.write_str("inline action too big"),
            ChainError::SigVariableSizeLimit => f.write_str(
                "signature variable length component size greater than subjective maximum",
            ),
            ChainError::OverlappingMemory => {
                f.write_str("memcpy can only accept non-aliasing pointers")
            }
            ChainError::DbApi(msg) => f.write_str(msg),
            ChainError::ActionValidate(msg) => f.write_str(msg),
            ChainError::UnsupportedFeature(msg) => f.write_str(msg),
            ChainError::Internal(e) => write!(f, "internal error: {}", e.0),
        }
    }
}

impl std::error::Error for ChainError {}
