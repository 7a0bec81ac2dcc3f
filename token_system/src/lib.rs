//!
//! Standard token accounting and transaction-fee management.
//!
//! The standard token manager keeps per-token metadata and balances and
//! drives fee collection by walking the weighted system-token list; the fee
//! table manager resolves `(code, action)` fee rows with per-action and
//! global fallbacks. Both operate on rows owned by the state store.
//!

mod fee_table;
mod snapshot;
mod standard_token;

pub use fee_table::{
    get_tx_fee_for_action, set_default_tx_fee, set_tx_fee_for_action,
    set_tx_fee_for_common_action, unset_tx_fee_entry_for_action, TxFeeForAction,
};
pub use snapshot::{add_to_snapshot, read_from_snapshot};
pub use standard_token::{
    add_token_balance, apply_txfee, get_system_token_count, get_token_balance, get_token_symbol,
    get_token_total_supply, issue_token, pay_transaction_fee, retire_token, set_system_token_list,
    set_token_meta_info, subtract_token_balance, transfer_token, update_token_total_supply,
    SetTokenMeta, TxFeePayload,
};

use chain_ee::types::{AccountName, Asset};
use chain_ee::ChainError;
use state_store::ChainDatabase;

///
/// What the token manager needs from the action scope it runs in: the
/// current receiver (balance mutations are gated on it) and RAM billing.
///
pub trait ApplyScope {
    fn receiver(&self) -> AccountName;
    fn add_ram_usage(&mut self, payer: AccountName, delta: i64);
}

///
/// Dispatches the inline `txfee` action that materializes one fee charge.
/// Implemented by the transaction context; the dispatch happens in the
/// middle of the paying action and shares its atomicity. The database is
/// lent back so the dispatched action's writes are visible to the rest of
/// the fee walk.
///
pub trait InlineFeeDispatcher {
    fn dispatch_txfee(
        &mut self,
        db: &mut ChainDatabase,
        token_id: AccountName,
        fee_payer: AccountName,
        fee: Asset,
    ) -> Result<(), ChainError>;
}
