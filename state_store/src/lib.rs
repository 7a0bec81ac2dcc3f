//!
//! The transactional state store.
//!
//! One `ChainDatabase` owns every consensus row: contract tables with their
//! primary and typed secondary indices, the account registry, global chain
//! properties, token metadata and balances, the weighted system-token list
//! and the per-action fee table. All mutation goes through methods that
//! record the prior state in the topmost undo layer, so an action (or a
//! whole transaction) can be reverted by unwinding layers in reverse order.
//!

mod database;
mod index;
mod objects;

pub use database::{ChainDatabase, TableId, UndoDepth};
pub use index::{IndexKind, SecondaryValue, SortKey};
pub use objects::{
    AccountFlags, AccountMetadata, GlobalPropertyObject, ProposedSchedule, RowValue, SystemToken,
    SystemTokenListObject, TableKey, TableMeta, TokenBalanceObject, TokenMetaObject,
    TransactionFeeObject, FEE_TYPE_FIXED_PER_ACTION,
};
