//!
//! Action execution machinery: the controller view over chain state, the
//! per-transaction context with its fee pipeline and deadline checker, and
//! the per-action apply context that every host intrinsic operates through.
//!
//! WASM execution itself lives behind the [`CodeRunner`] seam; this crate
//! executes the built-in standard-token actions natively and queues
//! everything else for the runner.
//!

mod apply;
mod apply_db;
mod builtin;
mod controller;
mod iterator;
mod producer;
mod scheduler;
mod transaction;
mod vote;

pub use apply::{ApplyContext, ContextState};
pub use builtin::{BuiltinAction, IssuePayload, RedeemPayload, TransferPayload};
pub use controller::Controller;
pub use producer::set_proposed_producers;
pub use scheduler::{DeferredScheduler, InMemoryScheduler};
pub use transaction::{ActionTrace, TransactionContext};
pub use vote::{NullVoteLedger, TransactionVoteLedger, TxVoteStatForAccount};

use chain_ee::ChainError;

///
/// Runs the receiver's contract code for one action. Implemented by the
/// intrinsic dispatcher over a WASM backend; accounts without code get the
/// no-op runner (notification deliveries to plain accounts).
///
pub trait CodeRunner {
    fn apply(&mut self, context: &mut ApplyContext<'_, '_>) -> Result<(), ChainError>;
}

/// Delivers nothing; used for plain accounts and in tests that only
/// exercise built-in actions.
pub struct NoCodeRunner;

impl CodeRunner for NoCodeRunner {
    fn apply(&mut self, _context: &mut ApplyContext<'_, '_>) -> Result<(), ChainError> {
        Ok(())
    }
}
