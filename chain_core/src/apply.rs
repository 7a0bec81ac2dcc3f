//!
//! Per-action execution scope. Every host intrinsic acts on exactly one of
//! these: it carries the current receiver, the action and its
//! authorizations, the console buffer, the notification and inline queues,
//! and the database iterator registries.
//!

use crate::builtin::BuiltinAction;
use crate::iterator::{PrimaryCache, SecondaryCache};
use crate::transaction::{apply_ram_deltas, TransactionContext};
use crate::CodeRunner;
use chain_ee::types::{AccountName, Action, Name, PermissionName, TimePoint, Transaction};
use chain_ee::ChainError;
use state_store::ChainDatabase;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContextState {
    Created,
    Executing,
    Completed,
    Failed,
}

pub struct ApplyContext<'a, 'c> {
    pub(crate) trx_context: &'a mut TransactionContext<'c>,
    pub(crate) receiver: AccountName,
    pub(crate) act: Action,
    pub(crate) sender: AccountName,
    pub(crate) context_free: bool,
    pub(crate) privileged: bool,
    pub(crate) depth: u32,
    pub(crate) state: ContextState,
    pub(crate) console: String,
    pub(crate) notified: Vec<AccountName>,
    pub(crate) inline_actions: Vec<Action>,
    pub(crate) cf_inline_actions: Vec<Action>,
    pub(crate) primary_itr: PrimaryCache,
    pub(crate) secondary_itr: [SecondaryCache; 5],
}

impl<'a, 'c> ApplyContext<'a, 'c> {
    pub fn new(
        trx_context: &'a mut TransactionContext<'c>,
        receiver: AccountName,
        act: Action,
        sender: AccountName,
        context_free: bool,
        depth: u32,
    ) -> Self {
        let privileged = trx_context.controller.is_privileged(receiver);
        ApplyContext {
            trx_context,
            receiver,
            act,
            sender,
            context_free,
            privileged,
            depth,
            state: ContextState::Created,
            console: String::new(),
            notified: Vec::new(),
            inline_actions: Vec::new(),
            cf_inline_actions: Vec::new(),
            primary_itr: PrimaryCache::default(),
            secondary_itr: core::array::from_fn(|_| SecondaryCache::default()),
        }
    }

    ///
    /// Runs the receiver's handler for this action: the built-in token
    /// handlers when the receiver is the action's own account and the name
    /// is one of the standard set, the contract runner otherwise.
    ///
    pub fn exec_one(&mut self, runner: &mut dyn CodeRunner) -> Result<(), ChainError> {
        self.state = ContextState::Executing;
        let result = match BuiltinAction::parse(self.act.name) {
            Some(builtin) if self.receiver == self.act.account => {
                crate::builtin::apply(self, builtin)
            }
            _ => runner.apply(self),
        };
        self.state = match result {
            Ok(()) => ContextState::Completed,
            Err(_) => ContextState::Failed,
        };
        result
    }

    /// Dismantles the context into the work it queued for the transaction.
    pub(crate) fn into_outputs(self) -> (String, Vec<AccountName>, Vec<Action>, Vec<Action>) {
        (
            self.console,
            self.notified,
            self.cf_inline_actions,
            self.inline_actions,
        )
    }

    pub(crate) fn db(&mut self) -> &mut ChainDatabase {
        &mut self.trx_context.controller.db
    }

    pub(crate) fn dbr(&self) -> &ChainDatabase {
        &self.trx_context.controller.db
    }

    /// Read access to chain state for the intrinsic layer.
    pub fn chain_db(&self) -> &ChainDatabase {
        &self.trx_context.controller.db
    }

    /// Write access for intrinsics that bypass RAM billing (fee table,
    /// privileged configuration).
    pub fn chain_db_mut(&mut self) -> &mut ChainDatabase {
        &mut self.trx_context.controller.db
    }

    pub fn controller(&self) -> &crate::Controller {
        self.trx_context.controller
    }

    pub fn controller_mut(&mut self) -> &mut crate::Controller {
        self.trx_context.controller
    }

    // ---- identity and gates ----

    pub fn receiver(&self) -> AccountName {
        self.receiver
    }

    pub fn action(&self) -> &Action {
        &self.act
    }

    pub fn get_sender(&self) -> AccountName {
        self.sender
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn is_context_free(&self) -> bool {
        self.context_free
    }

    /// 1 for a top-level action, +1 per inline hop.
    pub fn recurse_depth(&self) -> u32 {
        self.depth
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    // ---- authorization ----

    pub fn has_authorization(&self, account: AccountName) -> bool {
        self.act
            .authorization
            .iter()
            .any(|level| level.actor == account)
    }

    pub fn require_authorization(&self, account: AccountName) -> Result<(), ChainError> {
        if self.has_authorization(account) {
            return Ok(());
        }
        Err(ChainError::ActionValidate(format!(
            "missing authority of {account}"
        )))
    }

    pub fn require_authorization2(
        &self,
        account: AccountName,
        permission: PermissionName,
    ) -> Result<(), ChainError> {
        if self
            .act
            .authorization
            .iter()
            .any(|level| level.actor == account && level.permission == permission)
        {
            return Ok(());
        }
        Err(ChainError::ActionValidate(format!(
            "missing authority of {account}/{permission}"
        )))
    }

    pub fn is_account(&self, account: AccountName) -> bool {
        self.dbr().is_account(account)
    }

    /// Schedules a notification: the same action re-applied with
    /// `recipient` as receiver, after this context completes. Duplicate
    /// requests collapse; notifying the receiver itself is a no-op.
    pub fn require_recipient(&mut self, recipient: AccountName) {
        if recipient != self.receiver && !self.notified.contains(&recipient) {
            self.notified.push(recipient);
        }
    }

    // ---- action data ----

    pub fn action_data(&self) -> &[u8] {
        &self.act.data
    }

    // ---- console ----

    pub fn console_append(&mut self, text: &str) {
        self.console.push_str(text);
    }

    pub fn console(&self) -> &str {
        &self.console
    }

    // ---- inline and deferred dispatch ----

    /// Queues an inline action; it executes after this action completes,
    /// within the same transaction. Size limits are enforced by the caller
    /// on the packed form.
    pub fn execute_inline(&mut self, act: Action) {
        self.inline_actions.push(act);
    }

    pub fn execute_context_free_inline(&mut self, act: Action) -> Result<(), ChainError> {
        if !act.authorization.is_empty() {
            return Err(ChainError::ActionValidate(
                "context-free actions cannot have authorizations".into(),
            ));
        }
        self.cf_inline_actions.push(act);
        Ok(())
    }

    pub fn schedule_deferred_transaction(
        &mut self,
        sender_id: u128,
        payer: AccountName,
        trx: Transaction,
        replace_existing: bool,
    ) -> Result<(), ChainError> {
        self.trx_context
            .controller
            .scheduler
            .schedule(sender_id, payer, trx, replace_existing)
    }

    pub fn cancel_deferred_transaction(&mut self, sender_id: u128) -> bool {
        self.trx_context.controller.scheduler.cancel(sender_id)
    }

    // ---- time and transaction access ----

    pub fn checktime(&self) -> Result<(), ChainError> {
        self.trx_context.checktime()
    }

    pub fn current_time(&self) -> TimePoint {
        self.trx_context.controller.pending_block_time
    }

    pub fn publication_time(&self) -> TimePoint {
        self.trx_context.published
    }

    pub fn expiration(&self) -> u32 {
        self.trx_context.trx.header.expiration.secs()
    }

    pub fn tapos_block_num(&self) -> u16 {
        self.trx_context.trx.header.ref_block_num
    }

    pub fn tapos_block_prefix(&self) -> u32 {
        self.trx_context.trx.header.ref_block_prefix
    }

    pub fn packed_transaction(&self) -> &[u8] {
        self.trx_context.packed_transaction()
    }

    /// Packed action by kind: 0 = context-free actions, 1 = actions.
    pub fn get_action(&self, kind: u32, index: u32) -> Option<&Action> {
        let list = match kind {
            0 => &self.trx_context.trx.context_free_actions,
            1 => &self.trx_context.trx.actions,
            _ => return None,
        };
        list.get(index as usize)
    }

    pub fn get_context_free_data(&self, index: u32) -> Option<&[u8]> {
        self.trx_context.context_free_data(index as usize)
    }

    pub fn transaction_fee_payer(&self) -> AccountName {
        self.trx_context.fee_payer
    }

    // ---- resource billing ----

    /// Bills `delta` RAM bytes to `payer` and marks the account for
    /// end-of-transaction limit validation.
    pub fn add_ram_usage(&mut self, payer: AccountName, delta: i64) {
        if payer == Name(0) {
            return;
        }
        let TransactionContext {
            controller,
            validate_ram_accounts,
            ..
        } = &mut *self.trx_context;
        apply_ram_deltas(&mut controller.db, validate_ram_accounts, &[(payer, delta)]);
    }
}
