//!
//! Per-transaction execution scope: deadline checking, the fee pipeline,
//! action dispatch and transaction-wide rollback.
//!

use crate::apply::ApplyContext;
use crate::controller::Controller;
use crate::CodeRunner;
use chain_ee::codec::Pack;
use chain_ee::config::{ACTIVE_PERMISSION, TXFEE_ACTION};
use chain_ee::logger::Logger;
use chain_ee::types::{
    AccountName, Action, Asset, Name, PermissionLevel, TimePoint, Transaction,
};
use chain_ee::ChainError;
use core::fmt::Write;
use state_store::ChainDatabase;
use std::collections::BTreeSet;
use std::time::Instant;
use token_system::{ApplyScope, InlineFeeDispatcher, TxFeePayload};

/// Execution record of one applied action.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActionTrace {
    pub receiver: AccountName,
    pub act: Action,
    pub console: String,
}

pub struct TransactionContext<'c> {
    pub controller: &'c mut Controller,
    pub trx: Transaction,
    packed_trx: Vec<u8>,
    context_free_data: Vec<Vec<u8>>,
    pub published: TimePoint,
    deadline: Option<Instant>,
    pub fee_payer: AccountName,
    pub traces: Vec<ActionTrace>,
    pub validate_ram_accounts: BTreeSet<AccountName>,
    undo_depth: state_store::UndoDepth,
    finished: bool,
}

impl<'c> TransactionContext<'c> {
    pub fn new(controller: &'c mut Controller, trx: Transaction, published: TimePoint) -> Self {
        let packed_trx = trx.packed();
        let fee_payer = trx.first_authorizer().unwrap_or(Name(0));
        let undo_depth = controller.db.push_undo_layer();
        TransactionContext {
            controller,
            trx,
            packed_trx,
            context_free_data: Vec::new(),
            published,
            deadline: None,
            fee_payer,
            traces: Vec::new(),
            validate_ram_accounts: BTreeSet::new(),
            undo_depth,
            finished: false,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_context_free_data(mut self, data: Vec<Vec<u8>>) -> Self {
        self.context_free_data = data;
        self
    }

    /// Cooperative deadline check; expiry is fatal to the transaction.
    pub fn checktime(&self) -> Result<(), ChainError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() > deadline {
                return Err(ChainError::Deadline);
            }
        }
        Ok(())
    }

    pub fn packed_transaction(&self) -> &[u8] {
        &self.packed_trx
    }

    pub fn context_free_data(&self, index: usize) -> Option<&[u8]> {
        self.context_free_data.get(index).map(Vec::as_slice)
    }

    ///
    /// Runs every action of the transaction in order (context-free actions
    /// first), then charges the per-action fees to the fee payer.
    ///
    pub fn exec(&mut self, runner: &mut dyn CodeRunner) -> Result<(), ChainError> {
        for act in self.trx.context_free_actions.clone() {
            self.execute_action(act.account, act, runner, Name(0), true, 1)?;
        }
        for act in self.trx.actions.clone() {
            self.execute_action(act.account, act, runner, Name(0), false, 1)?;
        }
        self.charge_transaction_fees()
    }

    ///
    /// Applies one action under its own undo layer: the receiver's code (or
    /// built-in handler) runs first, then the recipients it notified, then
    /// the inline actions it queued. Any failure reverts the whole subtree.
    ///
    pub fn execute_action(
        &mut self,
        receiver: AccountName,
        act: Action,
        runner: &mut dyn CodeRunner,
        sender: AccountName,
        context_free: bool,
        depth: u32,
    ) -> Result<(), ChainError> {
        let max_depth = self.controller.db.global().config.max_inline_action_depth as u32;
        if depth > max_depth {
            return Err(ChainError::ActionValidate(
                "max inline action depth per transaction reached".into(),
            ));
        }
        self.checktime()?;
        let undo = self.controller.db.push_undo_layer();
        match self.execute_action_subtree(receiver, &act, runner, sender, context_free, depth) {
            Ok(()) => {
                self.controller.db.commit(undo);
                Ok(())
            }
            Err(error) => {
                self.controller.db.revert(undo);
                let logger = &mut self.controller.logger;
                let _ = write!(
                    logger,
                    "applying {}::{} to {} failed: {}\n",
                    act.account, act.name, receiver, error
                );
                let _ = logger.log_data(&act.data);
                Err(error)
            }
        }
    }

    fn execute_action_subtree(
        &mut self,
        receiver: AccountName,
        act: &Action,
        runner: &mut dyn CodeRunner,
        sender: AccountName,
        context_free: bool,
        depth: u32,
    ) -> Result<(), ChainError> {
        let (result, console, notified, cf_inlines, inlines) = {
            let mut context =
                ApplyContext::new(self, receiver, act.clone(), sender, context_free, depth);
            let result = context.exec_one(runner);
            let (console, notified, cf_inlines, inlines) = context.into_outputs();
            (result, console, notified, cf_inlines, inlines)
        };
        self.traces.push(ActionTrace {
            receiver,
            act: act.clone(),
            console,
        });
        result?;

        for recipient in notified {
            self.execute_action(recipient, act.clone(), runner, sender, context_free, depth)?;
        }
        for inline in cf_inlines {
            self.execute_action(inline.account, inline, runner, receiver, true, depth + 1)?;
        }
        for inline in inlines {
            self.execute_action(inline.account, inline, runner, receiver, false, depth + 1)?;
        }
        Ok(())
    }

    ///
    /// Sums the configured fee of every declared action and charges the fee
    /// payer across the system-token list.
    ///
    pub fn charge_transaction_fees(&mut self) -> Result<(), ChainError> {
        let mut total: i64 = 0;
        for act in &self.trx.actions {
            let fee =
                token_system::get_tx_fee_for_action(&self.controller.db, act.account, act.name);
            total = total.saturating_add(fee.value);
        }
        if total == 0 {
            return Ok(());
        }
        let fee_payer = self.fee_payer;
        let mut dispatch = TxFeeDispatch {
            traces: &mut self.traces,
            validate_ram_accounts: &mut self.validate_ram_accounts,
        };
        let result =
            token_system::pay_transaction_fee(&mut self.controller.db, &mut dispatch, fee_payer, total);
        if let Err(error) = &result {
            let _ = write!(
                self.controller.logger,
                "charging {total} to {fee_payer} failed: {error}\n"
            );
        }
        result
    }

    /// Commits the transaction-level undo layer; all writes stay.
    pub fn finalize(mut self) -> Result<Vec<ActionTrace>, ChainError> {
        for account in self.validate_ram_accounts.clone() {
            self.controller.validate_ram_usage(account)?;
        }
        self.controller.db.commit(self.undo_depth);
        self.finished = true;
        Ok(std::mem::take(&mut self.traces))
    }

    /// Reverts every write of the transaction, including inline actions.
    pub fn abort(mut self) {
        self.controller.db.revert(self.undo_depth);
        self.finished = true;
    }
}

impl Drop for TransactionContext<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.controller.db.revert(self.undo_depth);
        }
    }
}

/// Minimal action scope for natively executed token actions.
pub(crate) struct NativeScope {
    pub receiver: AccountName,
    pub ram_deltas: Vec<(AccountName, i64)>,
}

impl NativeScope {
    pub fn new(receiver: AccountName) -> Self {
        NativeScope {
            receiver,
            ram_deltas: Vec::new(),
        }
    }
}

impl ApplyScope for NativeScope {
    fn receiver(&self) -> AccountName {
        self.receiver
    }

    fn add_ram_usage(&mut self, payer: AccountName, delta: i64) {
        self.ram_deltas.push((payer, delta));
    }
}

pub(crate) fn apply_ram_deltas(
    db: &mut ChainDatabase,
    validate: &mut BTreeSet<AccountName>,
    deltas: &[(AccountName, i64)],
) {
    for &(account, delta) in deltas {
        if db.modify_account(account, |meta| meta.ram_usage += delta) {
            validate.insert(account);
        }
    }
}

/// Executes the `txfee` charges the fee walk requests, each as a nested
/// native apply of the built-in handler under its own undo layer.
struct TxFeeDispatch<'a> {
    traces: &'a mut Vec<ActionTrace>,
    validate_ram_accounts: &'a mut BTreeSet<AccountName>,
}

impl InlineFeeDispatcher for TxFeeDispatch<'_> {
    fn dispatch_txfee(
        &mut self,
        db: &mut ChainDatabase,
        token_id: AccountName,
        fee_payer: AccountName,
        fee: Asset,
    ) -> Result<(), ChainError> {
        let payload = TxFeePayload {
            payer: fee_payer,
            fee,
        };
        let act = Action {
            account: token_id,
            name: TXFEE_ACTION,
            authorization: vec![PermissionLevel {
                actor: fee_payer,
                permission: ACTIVE_PERMISSION,
            }],
            data: payload.packed(),
        };

        let undo = db.push_undo_layer();
        let mut scope = NativeScope::new(token_id);
        match token_system::apply_txfee(db, &mut scope, &payload) {
            Ok(()) => {
                apply_ram_deltas(db, self.validate_ram_accounts, &scope.ram_deltas);
                db.commit(undo);
                self.traces.push(ActionTrace {
                    receiver: token_id,
                    act,
                    console: String::new(),
                });
                Ok(())
            }
            Err(error) => {
                db.revert(undo);
                Err(error)
            }
        }
    }
}
