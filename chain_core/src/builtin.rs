//!
//! Built-in standard token actions, handled natively by the core.
//!
//! Every account carries these actions; they run only when the receiver is
//! the action's own account (a notified recipient observes them without
//! re-applying the balance mutations).
//!

use crate::apply::ApplyContext;
use crate::transaction::{apply_ram_deltas, NativeScope};
use chain_ee::codec::{CodecError, Pack, Unpack};
use chain_ee::types::{name_from_str, AccountName, ActionName, Asset, Name};
use chain_ee::ChainError;
use token_system::{SetTokenMeta, TxFeePayload};

const ISSUE: Name = name_from_str("issue");
const TRANSFER: Name = name_from_str("transfer");
const REDEEM: Name = name_from_str("redeem");
const SETTOKENMETA: Name = name_from_str("settokenmeta");

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BuiltinAction {
    Issue,
    Transfer,
    Redeem,
    TxFee,
    SetTokenMeta,
}

impl BuiltinAction {
    pub fn parse(name: ActionName) -> Option<BuiltinAction> {
        match name {
            n if n == ISSUE => Some(BuiltinAction::Issue),
            n if n == TRANSFER => Some(BuiltinAction::Transfer),
            n if n == REDEEM => Some(BuiltinAction::Redeem),
            n if n == chain_ee::config::TXFEE_ACTION => Some(BuiltinAction::TxFee),
            n if n == SETTOKENMETA => Some(BuiltinAction::SetTokenMeta),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IssuePayload {
    pub to: AccountName,
    pub qty: Asset,
    pub memo: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransferPayload {
    pub from: AccountName,
    pub to: AccountName,
    pub qty: Asset,
    pub memo: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RedeemPayload {
    pub qty: Asset,
    pub memo: String,
}

impl Pack for IssuePayload {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.to.pack_into(out);
        self.qty.pack_into(out);
        self.memo.pack_into(out);
    }
}

impl Unpack for IssuePayload {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(IssuePayload {
            to: AccountName::unpack_from(input)?,
            qty: Asset::unpack_from(input)?,
            memo: String::unpack_from(input)?,
        })
    }
}

impl Pack for TransferPayload {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.from.pack_into(out);
        self.to.pack_into(out);
        self.qty.pack_into(out);
        self.memo.pack_into(out);
    }
}

impl Unpack for TransferPayload {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TransferPayload {
            from: AccountName::unpack_from(input)?,
            to: AccountName::unpack_from(input)?,
            qty: Asset::unpack_from(input)?,
            memo: String::unpack_from(input)?,
        })
    }
}

impl Pack for RedeemPayload {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.qty.pack_into(out);
        self.memo.pack_into(out);
    }
}

impl Unpack for RedeemPayload {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(RedeemPayload {
            qty: Asset::unpack_from(input)?,
            memo: String::unpack_from(input)?,
        })
    }
}

fn check_memo(memo: &str) -> Result<(), ChainError> {
    if memo.len() > 256 {
        return Err(ChainError::ActionValidate(
            "memo has more than 256 bytes".into(),
        ));
    }
    Ok(())
}

fn check_quantity(ctx: &ApplyContext<'_, '_>, qty: &Asset) -> Result<(), ChainError> {
    if !qty.valid() {
        return Err(ChainError::ActionValidate("invalid quantity".into()));
    }
    let symbol = token_system::get_token_symbol(ctx.dbr(), ctx.receiver())?;
    if qty.symbol != symbol {
        return Err(ChainError::TokenMetaValidation("token symbol mismatch"));
    }
    Ok(())
}

/// Runs a token-manager operation with a scoped RAM recorder, then applies
/// the recorded deltas to the accounts.
fn with_native_scope(
    ctx: &mut ApplyContext<'_, '_>,
    f: impl FnOnce(
        &mut state_store::ChainDatabase,
        &mut NativeScope,
    ) -> Result<(), ChainError>,
) -> Result<(), ChainError> {
    let mut scope = NativeScope::new(ctx.receiver());
    f(ctx.db(), &mut scope)?;
    let NativeScope { ram_deltas, .. } = scope;
    let trx = &mut *ctx.trx_context;
    apply_ram_deltas(
        &mut trx.controller.db,
        &mut trx.validate_ram_accounts,
        &ram_deltas,
    );
    Ok(())
}

impl ApplyContext<'_, '_> {
    /// Host-intrinsic entry: issue the receiver's own token.
    pub fn issue_token(&mut self, to: AccountName, amount: i64) -> Result<(), ChainError> {
        with_native_scope(self, |db, scope| {
            token_system::issue_token(db, scope, to, amount)
        })
    }

    /// Host-intrinsic entry: move the receiver's own token.
    pub fn transfer_token(
        &mut self,
        from: AccountName,
        to: AccountName,
        amount: i64,
    ) -> Result<(), ChainError> {
        with_native_scope(self, |db, scope| {
            token_system::transfer_token(db, scope, from, to, amount)
        })
    }

    /// Host-intrinsic entry: burn from the receiver's own supply.
    pub fn retire_token(&mut self, amount: i64) -> Result<(), ChainError> {
        with_native_scope(self, |db, scope| token_system::retire_token(db, scope, amount))
    }
}

pub(crate) fn apply(
    ctx: &mut ApplyContext<'_, '_>,
    action: BuiltinAction,
) -> Result<(), ChainError> {
    let data = ctx.action_data().to_vec();
    match action {
        BuiltinAction::Issue => {
            let payload = IssuePayload::unpack_all(&data)?;
            check_memo(&payload.memo)?;
            ctx.require_authorization(ctx.receiver())?;
            check_quantity(ctx, &payload.qty)?;
            ctx.require_recipient(payload.to);
            with_native_scope(ctx, |db, scope| {
                token_system::issue_token(db, scope, payload.to, payload.qty.amount)
            })
        }
        BuiltinAction::Transfer => {
            let payload = TransferPayload::unpack_all(&data)?;
            check_memo(&payload.memo)?;
            ctx.require_authorization(payload.from)?;
            check_quantity(ctx, &payload.qty)?;
            ctx.require_recipient(payload.from);
            ctx.require_recipient(payload.to);
            with_native_scope(ctx, |db, scope| {
                token_system::transfer_token(db, scope, payload.from, payload.to, payload.qty.amount)
            })
        }
        BuiltinAction::Redeem => {
            let payload = RedeemPayload::unpack_all(&data)?;
            check_memo(&payload.memo)?;
            ctx.require_authorization(ctx.receiver())?;
            check_quantity(ctx, &payload.qty)?;
            with_native_scope(ctx, |db, scope| {
                token_system::retire_token(db, scope, payload.qty.amount)
            })
        }
        BuiltinAction::TxFee => {
            let payload = TxFeePayload::unpack_all(&data)?;
            ctx.require_authorization(payload.payer)?;
            check_quantity(ctx, &payload.fee)?;
            with_native_scope(ctx, |db, scope| token_system::apply_txfee(db, scope, &payload))
        }
        BuiltinAction::SetTokenMeta => {
            let payload = SetTokenMeta::unpack_all(&data)?;
            ctx.require_authorization(ctx.receiver())?;
            let receiver = ctx.receiver();
            with_native_scope(ctx, |db, scope| {
                token_system::set_token_meta_info(db, scope, receiver, &payload)
            })
        }
    }
}
