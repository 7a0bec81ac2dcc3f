//!
//! Transaction-fee management and the tx-vote views.
//!
//! The fee setters carry their privilege check here rather than in the
//! dispatcher gate; the getters are open to any contract.
//!

use super::{def, ContextAware, F64, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};
use chain_core::TxVoteStatForAccount;
use chain_ee::codec::Pack;
use chain_ee::ChainError;

fn require_privileged(
    context: &chain_core::ApplyContext<'_, '_>,
) -> Result<(), ChainError> {
    if !context.is_privileged() {
        return Err(ChainError::UnaccessibleApi(
            "receiver does not have permission to call this API",
        ));
    }
    Ok(())
}

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "set_trx_fee_for_action",
        ContextAware,
        false,
        &[I64, I64, I32, I32],
        None,
        |env, args| {
            require_privileged(env.context)?;
            token_system::set_tx_fee_for_action(
                env.context.chain_db_mut(),
                args.name(0),
                args.name(1),
                args.i32(2) as i64,
                args.u32(3),
            )?;
            Ok(None)
        },
    ));

    table.add(def(
        "unset_trx_fee_for_action",
        ContextAware,
        false,
        &[I64, I64],
        None,
        |env, args| {
            require_privileged(env.context)?;
            token_system::unset_tx_fee_entry_for_action(
                env.context.chain_db_mut(),
                args.name(0),
                args.name(1),
            )?;
            Ok(None)
        },
    ));

    table.add(def(
        "get_trx_fee_for_action_packed",
        ContextAware,
        false,
        &[I64, I64, I32, I32],
        Some(I32),
        |env, args| {
            let fee = token_system::get_tx_fee_for_action(
                env.context.chain_db(),
                args.name(0),
                args.name(1),
            );
            let packed = fee.packed();
            let written = env.copy_packed(args.u32(2), args.u32(3), &packed)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "trx_fee_payer",
        ContextAware,
        false,
        &[],
        Some(I64),
        |env, _| {
            Ok(Some(WasmValue::I64(
                env.context.transaction_fee_payer().as_u64() as i64,
            )))
        },
    ));

    table.add(def(
        "get_top_transaction_vote_receivers_packed",
        ContextAware,
        false,
        &[I32, I32, I32, I32],
        Some(I32),
        |env, args| {
            let receivers: Vec<TxVoteStatForAccount> = env
                .context
                .controller()
                .vote_ledger
                .top_vote_receivers(args.u32(2), args.u32(3));
            let packed = receivers.packed();
            let written = env.copy_packed(args.u32(0), args.u32(1), &packed)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "get_total_weighted_transaction_votes",
        ContextAware,
        false,
        &[],
        Some(F64),
        |env, _| {
            let total = env.context.controller().vote_ledger.total_weighted_votes();
            Ok(Some(WasmValue::F64(total.to_bits())))
        },
    ));
}
