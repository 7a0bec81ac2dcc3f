//!
//! Inline and deferred dispatch, plus context-free transaction access.
//!

use super::{def, ContextAware, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};
use chain_ee::codec::{Pack, Unpack};
use chain_ee::types::{Action, Transaction};
use chain_ee::ChainError;

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "send_inline",
        ContextAware,
        false,
        &[I32, I32],
        None,
        |env, args| {
            let data_len = args.u32(1);
            let max = env
                .context
                .chain_db()
                .global()
                .config
                .max_inline_action_size;
            if data_len >= max {
                return Err(ChainError::InlineActionTooBig.into());
            }
            let data = env.read_bytes(args.u32(0), data_len)?;
            let act = Action::unpack_all(&data).map_err(ChainError::from)?;
            env.context.execute_inline(act);
            Ok(None)
        },
    ));

    table.add(def(
        "send_context_free_inline",
        ContextAware,
        false,
        &[I32, I32],
        None,
        |env, args| {
            let data_len = args.u32(1);
            let max = env
                .context
                .chain_db()
                .global()
                .config
                .max_inline_action_size;
            if data_len >= max {
                return Err(ChainError::InlineActionTooBig.into());
            }
            let data = env.read_bytes(args.u32(0), data_len)?;
            let act = Action::unpack_all(&data).map_err(ChainError::from)?;
            env.context.execute_context_free_inline(act)?;
            Ok(None)
        },
    ));

    table.add(def(
        "send_deferred",
        ContextAware,
        false,
        &[I32, I64, I32, I32, I32],
        None,
        |env, args| {
            let sender_id = env.read_u128(args.u32(0))?;
            let payer = args.name(1);
            let data = env.read_bytes(args.u32(2), args.u32(3))?;
            let trx = Transaction::unpack_all(&data).map_err(ChainError::from)?;
            let replace = args.i32(4) != 0;
            env.context
                .schedule_deferred_transaction(sender_id, payer, trx, replace)?;
            Ok(None)
        },
    ));

    table.add(def(
        "cancel_deferred",
        ContextAware,
        false,
        &[I32],
        Some(I32),
        |env, args| {
            let sender_id = env.read_u128(args.u32(0))?;
            let cancelled = env.context.cancel_deferred_transaction(sender_id);
            Ok(Some(WasmValue::I32(cancelled as i32)))
        },
    ));

    // context-free transaction api

    table.add(def(
        "read_transaction",
        ContextAware,
        true,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let packed = env.context.packed_transaction().to_vec();
            let written = env.copy_out(args.u32(0), args.u32(1), &packed)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "transaction_size",
        ContextAware,
        true,
        &[],
        Some(I32),
        |env, _| {
            Ok(Some(WasmValue::I32(
                env.context.packed_transaction().len() as i32
            )))
        },
    ));

    table.add(def(
        "expiration",
        ContextAware,
        true,
        &[],
        Some(I32),
        |env, _| Ok(Some(WasmValue::I32(env.context.expiration() as i32))),
    ));

    table.add(def(
        "tapos_block_num",
        ContextAware,
        true,
        &[],
        Some(I32),
        |env, _| Ok(Some(WasmValue::I32(env.context.tapos_block_num() as i32))),
    ));

    table.add(def(
        "tapos_block_prefix",
        ContextAware,
        true,
        &[],
        Some(I32),
        |env, _| {
            Ok(Some(WasmValue::I32(
                env.context.tapos_block_prefix() as i32
            )))
        },
    ));

    table.add(def(
        "get_action",
        ContextAware,
        true,
        &[I32, I32, I32, I32],
        Some(I32),
        |env, args| {
            let act = match env.context.get_action(args.u32(0), args.u32(1)) {
                Some(act) => act.clone(),
                None => return Ok(Some(WasmValue::I32(-1))),
            };
            let packed = act.packed();
            let size = packed.len() as i32;
            if packed.len() <= args.u32(3) as usize {
                env.write_bytes(args.u32(2), &packed)?;
            }
            Ok(Some(WasmValue::I32(size)))
        },
    ));

    // context-free data is prunable: only reachable from context-free apply

    table.add(def(
        "get_context_free_data",
        super::ContextFree,
        false,
        &[I32, I32, I32],
        Some(I32),
        |env, args| {
            let data = match env.context.get_context_free_data(args.u32(0)) {
                Some(data) => data.to_vec(),
                None => return Ok(Some(WasmValue::I32(-1))),
            };
            let written = env.copy_out(args.u32(1), args.u32(2), &data)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));
}
