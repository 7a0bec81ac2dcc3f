//!
//! Action data access.
//!

use super::{def, ContextAware, I32, I64};
use crate::registry::{IntrinsicTable, WasmValue};

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "read_action_data",
        ContextAware,
        true,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let data = env.context.action_data().to_vec();
            let written = env.copy_out(args.u32(0), args.u32(1), &data)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "action_data_size",
        ContextAware,
        true,
        &[],
        Some(I32),
        |env, _| Ok(Some(WasmValue::I32(env.context.action_data().len() as i32))),
    ));

    table.add(def(
        "current_receiver",
        ContextAware,
        true,
        &[],
        Some(I64),
        |env, _| Ok(Some(WasmValue::I64(env.context.receiver().as_u64() as i64))),
    ));
}
