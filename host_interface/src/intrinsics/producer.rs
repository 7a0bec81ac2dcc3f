//!
//! Active producer listing.
//!

use super::{def, ContextAware, I32};
use crate::registry::{IntrinsicTable, WasmValue};

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "get_active_producers",
        ContextAware,
        false,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let producers = env.context.controller().active_producers();
            let mut raw = Vec::with_capacity(producers.len() * 8);
            for producer in producers {
                raw.extend_from_slice(&producer.as_u64().to_le_bytes());
            }
            let written = env.copy_out(args.u32(0), args.u32(1), &raw)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));
}
