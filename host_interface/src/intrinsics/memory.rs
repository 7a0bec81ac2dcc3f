//!
//! Guest memory helpers. `memcpy` rejects aliasing regions.
//!

use super::{def, ContextAware, I32};
use crate::registry::{IntrinsicTable, WasmValue};
use chain_ee::ChainError;

pub(crate) fn register(table: &mut IntrinsicTable) {
    table.add(def(
        "memcpy",
        ContextAware,
        true,
        &[I32, I32, I32],
        Some(I32),
        |env, args| {
            let (dest, src, length) = (args.u32(0), args.u32(1), args.u32(2));
            let distance = dest.abs_diff(src);
            if (distance as u64) < length as u64 {
                return Err(ChainError::OverlappingMemory.into());
            }
            let data = env.read_bytes(src, length)?;
            env.write_bytes(dest, &data)?;
            Ok(Some(WasmValue::I32(dest as i32)))
        },
    ));

    table.add(def(
        "memmove",
        ContextAware,
        true,
        &[I32, I32, I32],
        Some(I32),
        |env, args| {
            let (dest, src, length) = (args.u32(0), args.u32(1), args.u32(2));
            let data = env.read_bytes(src, length)?;
            env.write_bytes(dest, &data)?;
            Ok(Some(WasmValue::I32(dest as i32)))
        },
    ));

    table.add(def(
        "memcmp",
        ContextAware,
        true,
        &[I32, I32, I32],
        Some(I32),
        |env, args| {
            let lhs = env.read_bytes(args.u32(0), args.u32(2))?;
            let rhs = env.read_bytes(args.u32(1), args.u32(2))?;
            let order = match lhs.cmp(&rhs) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            };
            Ok(Some(WasmValue::I32(order)))
        },
    ));

    table.add(def(
        "memset",
        ContextAware,
        true,
        &[I32, I32, I32],
        Some(I32),
        |env, args| {
            let (dest, value, length) = (args.u32(0), args.i32(1), args.u32(2));
            let slice = env.slice_mut(dest, length)?;
            slice.fill(value as u8);
            Ok(Some(WasmValue::I32(dest as i32)))
        },
    ));
}
