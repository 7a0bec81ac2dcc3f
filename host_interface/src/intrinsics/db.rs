//!
//! Database intrinsics: the primary `i64` table API plus one ten-operation
//! family per secondary index kind. The five families share their handler
//! logic; only the key width, the wire layout (by-pointer scalar versus
//! counted array) and the NaN guard differ.
//!

use super::{def, ContextAware, I32, I64};
use crate::registry::{HostEnv, IntrinsicTable, Trap, WasmValType, WasmValue};
use chain_ee::ChainError;
use softfloat::{F128, F64 as SoftF64};
use state_store::{IndexKind, SecondaryValue};

pub(crate) fn register(table: &mut IntrinsicTable) {
    register_primary(table);
    for family in FAMILIES {
        register_family(table, family);
    }
}

fn register_primary(table: &mut IntrinsicTable) {
    table.add(def(
        "db_store_i64",
        ContextAware,
        false,
        &[I64, I64, I64, I64, I32, I32],
        Some(I32),
        |env, args| {
            let value = env.read_bytes(args.u32(4), args.u32(5))?;
            let iterator = env.context.db_store_i64(
                args.name(0),
                args.name(1),
                args.name(2),
                args.u64(3),
                &value,
            )?;
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        "db_update_i64",
        ContextAware,
        false,
        &[I32, I64, I32, I32],
        None,
        |env, args| {
            let value = env.read_bytes(args.u32(2), args.u32(3))?;
            env.context.db_update_i64(args.i32(0), args.name(1), &value)?;
            Ok(None)
        },
    ));

    table.add(def(
        "db_remove_i64",
        ContextAware,
        false,
        &[I32],
        None,
        |env, args| {
            env.context.db_remove_i64(args.i32(0))?;
            Ok(None)
        },
    ));

    table.add(def(
        "db_get_i64",
        ContextAware,
        false,
        &[I32, I32, I32],
        Some(I32),
        |env, args| {
            let value = env.context.db_get_i64(args.i32(0))?.to_vec();
            let written = env.copy_out(args.u32(1), args.u32(2), &value)?;
            Ok(Some(WasmValue::I32(written)))
        },
    ));

    table.add(def(
        "db_next_i64",
        ContextAware,
        false,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let (iterator, primary) = env.context.db_next_i64(args.i32(0))?;
            if let Some(primary) = primary {
                env.write_u64(args.u32(1), primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        "db_previous_i64",
        ContextAware,
        false,
        &[I32, I32],
        Some(I32),
        |env, args| {
            let (iterator, primary) = env.context.db_previous_i64(args.i32(0))?;
            if let Some(primary) = primary {
                env.write_u64(args.u32(1), primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        "db_find_i64",
        ContextAware,
        false,
        &[I64, I64, I64, I64],
        Some(I32),
        |env, args| {
            let iterator =
                env.context
                    .db_find_i64(args.name(0), args.name(1), args.name(2), args.u64(3));
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        "db_lowerbound_i64",
        ContextAware,
        false,
        &[I64, I64, I64, I64],
        Some(I32),
        |env, args| {
            let iterator = env.context.db_lowerbound_i64(
                args.name(0),
                args.name(1),
                args.name(2),
                args.u64(3),
            );
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        "db_upperbound_i64",
        ContextAware,
        false,
        &[I64, I64, I64, I64],
        Some(I32),
        |env, args| {
            let iterator = env.context.db_upperbound_i64(
                args.name(0),
                args.name(1),
                args.name(2),
                args.u64(3),
            );
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        "db_end_i64",
        ContextAware,
        false,
        &[I64, I64, I64],
        Some(I32),
        |env, args| {
            let iterator = env
                .context
                .db_end_i64(args.name(0), args.name(1), args.name(2));
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));
}

struct Family {
    kind: IndexKind,
    /// Array-style wire layout: the key travels as a counted element array.
    array: bool,
    /// Float kinds reject NaN keys on store/update/search.
    float: bool,
    store: &'static str,
    update: &'static str,
    remove: &'static str,
    find_secondary: &'static str,
    find_primary: &'static str,
    lowerbound: &'static str,
    upperbound: &'static str,
    end: &'static str,
    next: &'static str,
    previous: &'static str,
}

const FAMILIES: [Family; 5] = [
    Family {
        kind: IndexKind::U64,
        array: false,
        float: false,
        store: "db_idx64_store",
        update: "db_idx64_update",
        remove: "db_idx64_remove",
        find_secondary: "db_idx64_find_secondary",
        find_primary: "db_idx64_find_primary",
        lowerbound: "db_idx64_lowerbound",
        upperbound: "db_idx64_upperbound",
        end: "db_idx64_end",
        next: "db_idx64_next",
        previous: "db_idx64_previous",
    },
    Family {
        kind: IndexKind::U128,
        array: false,
        float: false,
        store: "db_idx128_store",
        update: "db_idx128_update",
        remove: "db_idx128_remove",
        find_secondary: "db_idx128_find_secondary",
        find_primary: "db_idx128_find_primary",
        lowerbound: "db_idx128_lowerbound",
        upperbound: "db_idx128_upperbound",
        end: "db_idx128_end",
        next: "db_idx128_next",
        previous: "db_idx128_previous",
    },
    Family {
        kind: IndexKind::U128Pair,
        array: true,
        float: false,
        store: "db_idx256_store",
        update: "db_idx256_update",
        remove: "db_idx256_remove",
        find_secondary: "db_idx256_find_secondary",
        find_primary: "db_idx256_find_primary",
        lowerbound: "db_idx256_lowerbound",
        upperbound: "db_idx256_upperbound",
        end: "db_idx256_end",
        next: "db_idx256_next",
        previous: "db_idx256_previous",
    },
    Family {
        kind: IndexKind::F64,
        array: false,
        float: true,
        store: "db_idx_double_store",
        update: "db_idx_double_update",
        remove: "db_idx_double_remove",
        find_secondary: "db_idx_double_find_secondary",
        find_primary: "db_idx_double_find_primary",
        lowerbound: "db_idx_double_lowerbound",
        upperbound: "db_idx_double_upperbound",
        end: "db_idx_double_end",
        next: "db_idx_double_next",
        previous: "db_idx_double_previous",
    },
    Family {
        kind: IndexKind::F128,
        array: false,
        float: true,
        store: "db_idx_long_double_store",
        update: "db_idx_long_double_update",
        remove: "db_idx_long_double_remove",
        find_secondary: "db_idx_long_double_find_secondary",
        find_primary: "db_idx_long_double_find_primary",
        lowerbound: "db_idx_long_double_lowerbound",
        upperbound: "db_idx_long_double_upperbound",
        end: "db_idx_long_double_end",
        next: "db_idx_long_double_next",
        previous: "db_idx_long_double_previous",
    },
];

fn read_value(
    env: &HostEnv<'_, '_, '_>,
    kind: IndexKind,
    ptr: u32,
    array_len: Option<u32>,
) -> Result<SecondaryValue, Trap> {
    if let Some(len) = array_len {
        if len != 2 {
            return Err(ChainError::db_api(
                "invalid size of secondary key array: expected 2 elements",
            )
            .into());
        }
    }
    let value = match kind {
        IndexKind::U64 => SecondaryValue::U64(env.read_u64(ptr)?),
        IndexKind::U128 => SecondaryValue::U128(env.read_u128(ptr)?),
        IndexKind::U128Pair => {
            SecondaryValue::U128Pair([env.read_u128(ptr)?, env.read_u128(ptr + 16)?])
        }
        IndexKind::F64 => SecondaryValue::F64(env.read_u64(ptr)?),
        IndexKind::F128 => SecondaryValue::F128(env.read_u128(ptr)?),
    };
    Ok(value)
}

fn write_value(
    env: &mut HostEnv<'_, '_, '_>,
    value: SecondaryValue,
    ptr: u32,
) -> Result<(), Trap> {
    match value {
        SecondaryValue::U64(v) => env.write_u64(ptr, v),
        SecondaryValue::U128(v) => env.write_u128(ptr, v),
        SecondaryValue::U128Pair([first, second]) => {
            env.write_u128(ptr, first)?;
            env.write_u128(ptr + 16, second)
        }
        SecondaryValue::F64(bits) => env.write_u64(ptr, bits),
        SecondaryValue::F128(bits) => env.write_u128(ptr, bits),
    }
}

fn reject_nan(value: SecondaryValue) -> Result<(), Trap> {
    let is_nan = match value {
        SecondaryValue::F64(bits) => SoftF64::from_bits(bits).is_nan(),
        SecondaryValue::F128(bits) => F128::from_bits(bits).is_nan(),
        _ => false,
    };
    if is_nan {
        return Err(ChainError::ActionValidate(
            "NaN is not an allowed value for a secondary key".into(),
        )
        .into());
    }
    Ok(())
}

fn register_family(table: &mut IntrinsicTable, family: Family) {
    let Family {
        kind,
        array,
        float,
        store,
        update,
        remove,
        find_secondary,
        find_primary,
        lowerbound,
        upperbound,
        end,
        next,
        previous,
    } = family;

    // signatures grow one `i32` length argument in the array layout
    const STORE_SIMPLE: &[WasmValType] = &[I64, I64, I64, I64, I32];
    const STORE_ARRAY: &[WasmValType] = &[I64, I64, I64, I64, I32, I32];
    const UPDATE_SIMPLE: &[WasmValType] = &[I32, I64, I32];
    const UPDATE_ARRAY: &[WasmValType] = &[I32, I64, I32, I32];
    const QUERY_SIMPLE: &[WasmValType] = &[I64, I64, I64, I32, I32];
    const QUERY_ARRAY: &[WasmValType] = &[I64, I64, I64, I32, I32, I32];
    const FIND_PRIMARY_SIMPLE: &[WasmValType] = &[I64, I64, I64, I32, I64];
    const FIND_PRIMARY_ARRAY: &[WasmValType] = &[I64, I64, I64, I32, I32, I64];

    table.add(def(
        store,
        ContextAware,
        false,
        if array { STORE_ARRAY } else { STORE_SIMPLE },
        Some(I32),
        move |env, args| {
            let array_len = array.then(|| args.u32(5));
            let value = read_value(env, kind, args.u32(4), array_len)?;
            if float {
                reject_nan(value)?;
            }
            let iterator = env.context.db_idx_store(
                args.name(0),
                args.name(1),
                args.name(2),
                args.u64(3),
                value,
            )?;
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        update,
        ContextAware,
        false,
        if array { UPDATE_ARRAY } else { UPDATE_SIMPLE },
        None,
        move |env, args| {
            let array_len = array.then(|| args.u32(3));
            let value = read_value(env, kind, args.u32(2), array_len)?;
            if float {
                reject_nan(value)?;
            }
            env.context
                .db_idx_update(kind, args.i32(0), args.name(1), value)?;
            Ok(None)
        },
    ));

    table.add(def(remove, ContextAware, false, &[I32], None, move |env, args| {
        env.context.db_idx_remove(kind, args.i32(0))?;
        Ok(None)
    }));

    table.add(def(
        find_secondary,
        ContextAware,
        false,
        if array { QUERY_ARRAY } else { QUERY_SIMPLE },
        Some(I32),
        move |env, args| {
            let (value_ptr, primary_ptr) = if array {
                (args.u32(3), args.u32(5))
            } else {
                (args.u32(3), args.u32(4))
            };
            let array_len = array.then(|| args.u32(4));
            let value = read_value(env, kind, value_ptr, array_len)?;
            if float {
                reject_nan(value)?;
            }
            let (iterator, primary) =
                env.context
                    .db_idx_find_secondary(args.name(0), args.name(1), args.name(2), value);
            if let Some(primary) = primary {
                env.write_u64(primary_ptr, primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        find_primary,
        ContextAware,
        false,
        if array {
            FIND_PRIMARY_ARRAY
        } else {
            FIND_PRIMARY_SIMPLE
        },
        Some(I32),
        move |env, args| {
            let (value_ptr, primary_index) = if array { (args.u32(3), 5) } else { (args.u32(3), 4) };
            if let Some(len) = array.then(|| args.u32(4)) {
                if len != 2 {
                    return Err(ChainError::db_api(
                        "invalid size of secondary key array: expected 2 elements",
                    )
                    .into());
                }
            }
            let primary = args.u64(primary_index);
            let (iterator, value) = env.context.db_idx_find_primary(
                kind,
                args.name(0),
                args.name(1),
                args.name(2),
                primary,
            );
            if let Some(value) = value {
                write_value(env, value, value_ptr)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        lowerbound,
        ContextAware,
        false,
        if array { QUERY_ARRAY } else { QUERY_SIMPLE },
        Some(I32),
        move |env, args| {
            let (value_ptr, primary_ptr) = if array {
                (args.u32(3), args.u32(5))
            } else {
                (args.u32(3), args.u32(4))
            };
            let array_len = array.then(|| args.u32(4));
            let probe = read_value(env, kind, value_ptr, array_len)?;
            if float {
                reject_nan(probe)?;
            }
            let (iterator, found) =
                env.context
                    .db_idx_lowerbound(args.name(0), args.name(1), args.name(2), probe);
            if let Some((value, primary)) = found {
                write_value(env, value, value_ptr)?;
                env.write_u64(primary_ptr, primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        upperbound,
        ContextAware,
        false,
        if array { QUERY_ARRAY } else { QUERY_SIMPLE },
        Some(I32),
        move |env, args| {
            let (value_ptr, primary_ptr) = if array {
                (args.u32(3), args.u32(5))
            } else {
                (args.u32(3), args.u32(4))
            };
            let array_len = array.then(|| args.u32(4));
            let probe = read_value(env, kind, value_ptr, array_len)?;
            if float {
                reject_nan(probe)?;
            }
            let (iterator, found) =
                env.context
                    .db_idx_upperbound(args.name(0), args.name(1), args.name(2), probe);
            if let Some((value, primary)) = found {
                write_value(env, value, value_ptr)?;
                env.write_u64(primary_ptr, primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        end,
        ContextAware,
        false,
        &[I64, I64, I64],
        Some(I32),
        move |env, args| {
            let iterator =
                env.context
                    .db_idx_end(kind, args.name(0), args.name(1), args.name(2));
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        next,
        ContextAware,
        false,
        &[I32, I32],
        Some(I32),
        move |env, args| {
            let (iterator, primary) = env.context.db_idx_next(kind, args.i32(0))?;
            if let Some(primary) = primary {
                env.write_u64(args.u32(1), primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));

    table.add(def(
        previous,
        ContextAware,
        false,
        &[I32, I32],
        Some(I32),
        move |env, args| {
            let (iterator, primary) = env.context.db_idx_previous(kind, args.i32(0))?;
            if let Some(primary) = primary {
                env.write_u64(args.u32(1), primary)?;
            }
            Ok(Some(WasmValue::I32(iterator)))
        },
    ));
}
