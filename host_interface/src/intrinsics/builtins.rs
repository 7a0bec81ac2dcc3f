//!
//! Compiler builtins for 128-bit integers and quad-precision floats.
//!
//! The guest moves 128-bit quantities as `(lo, hi)` limb pairs; results
//! come back through an out-pointer into linear memory. Division and
//! modulo by zero fail; the `__*tf2` compare family folds unordered
//! operands to a per-family sentinel.
//!

use super::{def, ContextAware, F32 as VF32, F64 as VF64, I32, I64};
use crate::registry::{HostEnv, IntrinsicTable, Trap, WasmValue};
use chain_ee::ChainError;
use softfloat::{F128, F32, F64};

fn make_u128(lo: u64, hi: u64) -> u128 {
    ((hi as u128) << 64) | lo as u128
}

fn make_i128(lo: u64, hi: u64) -> i128 {
    make_u128(lo, hi) as i128
}

fn write_i128(env: &mut HostEnv<'_, '_, '_>, ptr: u32, value: i128) -> Result<(), Trap> {
    env.write_u128(ptr, value as u128)
}

fn quad(lo: u64, hi: u64) -> F128 {
    F128::from_limbs(lo, hi)
}

fn write_quad(env: &mut HostEnv<'_, '_, '_>, ptr: u32, value: F128) -> Result<(), Trap> {
    env.write_u128(ptr, value.to_bits())
}

fn div_zero() -> Trap {
    ChainError::Arithmetic("divide by zero").into()
}

/// Three-way quad compare folding NaN to `if_nan`.
fn cmptf2(la: u64, ha: u64, lb: u64, hb: u64, if_nan: i32) -> i32 {
    let a = quad(la, ha);
    let b = quad(lb, hb);
    if a.is_nan() || b.is_nan() {
        return if_nan;
    }
    if a.lt(b) {
        return -1;
    }
    if a.eq(b) {
        return 0;
    }
    1
}

pub(crate) fn register(table: &mut IntrinsicTable) {
    // 128-bit integer shifts

    table.add(def(
        "__ashlti3",
        ContextAware,
        true,
        &[I32, I64, I64, I32],
        None,
        |env, args| {
            let value = make_u128(args.u64(1), args.u64(2));
            let shift = args.u32(3);
            let result = if shift >= 128 { 0 } else { value << shift };
            env.write_u128(args.u32(0), result)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__ashrti3",
        ContextAware,
        true,
        &[I32, I64, I64, I32],
        None,
        |env, args| {
            let value = make_i128(args.u64(1), args.u64(2));
            let shift = args.u32(3).min(127);
            write_i128(env, args.u32(0), value >> shift)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__lshlti3",
        ContextAware,
        true,
        &[I32, I64, I64, I32],
        None,
        |env, args| {
            let value = make_u128(args.u64(1), args.u64(2));
            let shift = args.u32(3);
            let result = if shift >= 128 { 0 } else { value << shift };
            env.write_u128(args.u32(0), result)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__lshrti3",
        ContextAware,
        true,
        &[I32, I64, I64, I32],
        None,
        |env, args| {
            let value = make_u128(args.u64(1), args.u64(2));
            let shift = args.u32(3);
            let result = if shift >= 128 { 0 } else { value >> shift };
            env.write_u128(args.u32(0), result)?;
            Ok(None)
        },
    ));

    // 128-bit integer arithmetic

    table.add(def(
        "__multi3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let lhs = make_i128(args.u64(1), args.u64(2));
            let rhs = make_i128(args.u64(3), args.u64(4));
            write_i128(env, args.u32(0), lhs.wrapping_mul(rhs))?;
            Ok(None)
        },
    ));

    table.add(def(
        "__divti3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let lhs = make_i128(args.u64(1), args.u64(2));
            let rhs = make_i128(args.u64(3), args.u64(4));
            if rhs == 0 {
                return Err(div_zero());
            }
            write_i128(env, args.u32(0), lhs.wrapping_div(rhs))?;
            Ok(None)
        },
    ));

    table.add(def(
        "__udivti3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let lhs = make_u128(args.u64(1), args.u64(2));
            let rhs = make_u128(args.u64(3), args.u64(4));
            if rhs == 0 {
                return Err(div_zero());
            }
            env.write_u128(args.u32(0), lhs / rhs)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__modti3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let lhs = make_i128(args.u64(1), args.u64(2));
            let rhs = make_i128(args.u64(3), args.u64(4));
            if rhs == 0 {
                return Err(div_zero());
            }
            write_i128(env, args.u32(0), lhs.wrapping_rem(rhs))?;
            Ok(None)
        },
    ));

    table.add(def(
        "__umodti3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let lhs = make_u128(args.u64(1), args.u64(2));
            let rhs = make_u128(args.u64(3), args.u64(4));
            if rhs == 0 {
                return Err(div_zero());
            }
            env.write_u128(args.u32(0), lhs % rhs)?;
            Ok(None)
        },
    ));

    // quad-precision arithmetic

    table.add(def(
        "__addtf3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let result = quad(args.u64(1), args.u64(2)).add(quad(args.u64(3), args.u64(4)));
            write_quad(env, args.u32(0), result)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__subtf3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let result = quad(args.u64(1), args.u64(2)).sub(quad(args.u64(3), args.u64(4)));
            write_quad(env, args.u32(0), result)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__multf3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let result = quad(args.u64(1), args.u64(2)).mul(quad(args.u64(3), args.u64(4)));
            write_quad(env, args.u32(0), result)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__divtf3",
        ContextAware,
        true,
        &[I32, I64, I64, I64, I64],
        None,
        |env, args| {
            let result = quad(args.u64(1), args.u64(2)).div(quad(args.u64(3), args.u64(4)));
            write_quad(env, args.u32(0), result)?;
            Ok(None)
        },
    ));

    table.add(def(
        "__negtf2",
        ContextAware,
        true,
        &[I32, I64, I64],
        None,
        |env, args| {
            write_quad(env, args.u32(0), quad(args.u64(1), args.u64(2)).neg())?;
            Ok(None)
        },
    ));

    // quad compares: sentinel per unordered family

    table.add(def("__eqtf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), 1))))
    }));
    table.add(def("__netf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), 1))))
    }));
    table.add(def("__getf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), -1))))
    }));
    table.add(def("__gttf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), 0))))
    }));
    table.add(def("__lttf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), 0))))
    }));
    table.add(def("__letf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), 1))))
    }));
    table.add(def("__cmptf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(cmptf2(args.u64(0), args.u64(1), args.u64(2), args.u64(3), 1))))
    }));
    table.add(def("__unordtf2", ContextAware, true, &[I64, I64, I64, I64], Some(I32), |_, args| {
        let unordered =
            quad(args.u64(0), args.u64(1)).is_nan() || quad(args.u64(2), args.u64(3)).is_nan();
        Ok(Some(WasmValue::I32(unordered as i32)))
    }));

    // quad conversions

    table.add(def("__extendsftf2", ContextAware, true, &[I32, VF32], None, |env, args| {
        let value = F32::from_bits(args.f32_bits(1)).to_f128();
        write_quad(env, args.u32(0), value)?;
        Ok(None)
    }));
    table.add(def("__extenddftf2", ContextAware, true, &[I32, VF64], None, |env, args| {
        let value = F64::from_bits(args.f64_bits(1)).to_f128();
        write_quad(env, args.u32(0), value)?;
        Ok(None)
    }));
    table.add(def("__trunctfdf2", ContextAware, true, &[I64, I64], Some(VF64), |_, args| {
        Ok(Some(WasmValue::F64(
            quad(args.u64(0), args.u64(1)).to_f64().to_bits(),
        )))
    }));
    table.add(def("__trunctfsf2", ContextAware, true, &[I64, I64], Some(VF32), |_, args| {
        Ok(Some(WasmValue::F32(
            quad(args.u64(0), args.u64(1)).to_f32().to_bits(),
        )))
    }));

    table.add(def("__fixtfsi", ContextAware, true, &[I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(quad(args.u64(0), args.u64(1)).to_i32())))
    }));
    table.add(def("__fixtfdi", ContextAware, true, &[I64, I64], Some(I64), |_, args| {
        Ok(Some(WasmValue::I64(quad(args.u64(0), args.u64(1)).to_i64())))
    }));
    table.add(def("__fixtfti", ContextAware, true, &[I32, I64, I64], None, |env, args| {
        let value = quad(args.u64(1), args.u64(2)).to_i128();
        write_i128(env, args.u32(0), value)?;
        Ok(None)
    }));
    table.add(def("__fixunstfsi", ContextAware, true, &[I64, I64], Some(I32), |_, args| {
        Ok(Some(WasmValue::I32(
            quad(args.u64(0), args.u64(1)).to_u32() as i32
        )))
    }));
    table.add(def("__fixunstfdi", ContextAware, true, &[I64, I64], Some(I64), |_, args| {
        Ok(Some(WasmValue::I64(
            quad(args.u64(0), args.u64(1)).to_u64() as i64
        )))
    }));
    table.add(def("__fixunstfti", ContextAware, true, &[I32, I64, I64], None, |env, args| {
        let value = quad(args.u64(1), args.u64(2)).to_u128();
        env.write_u128(args.u32(0), value)?;
        Ok(None)
    }));

    table.add(def("__fixsfti", ContextAware, true, &[I32, VF32], None, |env, args| {
        let value = F32::from_bits(args.f32_bits(1)).to_i128();
        write_i128(env, args.u32(0), value)?;
        Ok(None)
    }));
    table.add(def("__fixdfti", ContextAware, true, &[I32, VF64], None, |env, args| {
        let value = F64::from_bits(args.f64_bits(1)).to_i128();
        write_i128(env, args.u32(0), value)?;
        Ok(None)
    }));
    table.add(def("__fixunssfti", ContextAware, true, &[I32, VF32], None, |env, args| {
        let value = F32::from_bits(args.f32_bits(1)).to_u128();
        env.write_u128(args.u32(0), value)?;
        Ok(None)
    }));
    table.add(def("__fixunsdfti", ContextAware, true, &[I32, VF64], None, |env, args| {
        let value = F64::from_bits(args.f64_bits(1)).to_u128();
        env.write_u128(args.u32(0), value)?;
        Ok(None)
    }));

    table.add(def("__floatsidf", ContextAware, true, &[I32], Some(VF64), |_, args| {
        Ok(Some(WasmValue::F64(F64::from_i32(args.i32(0)).to_bits())))
    }));
    table.add(def("__floatsitf", ContextAware, true, &[I32, I32], None, |env, args| {
        write_quad(env, args.u32(0), F128::from_i32(args.i32(1)))?;
        Ok(None)
    }));
    table.add(def("__floatditf", ContextAware, true, &[I32, I64], None, |env, args| {
        write_quad(env, args.u32(0), F128::from_i64(args.i64(1)))?;
        Ok(None)
    }));
    table.add(def("__floatunsitf", ContextAware, true, &[I32, I32], None, |env, args| {
        write_quad(env, args.u32(0), F128::from_u32(args.u32(1)))?;
        Ok(None)
    }));
    table.add(def("__floatunditf", ContextAware, true, &[I32, I64], None, |env, args| {
        write_quad(env, args.u32(0), F128::from_u64(args.u64(1)))?;
        Ok(None)
    }));
    table.add(def("__floattidf", ContextAware, true, &[I64, I64], Some(VF64), |_, args| {
        let value = make_i128(args.u64(0), args.u64(1));
        Ok(Some(WasmValue::F64(F64::from_i128(value).to_bits())))
    }));
    table.add(def("__floatuntidf", ContextAware, true, &[I64, I64], Some(VF64), |_, args| {
        let value = make_u128(args.u64(0), args.u64(1));
        Ok(Some(WasmValue::F64(F64::from_u128(value).to_bits())))
    }));
}
