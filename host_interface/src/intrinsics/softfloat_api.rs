//!
//! Injected softfloat forwarders. The WASM injector rewrites every float
//! opcode in guest code into calls to these, so execution never touches
//! host floating-point hardware.
//!
//! `min`/`max` return the first NaN operand unchanged and order mixed-sign
//! operands by sign bit; truncating conversions fail on NaN or when the
//! value reaches the integer limit.
//!

use super::{def, Injected, F32 as VF32, F64 as VF64, I32, I64};
use crate::registry::{IntrinsicTable, Trap, WasmValue};
use chain_ee::ChainError;
use softfloat::{F32, F64};

fn ok32(bits: u32) -> Result<Option<WasmValue>, Trap> {
    Ok(Some(WasmValue::F32(bits)))
}

fn ok64(bits: u64) -> Result<Option<WasmValue>, Trap> {
    Ok(Some(WasmValue::F64(bits)))
}

fn okb(value: bool) -> Result<Option<WasmValue>, Trap> {
    Ok(Some(WasmValue::I32(value as i32)))
}

fn f32_ge(a: F32, b: F32) -> bool {
    !a.is_nan() && !b.is_nan() && !a.lt(b)
}

fn f64_ge(a: F64, b: F64) -> bool {
    !a.is_nan() && !b.is_nan() && !a.lt(b)
}

fn overflow(message: &'static str) -> Trap {
    ChainError::wasm_execution(message).into()
}

pub(crate) fn register(table: &mut IntrinsicTable) {
    // f32 binops
    table.add(def("_eosio_f32_add", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).add(F32::from_bits(args.f32_bits(1))).to_bits())
    }));
    table.add(def("_eosio_f32_sub", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).sub(F32::from_bits(args.f32_bits(1))).to_bits())
    }));
    table.add(def("_eosio_f32_mul", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).mul(F32::from_bits(args.f32_bits(1))).to_bits())
    }));
    table.add(def("_eosio_f32_div", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).div(F32::from_bits(args.f32_bits(1))).to_bits())
    }));

    table.add(def("_eosio_f32_min", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        let (af, bf) = (args.f32_bits(0), args.f32_bits(1));
        let (a, b) = (F32::from_bits(af), F32::from_bits(bf));
        if a.is_nan() {
            return ok32(af);
        }
        if b.is_nan() {
            return ok32(bf);
        }
        if a.sign_bit() != b.sign_bit() {
            return ok32(if a.sign_bit() { af } else { bf });
        }
        ok32(if a.lt(b) { af } else { bf })
    }));
    table.add(def("_eosio_f32_max", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        let (af, bf) = (args.f32_bits(0), args.f32_bits(1));
        let (a, b) = (F32::from_bits(af), F32::from_bits(bf));
        if a.is_nan() {
            return ok32(af);
        }
        if b.is_nan() {
            return ok32(bf);
        }
        if a.sign_bit() != b.sign_bit() {
            return ok32(if a.sign_bit() { bf } else { af });
        }
        ok32(if a.lt(b) { bf } else { af })
    }));
    table.add(def("_eosio_f32_copysign", Injected, false, &[VF32, VF32], Some(VF32), |_, args| {
        let (af, bf) = (args.f32_bits(0), args.f32_bits(1));
        ok32((af & !(1 << 31)) | (bf & (1 << 31)))
    }));

    // f32 unops
    table.add(def("_eosio_f32_abs", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(args.f32_bits(0) & !(1 << 31))
    }));
    table.add(def("_eosio_f32_neg", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(args.f32_bits(0) ^ (1 << 31))
    }));
    table.add(def("_eosio_f32_sqrt", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).sqrt().to_bits())
    }));
    table.add(def("_eosio_f32_ceil", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).ceil().to_bits())
    }));
    table.add(def("_eosio_f32_floor", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).floor().to_bits())
    }));
    table.add(def("_eosio_f32_trunc", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).trunc().to_bits())
    }));
    table.add(def("_eosio_f32_nearest", Injected, false, &[VF32], Some(VF32), |_, args| {
        ok32(F32::from_bits(args.f32_bits(0)).nearest().to_bits())
    }));

    // f32 relops
    table.add(def("_eosio_f32_eq", Injected, false, &[VF32, VF32], Some(I32), |_, args| {
        okb(F32::from_bits(args.f32_bits(0)).eq(F32::from_bits(args.f32_bits(1))))
    }));
    table.add(def("_eosio_f32_ne", Injected, false, &[VF32, VF32], Some(I32), |_, args| {
        okb(!F32::from_bits(args.f32_bits(0)).eq(F32::from_bits(args.f32_bits(1))))
    }));
    table.add(def("_eosio_f32_lt", Injected, false, &[VF32, VF32], Some(I32), |_, args| {
        okb(F32::from_bits(args.f32_bits(0)).lt(F32::from_bits(args.f32_bits(1))))
    }));
    table.add(def("_eosio_f32_le", Injected, false, &[VF32, VF32], Some(I32), |_, args| {
        okb(F32::from_bits(args.f32_bits(0)).le(F32::from_bits(args.f32_bits(1))))
    }));
    table.add(def("_eosio_f32_gt", Injected, false, &[VF32, VF32], Some(I32), |_, args| {
        let (a, b) = (F32::from_bits(args.f32_bits(0)), F32::from_bits(args.f32_bits(1)));
        okb(!a.is_nan() && !b.is_nan() && !a.le(b))
    }));
    table.add(def("_eosio_f32_ge", Injected, false, &[VF32, VF32], Some(I32), |_, args| {
        okb(f32_ge(
            F32::from_bits(args.f32_bits(0)),
            F32::from_bits(args.f32_bits(1)),
        ))
    }));

    // f64 binops
    table.add(def("_eosio_f64_add", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).add(F64::from_bits(args.f64_bits(1))).to_bits())
    }));
    table.add(def("_eosio_f64_sub", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).sub(F64::from_bits(args.f64_bits(1))).to_bits())
    }));
    table.add(def("_eosio_f64_mul", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).mul(F64::from_bits(args.f64_bits(1))).to_bits())
    }));
    table.add(def("_eosio_f64_div", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).div(F64::from_bits(args.f64_bits(1))).to_bits())
    }));

    table.add(def("_eosio_f64_min", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        let (af, bf) = (args.f64_bits(0), args.f64_bits(1));
        let (a, b) = (F64::from_bits(af), F64::from_bits(bf));
        if a.is_nan() {
            return ok64(af);
        }
        if b.is_nan() {
            return ok64(bf);
        }
        if a.sign_bit() != b.sign_bit() {
            return ok64(if a.sign_bit() { af } else { bf });
        }
        ok64(if a.lt(b) { af } else { bf })
    }));
    table.add(def("_eosio_f64_max", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        let (af, bf) = (args.f64_bits(0), args.f64_bits(1));
        let (a, b) = (F64::from_bits(af), F64::from_bits(bf));
        if a.is_nan() {
            return ok64(af);
        }
        if b.is_nan() {
            return ok64(bf);
        }
        if a.sign_bit() != b.sign_bit() {
            return ok64(if a.sign_bit() { bf } else { af });
        }
        ok64(if a.lt(b) { bf } else { af })
    }));
    table.add(def("_eosio_f64_copysign", Injected, false, &[VF64, VF64], Some(VF64), |_, args| {
        let (af, bf) = (args.f64_bits(0), args.f64_bits(1));
        ok64((af & !(1 << 63)) | (bf & (1 << 63)))
    }));

    // f64 unops
    table.add(def("_eosio_f64_abs", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(args.f64_bits(0) & !(1 << 63))
    }));
    table.add(def("_eosio_f64_neg", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(args.f64_bits(0) ^ (1 << 63))
    }));
    table.add(def("_eosio_f64_sqrt", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).sqrt().to_bits())
    }));
    table.add(def("_eosio_f64_ceil", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).ceil().to_bits())
    }));
    table.add(def("_eosio_f64_floor", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).floor().to_bits())
    }));
    table.add(def("_eosio_f64_trunc", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).trunc().to_bits())
    }));
    table.add(def("_eosio_f64_nearest", Injected, false, &[VF64], Some(VF64), |_, args| {
        ok64(F64::from_bits(args.f64_bits(0)).nearest().to_bits())
    }));

    // f64 relops
    table.add(def("_eosio_f64_eq", Injected, false, &[VF64, VF64], Some(I32), |_, args| {
        okb(F64::from_bits(args.f64_bits(0)).eq(F64::from_bits(args.f64_bits(1))))
    }));
    table.add(def("_eosio_f64_ne", Injected, false, &[VF64, VF64], Some(I32), |_, args| {
        okb(!F64::from_bits(args.f64_bits(0)).eq(F64::from_bits(args.f64_bits(1))))
    }));
    table.add(def("_eosio_f64_lt", Injected, false, &[VF64, VF64], Some(I32), |_, args| {
        okb(F64::from_bits(args.f64_bits(0)).lt(F64::from_bits(args.f64_bits(1))))
    }));
    table.add(def("_eosio_f64_le", Injected, false, &[VF64, VF64], Some(I32), |_, args| {
        okb(F64::from_bits(args.f64_bits(0)).le(F64::from_bits(args.f64_bits(1))))
    }));
    table.add(def("_eosio_f64_gt", Injected, false, &[VF64, VF64], Some(I32), |_, args| {
        let (a, b) = (F64::from_bits(args.f64_bits(0)), F64::from_bits(args.f64_bits(1)));
        okb(!a.is_nan() && !b.is_nan() && !a.le(b))
    }));
    table.add(def("_eosio_f64_ge", Injected, false, &[VF64, VF64], Some(I32), |_, args| {
        okb(f64_ge(
            F64::from_bits(args.f64_bits(0)),
            F64::from_bits(args.f64_bits(1)),
        ))
    }));

    // width conversions
    table.add(def("_eosio_f32_promote", Injected, false, &[VF32], Some(VF64), |_, args| {
        ok64(F32::from_bits(args.f32_bits(0)).to_f64().to_bits())
    }));
    table.add(def("_eosio_f64_demote", Injected, false, &[VF64], Some(VF32), |_, args| {
        ok32(F64::from_bits(args.f64_bits(0)).to_f32().to_bits())
    }));

    // bounded truncations to integer
    table.add(def("_eosio_f32_trunc_i32s", Injected, false, &[VF32], Some(I32), |_, args| {
        let af = F32::from_bits(args.f32_bits(0));
        if f32_ge(af, F32::from_f32(2147483648.0)) || af.lt(F32::from_f32(-2147483648.0)) {
            return Err(overflow("Error, f32.convert_s/i32 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f32.convert_s/i32 unrepresentable"));
        }
        Ok(Some(WasmValue::I32(af.trunc().to_i32())))
    }));
    table.add(def("_eosio_f64_trunc_i32s", Injected, false, &[VF64], Some(I32), |_, args| {
        let af = F64::from_bits(args.f64_bits(0));
        if f64_ge(af, F64::from_f64(2147483648.0)) || af.lt(F64::from_f64(-2147483648.0)) {
            return Err(overflow("Error, f64.convert_s/i32 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f64.convert_s/i32 unrepresentable"));
        }
        Ok(Some(WasmValue::I32(af.trunc().to_i32())))
    }));
    table.add(def("_eosio_f32_trunc_i32u", Injected, false, &[VF32], Some(I32), |_, args| {
        let af = F32::from_bits(args.f32_bits(0));
        if f32_ge(af, F32::from_f32(4294967296.0)) || af.le(F32::from_f32(-1.0)) {
            return Err(overflow("Error, f32.convert_u/i32 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f32.convert_u/i32 unrepresentable"));
        }
        Ok(Some(WasmValue::I32(af.trunc().to_u32() as i32)))
    }));
    table.add(def("_eosio_f64_trunc_i32u", Injected, false, &[VF64], Some(I32), |_, args| {
        let af = F64::from_bits(args.f64_bits(0));
        if f64_ge(af, F64::from_f64(4294967296.0)) || af.le(F64::from_f64(-1.0)) {
            return Err(overflow("Error, f64.convert_u/i32 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f64.convert_u/i32 unrepresentable"));
        }
        Ok(Some(WasmValue::I32(af.trunc().to_u32() as i32)))
    }));
    table.add(def("_eosio_f32_trunc_i64s", Injected, false, &[VF32], Some(I64), |_, args| {
        let af = F32::from_bits(args.f32_bits(0));
        if f32_ge(af, F32::from_f32(9223372036854775808.0))
            || af.lt(F32::from_f32(-9223372036854775808.0))
        {
            return Err(overflow("Error, f32.convert_s/i64 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f32.convert_s/i64 unrepresentable"));
        }
        Ok(Some(WasmValue::I64(af.trunc().to_i64())))
    }));
    table.add(def("_eosio_f64_trunc_i64s", Injected, false, &[VF64], Some(I64), |_, args| {
        let af = F64::from_bits(args.f64_bits(0));
        if f64_ge(af, F64::from_f64(9223372036854775808.0))
            || af.lt(F64::from_f64(-9223372036854775808.0))
        {
            return Err(overflow("Error, f64.convert_s/i64 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f64.convert_s/i64 unrepresentable"));
        }
        Ok(Some(WasmValue::I64(af.trunc().to_i64())))
    }));
    table.add(def("_eosio_f32_trunc_i64u", Injected, false, &[VF32], Some(I64), |_, args| {
        let af = F32::from_bits(args.f32_bits(0));
        if f32_ge(af, F32::from_f32(18446744073709551616.0)) || af.le(F32::from_f32(-1.0)) {
            return Err(overflow("Error, f32.convert_u/i64 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f32.convert_u/i64 unrepresentable"));
        }
        Ok(Some(WasmValue::I64(af.trunc().to_u64() as i64)))
    }));
    table.add(def("_eosio_f64_trunc_i64u", Injected, false, &[VF64], Some(I64), |_, args| {
        let af = F64::from_bits(args.f64_bits(0));
        if f64_ge(af, F64::from_f64(18446744073709551616.0)) || af.le(F64::from_f64(-1.0)) {
            return Err(overflow("Error, f64.convert_u/i64 overflow"));
        }
        if af.is_nan() {
            return Err(overflow("Error, f64.convert_u/i64 unrepresentable"));
        }
        Ok(Some(WasmValue::I64(af.trunc().to_u64() as i64)))
    }));

    // integer to float
    table.add(def("_eosio_i32_to_f32", Injected, false, &[I32], Some(VF32), |_, args| {
        ok32(F32::from_i32(args.i32(0)).to_bits())
    }));
    table.add(def("_eosio_i64_to_f32", Injected, false, &[I64], Some(VF32), |_, args| {
        ok32(F32::from_i64(args.i64(0)).to_bits())
    }));
    table.add(def("_eosio_ui32_to_f32", Injected, false, &[I32], Some(VF32), |_, args| {
        ok32(F32::from_u32(args.u32(0)).to_bits())
    }));
    table.add(def("_eosio_ui64_to_f32", Injected, false, &[I64], Some(VF32), |_, args| {
        ok32(F32::from_u64(args.u64(0)).to_bits())
    }));
    table.add(def("_eosio_i32_to_f64", Injected, false, &[I32], Some(VF64), |_, args| {
        ok64(F64::from_i32(args.i32(0)).to_bits())
    }));
    table.add(def("_eosio_i64_to_f64", Injected, false, &[I64], Some(VF64), |_, args| {
        ok64(F64::from_i64(args.i64(0)).to_bits())
    }));
    table.add(def("_eosio_ui32_to_f64", Injected, false, &[I32], Some(VF64), |_, args| {
        ok64(F64::from_u32(args.u32(0)).to_bits())
    }));
    table.add(def("_eosio_ui64_to_f64", Injected, false, &[I64], Some(VF64), |_, args| {
        ok64(F64::from_u64(args.u64(0)).to_bits())
    }));
}
