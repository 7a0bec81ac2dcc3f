//!
//! The declarative intrinsic registry and the per-call host environment.
//!

use chain_core::ApplyContext;
use chain_ee::types::Name;
use chain_ee::ChainError;
use std::collections::BTreeMap;

/// Guest-visible WASM value types. Pointers are `I32` offsets into linear
/// memory; 128-bit quantities travel as pointer or limb pairs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WasmValType {
    I32,
    I64,
    F32,
    F64,
}

/// A guest value crossing the boundary; floats are carried as raw bits so
/// no host floating-point operation ever touches them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WasmValue {
    I32(i32),
    I64(i64),
    F32(u32),
    F64(u64),
}

impl WasmValue {
    pub fn val_type(self) -> WasmValType {
        match self {
            WasmValue::I32(_) => WasmValType::I32,
            WasmValue::I64(_) => WasmValType::I64,
            WasmValue::F32(_) => WasmValType::F32,
            WasmValue::F64(_) => WasmValType::F64,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WasmSignature {
    pub params: &'static [WasmValType],
    pub ret: Option<WasmValType>,
}

///
/// Where an intrinsic may be called from. `context_free_safe` additionally
/// marks context-aware intrinsics that remain callable while applying a
/// context-free action (pure computation, console, action data).
///
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IntrinsicCategory {
    ContextAware,
    ContextFree,
    Privileged,
    Injected,
}

/// Unwinding signal from a handler: either a fatal chain error, or the
/// guest requested a clean early exit (`eosio_exit`), which the backend
/// translates into stopping the module without failing the action.
#[derive(Debug)]
pub enum Trap {
    Exit,
    Error(ChainError),
}

impl From<ChainError> for Trap {
    fn from(error: ChainError) -> Self {
        Trap::Error(error)
    }
}

impl Trap {
    pub fn into_result(self) -> Result<(), ChainError> {
        match self {
            Trap::Exit => Ok(()),
            Trap::Error(error) => Err(error),
        }
    }
}

pub type Handler =
    Box<dyn Fn(&mut HostEnv<'_, '_, '_>, Args<'_>) -> Result<Option<WasmValue>, Trap> + Send + Sync>;

pub struct IntrinsicDef {
    pub name: &'static str,
    pub category: IntrinsicCategory,
    pub context_free_safe: bool,
    pub signature: WasmSignature,
    pub handler: Handler,
}

///
/// The catalog. Additions are a protocol change; removals are forbidden.
///
#[derive(Default)]
pub struct IntrinsicTable {
    entries: BTreeMap<&'static str, IntrinsicDef>,
}

impl IntrinsicTable {
    /// Builds the complete standard catalog.
    pub fn standard() -> Self {
        let mut table = IntrinsicTable::default();
        crate::intrinsics::register_all(&mut table);
        table
    }

    pub fn add(&mut self, def: IntrinsicDef) {
        let prior = self.entries.insert(def.name, def);
        debug_assert!(prior.is_none(), "duplicate intrinsic registration");
    }

    pub fn get(&self, name: &str) -> Option<&IntrinsicDef> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    ///
    /// Dispatches one guest call: checks the category gate against the
    /// current context, validates argument arity and types, then runs the
    /// handler.
    ///
    pub fn call(
        &self,
        env: &mut HostEnv<'_, '_, '_>,
        name: &str,
        args: &[WasmValue],
    ) -> Result<Option<WasmValue>, Trap> {
        let def = self
            .entries
            .get(name)
            .ok_or_else(|| ChainError::wasm_execution(format!("unknown intrinsic {name}")))?;

        match def.category {
            IntrinsicCategory::ContextAware => {
                if env.context.is_context_free() && !def.context_free_safe {
                    return Err(ChainError::UnaccessibleApi(
                        "only context free api's can be used in this context",
                    )
                    .into());
                }
            }
            IntrinsicCategory::ContextFree => {
                if !env.context.is_context_free() {
                    return Err(ChainError::UnaccessibleApi(
                        "this API may only be called from context_free apply",
                    )
                    .into());
                }
            }
            IntrinsicCategory::Privileged => {
                if env.context.is_context_free() {
                    return Err(ChainError::UnaccessibleApi(
                        "only context free api's can be used in this context",
                    )
                    .into());
                }
                if !env.context.is_privileged() {
                    return Err(ChainError::UnaccessibleApi(
                        "receiver does not have permission to call this API",
                    )
                    .into());
                }
            }
            IntrinsicCategory::Injected => {}
        }

        if args.len() != def.signature.params.len() {
            return Err(ChainError::wasm_execution(format!(
                "intrinsic {name} called with wrong argument count"
            ))
            .into());
        }
        for (value, expected) in args.iter().zip(def.signature.params) {
            if value.val_type() != *expected {
                return Err(ChainError::wasm_execution(format!(
                    "intrinsic {name} called with mismatched argument type"
                ))
                .into());
            }
        }

        (def.handler)(env, Args(args))
    }
}

///
/// Execution environment of one guest call: the apply context plus the
/// module's linear memory. Every pointer is validated against the memory
/// bounds at access time.
///
pub struct HostEnv<'m, 'a, 'c> {
    pub context: &'m mut ApplyContext<'a, 'c>,
    pub memory: &'m mut [u8],
}

impl HostEnv<'_, '_, '_> {
    fn checked_range(&self, ptr: u32, len: u32) -> Result<std::ops::Range<usize>, Trap> {
        let start = ptr as usize;
        let end = start
            .checked_add(len as usize)
            .filter(|&end| end <= self.memory.len())
            .ok_or_else(|| {
                Trap::from(ChainError::wasm_execution(
                    "access violation: pointer outside linear memory",
                ))
            })?;
        Ok(start..end)
    }

    pub fn slice(&self, ptr: u32, len: u32) -> Result<&[u8], Trap> {
        let range = self.checked_range(ptr, len)?;
        Ok(&self.memory[range])
    }

    pub fn slice_mut(&mut self, ptr: u32, len: u32) -> Result<&mut [u8], Trap> {
        let range = self.checked_range(ptr, len)?;
        Ok(&mut self.memory[range])
    }

    pub fn read_bytes(&self, ptr: u32, len: u32) -> Result<Vec<u8>, Trap> {
        Ok(self.slice(ptr, len)?.to_vec())
    }

    pub fn write_bytes(&mut self, ptr: u32, data: &[u8]) -> Result<(), Trap> {
        self.slice_mut(ptr, data.len() as u32)?.copy_from_slice(data);
        Ok(())
    }

    /// C string bounded by `max`; unterminated input is truncated at `max`.
    pub fn read_cstr(&self, ptr: u32, max: usize) -> Result<String, Trap> {
        let start = ptr as usize;
        if start >= self.memory.len() {
            return Err(ChainError::wasm_execution(
                "access violation: pointer outside linear memory",
            )
            .into());
        }
        let tail = &self.memory[start..];
        let len = tail
            .iter()
            .take(max)
            .position(|&b| b == 0)
            .unwrap_or(max.min(tail.len()));
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }

    pub fn read_u64(&self, ptr: u32) -> Result<u64, Trap> {
        let bytes: [u8; 8] = self.slice(ptr, 8)?.try_into().map_err(|_| {
            Trap::from(ChainError::Internal(chain_ee::InternalError("slice size")))
        })?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn write_u64(&mut self, ptr: u32, value: u64) -> Result<(), Trap> {
        self.write_bytes(ptr, &value.to_le_bytes())
    }

    pub fn read_u128(&self, ptr: u32) -> Result<u128, Trap> {
        let bytes: [u8; 16] = self.slice(ptr, 16)?.try_into().map_err(|_| {
            Trap::from(ChainError::Internal(chain_ee::InternalError("slice size")))
        })?;
        Ok(u128::from_le_bytes(bytes))
    }

    pub fn write_u128(&mut self, ptr: u32, value: u128) -> Result<(), Trap> {
        self.write_bytes(ptr, &value.to_le_bytes())
    }

    pub fn read_digest(&self, ptr: u32) -> Result<[u8; 32], Trap> {
        let bytes: [u8; 32] = self.slice(ptr, 32)?.try_into().map_err(|_| {
            Trap::from(ChainError::Internal(chain_ee::InternalError("slice size")))
        })?;
        Ok(bytes)
    }

    ///
    /// Copies `data` out with the reader convention: a zero-sized buffer
    /// asks for the required size, otherwise a truncated prefix is copied
    /// and its length returned.
    ///
    pub fn copy_out(&mut self, ptr: u32, buffer_size: u32, data: &[u8]) -> Result<i32, Trap> {
        if buffer_size == 0 {
            return Ok(data.len() as i32);
        }
        let n = data.len().min(buffer_size as usize);
        self.write_bytes(ptr, &data[..n])?;
        Ok(n as i32)
    }

    ///
    /// Copies packed data out with the packed-getter convention: a
    /// zero-sized buffer asks for the size, an insufficient buffer returns
    /// 0, otherwise the whole payload is copied and its size returned.
    ///
    pub fn copy_packed(&mut self, ptr: u32, buffer_size: u32, data: &[u8]) -> Result<i32, Trap> {
        if buffer_size == 0 {
            return Ok(data.len() as i32);
        }
        if data.len() <= buffer_size as usize {
            self.write_bytes(ptr, data)?;
            Ok(data.len() as i32)
        } else {
            Ok(0)
        }
    }
}

/// Typed access to the raw argument list; indices follow the declared
/// signature, which `call` has already validated.
#[derive(Clone, Copy)]
pub struct Args<'a>(pub &'a [WasmValue]);

impl Args<'_> {
    pub fn i32(&self, index: usize) -> i32 {
        match self.0[index] {
            WasmValue::I32(v) => v,
            _ => 0,
        }
    }

    pub fn u32(&self, index: usize) -> u32 {
        self.i32(index) as u32
    }

    pub fn i64(&self, index: usize) -> i64 {
        match self.0[index] {
            WasmValue::I64(v) => v,
            _ => 0,
        }
    }

    pub fn u64(&self, index: usize) -> u64 {
        self.i64(index) as u64
    }

    pub fn name(&self, index: usize) -> Name {
        Name(self.u64(index))
    }

    pub fn f32_bits(&self, index: usize) -> u32 {
        match self.0[index] {
            WasmValue::F32(bits) => bits,
            _ => 0,
        }
    }

    pub fn f64_bits(&self, index: usize) -> u64 {
        match self.0[index] {
            WasmValue::F64(bits) => bits,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete_and_stable() {
        let table = IntrinsicTable::standard();
        // the frozen ABI: spot-check presence across every family
        for name in [
            "read_action_data",
            "require_auth",
            "current_time",
            "eosio_assert_code",
            "prints_l",
            "db_store_i64",
            "db_idx_long_double_upperbound",
            "memcpy",
            "recover_key",
            "assert_ripemd160",
            "check_transaction_authorization",
            "set_proposed_producers_ex",
            "get_active_producers",
            "send_inline",
            "read_transaction",
            "get_context_free_data",
            "get_token_symbol",
            "set_system_token_list_packed",
            "trx_fee_payer",
            "get_top_transaction_vote_receivers_packed",
            "checktime",
            "call_depth_assert",
            "_eosio_f32_add",
            "_eosio_f64_trunc_i64u",
            "__divti3",
            "__unordtf2",
        ] {
            assert!(table.get(name).is_some(), "missing intrinsic {name}");
        }
        assert!(table.len() > 190);
    }
}
