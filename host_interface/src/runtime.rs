//!
//! WASM backend selection and the seam the core drives backends through.
//!
//! The core never parses or compiles WASM itself: a backend instantiates a
//! module for a code hash, runs its `apply` export, and forwards every
//! imported host function into the intrinsic table. Backends may compile
//! concurrently on helper threads, so module lookup takes `&self`.
//!

use crate::registry::IntrinsicTable;
use chain_core::ApplyContext;
use chain_ee::ChainError;
use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VmType {
    Wabt,
    EosVm,
    EosVmJit,
    EosVmOc,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UnknownVmType(pub String);

impl fmt::Display for UnknownVmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown wasm runtime '{}'", self.0)
    }
}

impl std::error::Error for UnknownVmType {}

impl FromStr for VmType {
    type Err = UnknownVmType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wabt" => Ok(VmType::Wabt),
            "eos-vm" => Ok(VmType::EosVm),
            "eos-vm-jit" => Ok(VmType::EosVmJit),
            "eos-vm-oc" => Ok(VmType::EosVmOc),
            other => Err(UnknownVmType(other.to_owned())),
        }
    }
}

impl fmt::Display for VmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VmType::Wabt => "wabt",
            VmType::EosVm => "eos-vm",
            VmType::EosVmJit => "eos-vm-jit",
            VmType::EosVmOc => "eos-vm-oc",
        })
    }
}

/// Runtime selection made at configuration time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RuntimeConfig {
    pub vm: VmType,
    /// Run the ahead-of-time backend alongside the baseline, switching to
    /// compiled code as it becomes available.
    pub oc_tierup: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            vm: VmType::EosVmJit,
            oc_tierup: false,
        }
    }
}

pub trait InstantiatedModule: Send + Sync {
    ///
    /// Runs the module's `apply` entry for the context's action, routing
    /// every host import through `intrinsics`. A `Trap::Exit` raised by a
    /// handler stops execution without an error.
    ///
    fn apply(
        &self,
        intrinsics: &IntrinsicTable,
        context: &mut ApplyContext<'_, '_>,
    ) -> Result<(), ChainError>;
}

pub trait WasmBackend: Send + Sync {
    ///
    /// Resolves (and lazily compiles) the module for a code hash. Safe to
    /// call while another thread compiles the same code.
    ///
    fn get_instantiated_module(
        &self,
        code_hash: &[u8; 32],
        vm_type: u8,
        vm_version: u8,
    ) -> Result<Arc<dyn InstantiatedModule>, ChainError>;

    /// Requests unwind of the running module (`eosio_exit`).
    fn immediately_exit_currently_running_module(&self);
}

///
/// Bridges the transaction machinery to a WASM backend: resolves the
/// receiver's deployed code and runs it against the intrinsic table.
/// Receivers without code (plain accounts receiving notifications) apply
/// as a no-op.
///
pub struct BackendRunner<'a> {
    pub backend: &'a dyn WasmBackend,
    pub intrinsics: &'a IntrinsicTable,
    pub vm_type: u8,
    pub vm_version: u8,
}

impl chain_core::CodeRunner for BackendRunner<'_> {
    fn apply(&mut self, context: &mut ApplyContext<'_, '_>) -> Result<(), ChainError> {
        let code_hash = context
            .chain_db()
            .account(context.receiver())
            .and_then(|meta| meta.code_hash);
        let code_hash = match code_hash {
            Some(hash) => hash,
            None => return Ok(()),
        };
        let module =
            self.backend
                .get_instantiated_module(&code_hash, self.vm_type, self.vm_version)?;
        module.apply(self.intrinsics, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_names_parse() {
        assert_eq!("wabt".parse::<VmType>().unwrap(), VmType::Wabt);
        assert_eq!("eos-vm".parse::<VmType>().unwrap(), VmType::EosVm);
        assert_eq!("eos-vm-jit".parse::<VmType>().unwrap(), VmType::EosVmJit);
        assert_eq!("eos-vm-oc".parse::<VmType>().unwrap(), VmType::EosVmOc);
        assert!("wavm".parse::<VmType>().is_err());
    }
}
