//!
//! The host-intrinsic surface exposed to guest WASM.
//!
//! A single [`IntrinsicTable`] holds the whole catalog as data: name,
//! category, guest type signature and a typed handler. The table is built
//! by explicit registration at construction; backends resolve imports
//! against it and funnel every guest call through [`IntrinsicTable::call`],
//! which enforces the category gates and pointer bounds before any handler
//! logic runs.
//!

mod registry;
mod runtime;

pub mod intrinsics;

pub use registry::{
    Args, HostEnv, IntrinsicCategory, IntrinsicDef, IntrinsicTable, Trap, WasmSignature,
    WasmValType, WasmValue,
};
pub use runtime::{
    BackendRunner, InstantiatedModule, RuntimeConfig, UnknownVmType, VmType, WasmBackend,
};
