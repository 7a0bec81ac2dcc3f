//!
//! The intrinsic catalog, one module per API family.
//!

pub mod action;
pub mod auth;
pub mod builtins;
pub mod console;
pub mod crypto;
pub mod db;
pub mod fee;
pub mod memory;
pub mod permission;
pub mod privileged;
pub mod producer;
pub mod softfloat_api;
pub mod system;
pub mod token;
pub mod transaction;

use crate::registry::{
    Args, HostEnv, IntrinsicCategory, IntrinsicDef, IntrinsicTable, Trap, WasmSignature,
    WasmValType, WasmValue,
};

pub(crate) fn register_all(table: &mut IntrinsicTable) {
    action::register(table);
    auth::register(table);
    builtins::register(table);
    console::register(table);
    crypto::register(table);
    db::register(table);
    fee::register(table);
    memory::register(table);
    permission::register(table);
    privileged::register(table);
    producer::register(table);
    softfloat_api::register(table);
    system::register(table);
    token::register(table);
    transaction::register(table);
}

/// Shorthand for one catalog entry.
pub(crate) fn def(
    name: &'static str,
    category: IntrinsicCategory,
    context_free_safe: bool,
    params: &'static [WasmValType],
    ret: Option<WasmValType>,
    handler: impl Fn(&mut HostEnv<'_, '_, '_>, Args<'_>) -> Result<Option<WasmValue>, Trap>
        + Send
        + Sync
        + 'static,
) -> IntrinsicDef {
    IntrinsicDef {
        name,
        category,
        context_free_safe,
        signature: WasmSignature { params, ret },
        handler: Box::new(handler),
    }
}

pub(crate) use IntrinsicCategory::{ContextAware, ContextFree, Injected, Privileged};
pub(crate) use WasmValType::{F32, F64, I32, I64};
