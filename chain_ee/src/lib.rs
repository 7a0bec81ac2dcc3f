//!
//! Shared leaf crate of the execution core: account/action naming, token
//! symbols, the binary wire codec, the error taxonomy raised by host
//! intrinsics, chain configuration, and the snapshot section traits.
//!
//! Everything here is consensus-facing; nothing in this crate touches the
//! state store or the WASM backend.
//!

pub mod codec;
pub mod config;
pub mod errors;
pub mod logger;
pub mod snapshot;
pub mod types;

pub use errors::{ChainError, InternalError};
pub use types::{
    AccountName, ActionName, Asset, Name, PermissionLevel, PermissionName, ScopeName, Symbol,
    TableName, TimePoint, TimePointSec,
};
