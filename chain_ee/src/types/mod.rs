//!
//! Consensus value types shared by every layer of the core.
//!

mod action;
mod keys;
mod name;
mod producer;
mod symbol;
mod time;

pub use action::{Action, PermissionLevel, Transaction, TransactionHeader};
pub use keys::{PublicKey, Signature, KEY_TYPE_K1, KEY_TYPE_R1};
pub use name::{name_from_str, Name};
pub use producer::{BlockSigningAuthority, KeyWeight, ProducerAuthority, ProducerKey};
pub use symbol::{Asset, Symbol, SymbolCode};
pub use time::{TimePoint, TimePointSec};

pub type AccountName = Name;
pub type ActionName = Name;
pub type PermissionName = Name;
pub type TableName = Name;
pub type ScopeName = Name;
