//!
//! Token symbols and asset amounts.
//!
//! A symbol packs the decimal precision into the low byte and up to seven
//! `A`-`Z` code characters into the upper bytes. An asset is a signed amount
//! interpreted at the precision of its symbol.
//!

use crate::codec::{CodecError, Pack, Unpack};
use core::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Symbol(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct SymbolCode(pub u64);

impl Symbol {
    pub const fn new(precision: u8, code: SymbolCode) -> Self {
        Symbol((code.0 << 8) | precision as u64)
    }

    pub const fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub const fn code(self) -> SymbolCode {
        SymbolCode(self.0 >> 8)
    }

    /// A symbol is valid when its code is non-empty, uses only `A`-`Z` and
    /// has no embedded NUL gaps.
    pub fn valid(self) -> bool {
        self.code().valid()
    }
}

impl SymbolCode {
    pub fn from_str_checked(s: &str) -> Option<SymbolCode> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 7 {
            return None;
        }
        let mut value: u64 = 0;
        for (i, &c) in bytes.iter().enumerate() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            value |= (c as u64) << (8 * i);
        }
        Some(SymbolCode(value))
    }

    pub fn valid(self) -> bool {
        let mut v = self.0;
        if v == 0 {
            return false;
        }
        let mut seen_end = false;
        for _ in 0..7 {
            let c = (v & 0xff) as u8;
            if c == 0 {
                seen_end = true;
            } else if seen_end || !c.is_ascii_uppercase() {
                return false;
            }
            v >>= 8;
        }
        v == 0
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut v = self.0;
        while v != 0 {
            let c = (v & 0xff) as u8;
            if c != 0 {
                f.write_str(core::str::from_utf8(&[c]).map_err(|_| fmt::Error)?)?;
            }
            v >>= 8;
        }
        Ok(())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

///
/// A token amount paired with the symbol it is denominated in.
///
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub const MAX_AMOUNT: i64 = (1 << 62) - 1;

    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Asset { amount, symbol }
    }

    pub fn valid(&self) -> bool {
        self.amount >= -Asset::MAX_AMOUNT
            && self.amount <= Asset::MAX_AMOUNT
            && self.symbol.valid()
    }
}

impl Pack for Symbol {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.0.pack_into(out);
    }
}

impl Unpack for Symbol {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Symbol(u64::unpack_from(input)?))
    }
}

impl Pack for Asset {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.amount.pack_into(out);
        self.symbol.pack_into(out);
    }
}

impl Unpack for Asset {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(Asset {
            amount: i64::unpack_from(input)?,
            symbol: Symbol::unpack_from(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        let code = SymbolCode::from_str_checked("DKRW").unwrap();
        assert_eq!(code.to_string(), "DKRW");
        assert!(code.valid());
    }

    #[test]
    fn symbol_validity() {
        assert!(Symbol::new(4, SymbolCode::from_str_checked("EOS").unwrap()).valid());
        assert!(!Symbol(0).valid());
        // embedded gap: NUL between characters
        assert!(!SymbolCode(0x41_00_41).valid());
        assert!(!SymbolCode(0x61).valid()); // lowercase
    }
}
