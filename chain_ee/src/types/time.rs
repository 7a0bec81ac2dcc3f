use crate::codec::{CodecError, Pack, Unpack};

/// Microseconds since the UNIX epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TimePoint(pub u64);

/// Whole seconds since the UNIX epoch, as used in transaction headers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TimePointSec(pub u32);

impl TimePoint {
    pub const fn micros(self) -> u64 {
        self.0
    }

    pub fn saturating_add_micros(self, us: u64) -> TimePoint {
        TimePoint(self.0.saturating_add(us))
    }
}

impl TimePointSec {
    pub const fn secs(self) -> u32 {
        self.0
    }
}

impl Pack for TimePoint {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.0.pack_into(out);
    }
}

impl Unpack for TimePoint {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TimePoint(u64::unpack_from(input)?))
    }
}

impl Pack for TimePointSec {
    fn pack_into(&self, out: &mut Vec<u8>) {
        self.0.pack_into(out);
    }
}

impl Unpack for TimePointSec {
    fn unpack_from(input: &mut &[u8]) -> Result<Self, CodecError> {
        Ok(TimePointSec(u32::unpack_from(input)?))
    }
}
