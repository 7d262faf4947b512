//! Feature flags word that prefixes every serialized guard set.

use crate::{
    constants::{FEATURE_FLAGS_SIZE, FEATURE_FLAGS_WIDTH},
    types::CandyGuardError,
};

/// Fixed-width bitset, one bit per available guard in program order.
///
/// Bit `i` is set when guard `i` is enabled. In memory bit `i` of the word
/// belongs to guard `i` and packs LSB-first into bytes (byte 0 holds guards
/// 0..8). On the wire the 8 bytes of that word are written in reverse order;
/// [`FeatureFlags::to_bytes`] and [`FeatureFlags::from_bytes`] are the only
/// places that transformation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    bits: u64,
    width: usize,
}

impl FeatureFlags {
    /// Create an empty bitset for `width` guards
    pub fn new(width: usize) -> Result<Self, CandyGuardError> {
        if width > FEATURE_FLAGS_WIDTH {
            return Err(CandyGuardError::FeatureFlagOverflow {
                count: width,
                max: FEATURE_FLAGS_WIDTH,
            });
        }
        Ok(Self { bits: 0, width })
    }

    /// Build a bitset from per-guard enabled states, in program order
    pub fn from_enabled<I>(enabled: I) -> Result<Self, CandyGuardError>
    where
        I: IntoIterator<Item = bool>,
    {
        let enabled: Vec<bool> = enabled.into_iter().collect();
        let mut flags = Self::new(enabled.len())?;
        for (index, is_enabled) in enabled.into_iter().enumerate() {
            flags.set(index, is_enabled);
        }
        Ok(flags)
    }

    /// Decode the wire representation for `width` guards.
    ///
    /// Bits at or beyond `width` are not addressable and read as disabled.
    pub fn from_bytes(bytes: [u8; FEATURE_FLAGS_SIZE], width: usize) -> Result<Self, CandyGuardError> {
        let mut flags = Self::new(width)?;
        let mut word = bytes;
        word.reverse();
        let mask = if width == FEATURE_FLAGS_WIDTH {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        flags.bits = u64::from_le_bytes(word) & mask;
        Ok(flags)
    }

    /// Encode to the wire representation: the little-endian word, byte reversed.
    pub fn to_bytes(&self) -> [u8; FEATURE_FLAGS_SIZE] {
        let mut word = self.bits.to_le_bytes();
        word.reverse();
        word
    }

    pub fn set(&mut self, index: usize, enabled: bool) {
        if index >= self.width {
            return;
        }
        if enabled {
            self.bits |= 1 << index;
        } else {
            self.bits &= !(1 << index);
        }
    }

    pub fn is_set(&self, index: usize) -> bool {
        index < self.width && self.bits & (1 << index) != 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of enabled guards
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }
}
