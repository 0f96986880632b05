//! AIP, TVR and cryptogram-type bit constants. The TVR is logically a
//! 40-bit field; it's represented here as a `u64` bitmask with only the low
//! 40 bits used.

pub const AIP_SDA_SUPPORTED: u16 = 1 << 14;
pub const AIP_DDA_SUPPORTED: u16 = 1 << 13;
pub const AIP_CVM_SUPPORTED: u16 = 1 << 12;
pub const AIP_TERMINAL_RISK_MANAGEMENT: u16 = 1 << 11;
pub const AIP_ISSUER_AUTHENTICATION: u16 = 1 << 10;
pub const AIP_CDA_SUPPORTED: u16 = 1 << 8;

pub const TVR_CDA_FAILED: u64 = 1 << 2;
pub const TVR_DDA_FAILED: u64 = 1 << 3;
pub const TVR_HOTLIST: u64 = 1 << 4;
pub const TVR_ICC_DATA_MISSING: u64 = 1 << 5;
pub const TVR_SDA_FAILED: u64 = 1 << 6;
pub const TVR_OFFLINE_NOT_PERFORMED: u64 = 1 << 7;
pub const TVR_NEW_CARD: u64 = 1 << 11;
pub const TVR_NOT_PRODUCT_ALLOWED: u64 = 1 << 12;
pub const TVR_NOT_YET_EFFECTIVE: u64 = 1 << 13;
pub const TVR_EXPIRED_APPLICATION: u64 = 1 << 14;
pub const TVR_DIFFERENT_VERSIONS: u64 = 1 << 15;
pub const TVR_ONLINE_PIN_ENTERED: u64 = 1 << 18;
pub const TVR_PIN_NOT_ENTERED: u64 = 1 << 19;
pub const TVR_NO_PINPAD: u64 = 1 << 20;
pub const TVR_PIN_TRY_LIMIT: u64 = 1 << 21;
pub const TVR_UNRECOGNIZED_CVM: u64 = 1 << 22;
pub const TVR_CVM_FAILED: u64 = 1 << 23;
pub const TVR_FORCED_ONLINE: u64 = 1 << 27;
pub const TVR_RANDOM_ONLINE: u64 = 1 << 28;
pub const TVR_OFFLINE_UPPER_LIMIT: u64 = 1 << 29;
pub const TVR_OFFLINE_LOWER_LIMIT: u64 = 1 << 30;
pub const TVR_FLOOR_LIMIT: u64 = 1 << 31;
pub const TVR_SCRIPT_FAILED_AFTER_AC: u64 = 1 << 36;
pub const TVR_SCRIPT_FAILED_BEFORE_AC: u64 = 1 << 37;
pub const TVR_ISSUER_AUTH_FAILED: u64 = 1 << 38;
pub const TVR_DEFAULT_DDOL: u64 = 1 << 39;

pub const AC_AAC: u8 = 0;
pub const AC_TC: u8 = 1 << 6;
pub const AC_ARQC: u8 = 1 << 7;
pub const AC_CDA_REQUESTED: u8 = 1 << 4;

/// A monotone Terminal Verification Results accumulator: bits are only ever
/// set, never cleared, for the duration of one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tvr(u64);

impl Tvr {
    pub fn new() -> Self {
        Tvr(0)
    }

    pub fn set(&mut self, bit: u64) {
        self.0 |= bit;
    }

    pub fn is_set(&self, bit: u64) -> bool {
        self.0 & bit != 0
    }

    pub fn to_bytes(self) -> [u8; 5] {
        let mut out = [0u8; 5];
        for (i, slot) in out.iter_mut().enumerate() {
            let shift = 8 * (4 - i);
            *slot = (self.0 >> shift) as u8;
        }
        out
    }

    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        let mut value: u64 = 0;
        for &b in &bytes {
            value = (value << 8) | b as u64;
        }
        Tvr(value)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tvr_starts_at_zero() {
        assert_eq!(Tvr::new().to_bytes(), [0u8; 5]);
    }

    #[test]
    fn tvr_bits_are_only_ever_set() {
        let mut tvr = Tvr::new();
        tvr.set(TVR_SDA_FAILED);
        assert!(tvr.is_set(TVR_SDA_FAILED));
        let before = tvr.raw();
        tvr.set(TVR_SDA_FAILED);
        assert_eq!(tvr.raw(), before);
        tvr.set(TVR_CVM_FAILED);
        assert!(tvr.is_set(TVR_SDA_FAILED));
        assert!(tvr.is_set(TVR_CVM_FAILED));
    }

    #[test]
    fn tvr_round_trips_through_bytes() {
        let mut tvr = Tvr::new();
        tvr.set(TVR_ISSUER_AUTH_FAILED);
        tvr.set(TVR_FLOOR_LIMIT);
        let bytes = tvr.to_bytes();
        assert_eq!(Tvr::from_bytes(bytes), tvr);
    }
}
