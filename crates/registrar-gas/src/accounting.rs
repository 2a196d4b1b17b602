//! Turns gas measured by the gas meter into transaction gas estimates.

/// Intrinsic gas of every transaction, not included in the measurement of an
/// inner call.
pub const TRANSACTION_BASE: u64 = 21000;

/// Correction fitted by back-testing measured registrations against mined
/// ones. Re-tune when the controller or the meter changes.
pub const REGISTRATION_CORRECTION: u64 = 3750;

const ZERO_BYTE: u64 = 4;
const NON_ZERO_BYTE: u64 = 16;

/// Gas charged for `data` as transaction calldata.
pub fn calldata_gas(data: &[u8]) -> u64 {
    data.iter()
        .map(|byte| if *byte == 0 { ZERO_BYTE } else { NON_ZERO_BYTE })
        .sum()
}

/// Estimate for a `register` transaction with `calldata`, given the gas the
/// meter measured for the inner call.
pub fn registration(measured: u64, calldata: &[u8]) -> u64 {
    measured
        .saturating_add(TRANSACTION_BASE)
        .saturating_sub(calldata_gas(calldata))
        .saturating_sub(REGISTRATION_CORRECTION)
}

/// Estimate for a `renew` or `renewAll` transaction.
pub fn renewal(measured: u64) -> u64 {
    measured.saturating_add(TRANSACTION_BASE)
}

/// Fixed estimates served for local development chains.
pub mod local {
    const REGISTRATION: u64 = 270000;
    const MULTIPLE_RECORDS: u64 = 50000;
    const REVERSE_RECORD: u64 = 80000;
    const RENEWAL: u64 = 105000;
    const BULK_RENEWAL_PER_LABEL: u64 = 42000;

    pub fn registration(records: usize, reverse_record: bool) -> u64 {
        let mut gas = REGISTRATION;
        if records > 1 {
            gas += MULTIPLE_RECORDS;
        }
        if reverse_record {
            gas += REVERSE_RECORD;
        }
        gas
    }

    pub fn extension(labels: usize) -> u64 {
        match labels {
            0 | 1 => RENEWAL,
            n => RENEWAL + BULK_RENEWAL_PER_LABEL * n as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calldata_gas_per_byte() {
        assert_eq!(calldata_gas(&[]), 0);
        assert_eq!(calldata_gas(&[0; 10]), 40);
        assert_eq!(calldata_gas(&[0xff; 10]), 160);
        assert_eq!(calldata_gas(&[0, 1, 0, 2]), 40);
    }

    #[test]
    fn registration_estimate() {
        // 36 bytes: 4 non-zero selector bytes, 31 zero padding bytes and 1.
        let mut calldata = vec![0x74, 0x69, 0x4a, 0x2b];
        calldata.extend([0; 31]);
        calldata.push(1);
        assert_eq!(calldata_gas(&calldata), 4 * 16 + 31 * 4 + 16);
        assert_eq!(registration(250000, &calldata), 250000 + 21000 - 204 - 3750);
    }

    #[test]
    fn registration_estimate_does_not_underflow() {
        assert_eq!(registration(0, &[0xff; 10000]), 0);
    }

    #[test]
    fn renewal_estimate() {
        assert_eq!(renewal(60000), 81000);
    }

    #[test]
    fn huge_measurements_saturate() {
        assert_eq!(renewal(u64::MAX), u64::MAX);
        assert_eq!(
            registration(u64::MAX, &[]),
            u64::MAX - REGISTRATION_CORRECTION
        );
    }

    #[test]
    fn local_registration() {
        assert_eq!(local::registration(1, false), 270000);
        assert_eq!(local::registration(2, false), 320000);
        assert_eq!(local::registration(1, true), 350000);
        assert_eq!(local::registration(0, false), 270000);
        assert_eq!(local::registration(3, true), 400000);
    }

    #[test]
    fn local_extension() {
        assert_eq!(local::extension(1), 105000);
        assert_eq!(local::extension(2), 189000);
        assert_eq!(local::extension(3), 231000);
    }
}
