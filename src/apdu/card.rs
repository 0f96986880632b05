//! High-level card operations built on the APDU/status-word layer: SELECT,
//! READ RECORD, GET PROCESSING OPTIONS and friends, expressed as command
//! constructors over the generic [`Transport`] trait.

use log::trace;

use crate::apdu::command::Apdu;
use crate::apdu::transport::{send, Transport};
use crate::error::KernelError;

pub const SW_OK: u16 = 0x9000;

fn require_ok(status: u16, context: &'static str) -> Result<(), KernelError> {
    if status != SW_OK {
        return Err(KernelError::CardStatus {
            sw1: (status >> 8) as u8,
            sw2: (status & 0xFF) as u8,
            context,
        });
    }
    Ok(())
}

/// Select a file or application by name. Returns `Ok(None)` rather than an
/// error when the card answers "file not found" (`6A82`/`6A83`), since that
/// is how directory probing (§ application discovery) distinguishes
/// end-of-list from a genuine transport fault.
pub fn select<T: Transport + ?Sized>(
    transport: &mut T,
    name: &[u8],
    first: bool,
) -> Result<Option<(Vec<u8>, u16)>, KernelError> {
    let (body, status) = send(transport, &Apdu::select(name, first))?;
    if status == 0x6a82 || status == 0x6a83 {
        return Ok(None);
    }
    require_ok(status, "SELECT")?;
    Ok(Some((body, status)))
}

/// Read one record of `sfi`. Returns `Ok(None)` for "record not found"
/// (`6A83`), which a caller uses to detect the end of a file.
pub fn read_record<T: Transport + ?Sized>(
    transport: &mut T,
    sfi: u8,
    record: u8,
) -> Result<Option<Vec<u8>>, KernelError> {
    let (body, status) = send(transport, &Apdu::read_record(sfi, record))?;
    if status == 0x6a83 {
        return Ok(None);
    }
    require_ok(status, "READ RECORD")?;
    Ok(Some(body))
}

pub fn get_processing_options<T: Transport + ?Sized>(
    transport: &mut T,
    pdol_payload: Vec<u8>,
) -> Result<Vec<u8>, KernelError> {
    let (body, status) = send(transport, &Apdu::get_processing_options(pdol_payload))?;
    require_ok(status, "GET PROCESSING OPTIONS")?;
    Ok(body)
}

/// Build the 8-byte plaintext PIN block for format 2 VERIFY, per EMV 4.4
/// Book 3 Annex A1.
pub fn pin_block(pin: &str) -> Result<[u8; 8], KernelError> {
    if pin.len() < 4 || pin.len() > 12 || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KernelError::BadPinLength(pin.len()));
    }
    let digits: Vec<u8> = pin.bytes().map(|b| b - b'0').collect();
    let mut block = [0xFFu8; 8];
    block[0] = 0x20 | digits.len() as u8;

    let mut nibbles = Vec::with_capacity(14);
    nibbles.extend(digits.iter().copied());
    while nibbles.len() < 14 {
        nibbles.push(0xF);
    }
    for (i, pair) in nibbles.chunks(2).enumerate() {
        block[1 + i] = (pair[0] << 4) | pair[1];
    }
    Ok(block)
}

pub fn verify_pin<T: Transport + ?Sized>(
    transport: &mut T,
    pin: &str,
) -> Result<(), KernelError> {
    let block = pin_block(pin)?;
    let (_, status) = send(transport, &Apdu::verify_pin(block))?;
    trace!("VERIFY status {status:04x}");
    require_ok(status, "VERIFY")
}

pub fn generate_ac<T: Transport + ?Sized>(
    transport: &mut T,
    kind: u8,
    dol_payload: Vec<u8>,
) -> Result<Vec<u8>, KernelError> {
    let (body, status) = send(transport, &Apdu::generate_ac(kind, dol_payload))?;
    require_ok(status, "GENERATE AC")?;
    Ok(body)
}

pub fn internal_authenticate<T: Transport + ?Sized>(
    transport: &mut T,
    ddol_payload: Vec<u8>,
) -> Result<Vec<u8>, KernelError> {
    let (body, status) = send(transport, &Apdu::internal_authenticate(ddol_payload))?;
    require_ok(status, "INTERNAL AUTHENTICATE")?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_block_short_pin() {
        let block = pin_block("1234").unwrap();
        assert_eq!(block, [0x24, 0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn pin_block_full_length_pin() {
        let block = pin_block("123456789012").unwrap();
        assert_eq!(block, [0x2C, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0xFF]);
    }

    #[test]
    fn pin_block_rejects_bad_lengths() {
        assert!(matches!(pin_block("123"), Err(KernelError::BadPinLength(3))));
        assert!(matches!(
            pin_block("1234567890123"),
            Err(KernelError::BadPinLength(13))
        ));
    }

    #[test]
    fn pin_block_rejects_non_digits() {
        assert!(pin_block("12a4").is_err());
    }
}
