//! Assembling a DOL's requested payload from whatever source each tag
//! names: terminal config, transaction data, live session state (TVR/CVR),
//! the RNG, or (for anything the table doesn't special-case) the card's own
//! data, falling back to zero-fill.

use crate::model::consts::Tvr;
use crate::model::{Terminal, Transaction};
use crate::rng::unpredictable_number;
use crate::tlv::{Dol, FieldMap, FieldMapExt};

/// Everything the builder might need to resolve a tag, gathered in one
/// place so call sites don't have to thread five separate arguments.
pub struct DolContext<'a> {
    pub terminal: &'a Terminal,
    pub transaction: &'a Transaction,
    pub tvr: Tvr,
    pub cvr: u16,
    pub data_authentication_code: Option<[u8; 2]>,
    pub card_information_raw: &'a FieldMap,
    pub processing_options_raw: &'a FieldMap,
}

fn bcd_encode(mut value: u64, len: usize) -> Vec<u8> {
    let mut digits = Vec::with_capacity(len * 2);
    for _ in 0..len * 2 {
        digits.push((value % 10) as u8);
        value /= 10;
    }
    digits.reverse();
    digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect()
}

/// Fit `value` to exactly `len` bytes: left-pad with zeros when it's
/// shorter (numeric convention), truncate the excess high-order bytes when
/// longer.
fn fit_numeric(value: &[u8], len: usize) -> Vec<u8> {
    if value.len() >= len {
        return value[value.len() - len..].to_vec();
    }
    let mut out = vec![0u8; len - value.len()];
    out.extend_from_slice(value);
    out
}

/// Fit `value` to exactly `len` bytes: right-pad with zeros when shorter
/// (byte-sequence convention), truncate the excess trailing bytes when
/// longer.
fn fit_bytes(value: &[u8], len: usize) -> Vec<u8> {
    if value.len() >= len {
        return value[..len].to_vec();
    }
    let mut out = value.to_vec();
    out.resize(len, 0);
    out
}

fn resolve_tag(tag: u16, len: usize, ctx: &DolContext) -> Vec<u8> {
    match tag {
        0x9f02 => fit_numeric(&bcd_encode(ctx.transaction.amount_authorized, len), len),
        0x9f03 => fit_numeric(&bcd_encode(ctx.transaction.amount_other, len), len),
        0x9f1a => fit_bytes(&ctx.terminal.country_code, len),
        0x95 => fit_bytes(&ctx.tvr.to_bytes(), len),
        0x5f2a => fit_bytes(&ctx.terminal.currency_code, len),
        0x9a => fit_bytes(&ctx.transaction.date, len),
        0x9c => fit_bytes(&[ctx.transaction.transaction_type], len),
        0x9f37 => unpredictable_number(len),
        0x9f35 => fit_bytes(&[ctx.terminal.terminal_type], len),
        0x9f45 => match ctx.data_authentication_code {
            Some(dac) => fit_bytes(&dac, len),
            None => vec![0u8; len],
        },
        0x9f34 => fit_numeric(&ctx.cvr.to_be_bytes(), len),
        0x9f33 => fit_bytes(&ctx.terminal.capabilities, len),
        0x9f40 => fit_bytes(&ctx.terminal.additional_capabilities, len),
        _ => {
            let from_card = ctx.card_information_raw.get_bytes(tag);
            let from_processing_options = ctx.processing_options_raw.get_bytes(tag);
            match from_card.or(from_processing_options) {
                Some(value) => fit_bytes(value, len),
                None => vec![0u8; len],
            }
        }
    }
}

/// Build the concatenated payload a DOL describes, resolving each entry in
/// list order.
pub fn build(dol: &Dol, ctx: &DolContext) -> Vec<u8> {
    let mut out = Vec::with_capacity(dol.size());
    for entry in &dol.entries {
        out.extend(resolve_tag(entry.tag, entry.length, ctx));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tlv::{DolEntry, FieldMap};

    fn sample_ctx<'a>(terminal: &'a Terminal, transaction: &'a Transaction, empty: &'a FieldMap) -> DolContext<'a> {
        DolContext {
            terminal,
            transaction,
            tvr: Tvr::new(),
            cvr: 0,
            data_authentication_code: None,
            card_information_raw: empty,
            processing_options_raw: empty,
        }
    }

    #[test]
    fn builds_amount_date_and_unpredictable_number_vector_from_spec() {
        let terminal = Terminal::default();
        let transaction = Transaction {
            amount_authorized: 100,
            amount_other: 0,
            date: [0x23, 0x01, 0x01],
            transaction_type: 0x00,
        };
        let empty = FieldMap::new();
        let ctx = sample_ctx(&terminal, &transaction, &empty);

        let dol = Dol {
            entries: vec![
                DolEntry { tag: 0x9f02, length: 6 },
                DolEntry { tag: 0x9a, length: 3 },
                DolEntry { tag: 0x9f37, length: 4 },
            ],
        };
        let payload = build(&dol, &ctx);
        assert_eq!(payload.len(), 13);
        assert_eq!(&payload[0..6], &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(&payload[6..9], &[0x23, 0x01, 0x01]);
    }

    #[test]
    fn dac_zero_fills_when_not_yet_authenticated() {
        let terminal = Terminal::default();
        let transaction = Transaction {
            amount_authorized: 0,
            amount_other: 0,
            date: [0, 0, 0],
            transaction_type: 0,
        };
        let empty = FieldMap::new();
        let ctx = sample_ctx(&terminal, &transaction, &empty);
        let dol = Dol {
            entries: vec![DolEntry { tag: 0x9f45, length: 2 }],
        };
        assert_eq!(build(&dol, &ctx), vec![0x00, 0x00]);
    }

    #[test]
    fn unknown_tag_falls_back_to_card_information_then_zero() {
        let terminal = Terminal::default();
        let transaction = Transaction {
            amount_authorized: 0,
            amount_other: 0,
            date: [0, 0, 0],
            transaction_type: 0,
        };
        let mut card_info = FieldMap::new();
        card_info.set_bytes(0x9f1e, vec![0xAB, 0xCD]);
        let empty = FieldMap::new();
        let ctx = DolContext {
            terminal: &terminal,
            transaction: &transaction,
            tvr: Tvr::new(),
            cvr: 0,
            data_authentication_code: None,
            card_information_raw: &card_info,
            processing_options_raw: &empty,
        };
        let dol = Dol {
            entries: vec![DolEntry { tag: 0x9f1e, length: 2 }],
        };
        assert_eq!(build(&dol, &ctx), vec![0xAB, 0xCD]);

        let dol_missing = Dol {
            entries: vec![DolEntry { tag: 0x9f16, length: 3 }],
        };
        assert_eq!(build(&dol_missing, &ctx), vec![0x00, 0x00, 0x00]);
    }
}
