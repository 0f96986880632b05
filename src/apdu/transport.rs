//! Status-word chaining on top of a raw transmit primitive, generalised
//! behind a [`Transport`] trait so the chaining logic can be tested against
//! a stub instead of real `pcsc` hardware.

use log::{debug, trace};

use crate::apdu::command::Apdu;
use crate::error::KernelError;

/// Something that can transmit one raw APDU and return the raw response,
/// including its trailing two-byte status word.
pub trait Transport {
    fn transmit_raw(&mut self, apdu: &[u8]) -> Result<Vec<u8>, KernelError>;

    /// Reset the card at the end of a session. A session may have left the
    /// card PIN-authenticated or mid-chain; resetting puts it back in a
    /// known state for whoever uses it next. Default no-op for transports
    /// (like test stubs) that have no such notion.
    fn reset(&mut self) -> Result<(), KernelError> {
        Ok(())
    }
}

impl Transport for pcsc::Card {
    fn transmit_raw(&mut self, apdu: &[u8]) -> Result<Vec<u8>, KernelError> {
        let mut buffer = [0u8; 262];
        let response = self
            .transmit(apdu, &mut buffer)
            .map_err(|e| KernelError::CardTransport(e.to_string()))?;
        Ok(response.to_vec())
    }

    fn reset(&mut self) -> Result<(), KernelError> {
        self.reconnect(pcsc::ShareMode::Exclusive, pcsc::Protocols::ANY, pcsc::Disposition::ResetCard)
            .map_err(|e| KernelError::CardTransport(e.to_string()))
    }
}

fn split_status(raw: &[u8]) -> Result<(&[u8], u8, u8), KernelError> {
    if raw.len() < 2 {
        return Err(KernelError::CardTransport(
            "response shorter than a status word".to_string(),
        ));
    }
    let (body, sw) = raw.split_at(raw.len() - 2);
    Ok((body, sw[0], sw[1]))
}

/// Send `apdu`, following `61xx` (more data, GET RESPONSE) and `6Cxx`
/// (wrong `Le`, reissue) chaining until a terminal status word is reached.
pub fn send<T: Transport + ?Sized>(
    transport: &mut T,
    apdu: &Apdu,
) -> Result<(Vec<u8>, u16), KernelError> {
    trace!(
        "-> CLA={:02x} INS={:02x} P1={:02x} P2={:02x} data={}",
        apdu.class,
        apdu.instruction,
        apdu.p1,
        apdu.p2,
        hex::encode(&apdu.data)
    );

    let raw = transport.transmit_raw(&apdu.encode())?;
    let (body, mut sw1, mut sw2) = split_status(&raw)?;
    let mut response = body.to_vec();

    if sw1 == 0x6c {
        let retry = Apdu {
            expected: sw2 as u32,
            ..apdu.clone()
        };
        let raw = transport.transmit_raw(&retry.encode())?;
        let (body, new_sw1, new_sw2) = split_status(&raw)?;
        response = body.to_vec();
        sw1 = new_sw1;
        sw2 = new_sw2;
    }

    while sw1 == 0x61 {
        let raw = transport.transmit_raw(&Apdu::get_response(sw2).encode())?;
        let (body, new_sw1, new_sw2) = split_status(&raw)?;
        response.extend_from_slice(body);
        sw1 = new_sw1;
        sw2 = new_sw2;
    }

    let status = (sw1 as u16) << 8 | sw2 as u16;
    debug!("<- SW={status:04x} ({} bytes)", response.len());
    Ok((response, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct StubTransport {
        replies: VecDeque<Vec<u8>>,
    }

    impl Transport for StubTransport {
        fn transmit_raw(&mut self, _apdu: &[u8]) -> Result<Vec<u8>, KernelError> {
            self.replies
                .pop_front()
                .ok_or_else(|| KernelError::CardTransport("stub exhausted".to_string()))
        }
    }

    #[test]
    fn chains_61xx_continuation_data() {
        let mut transport = StubTransport {
            replies: VecDeque::from([vec![0x61, 0x10], {
                let mut v = vec![0xAB; 16];
                v.extend_from_slice(&[0x90, 0x00]);
                v
            }]),
        };
        let apdu = Apdu::select(b"1PAY.SYS.DDF01", true);
        let (body, status) = send(&mut transport, &apdu).unwrap();
        assert_eq!(body, vec![0xAB; 16]);
        assert_eq!(status, 0x9000);
    }

    #[test]
    fn reissues_on_6cxx_wrong_length() {
        let mut transport = StubTransport {
            replies: VecDeque::from([vec![0x6c, 0x20], {
                let mut v = vec![0xCD; 0x20];
                v.extend_from_slice(&[0x90, 0x00]);
                v
            }]),
        };
        let apdu = Apdu::select(b"1PAY.SYS.DDF01", true);
        let (body, status) = send(&mut transport, &apdu).unwrap();
        assert_eq!(body.len(), 0x20);
        assert_eq!(status, 0x9000);
    }

    #[test]
    fn passes_through_immediate_success() {
        let mut transport = StubTransport {
            replies: VecDeque::from([vec![0x6f, 0x02, 0x90, 0x00]]),
        };
        let apdu = Apdu::select(b"1PAY.SYS.DDF01", true);
        let (body, status) = send(&mut transport, &apdu).unwrap();
        assert_eq!(body, vec![0x6f, 0x02]);
        assert_eq!(status, 0x9000);
    }
}
