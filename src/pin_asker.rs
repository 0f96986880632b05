//! Cardholder PIN capture, supplied by the host. A trait so the binary's
//! stdin-reading implementation and a test double can share one call site.

pub trait PinAsker {
    /// Returns a decimal digit string of length 4 to 12.
    fn retrieve_pin(&mut self) -> anyhow::Result<String>;
}

/// Always returns the same PIN; used by orchestrator unit tests.
pub struct FixedPinAsker(pub String);

impl PinAsker for FixedPinAsker {
    fn retrieve_pin(&mut self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pin_asker_returns_configured_pin() {
        let mut asker = FixedPinAsker("1234".to_string());
        assert_eq!(asker.retrieve_pin().unwrap(), "1234");
    }
}
