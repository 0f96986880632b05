//! Unpredictable Number generation (tag 9F37), sourced from the platform
//! CSPRNG rather than a deterministic sequence — an ambient addition the
//! distilled spec doesn't dictate a source for, but which real terminal
//! software always draws from the OS RNG.

use rand::RngCore;

pub fn unpredictable_number(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_requested_length() {
        assert_eq!(unpredictable_number(4).len(), 4);
        assert_eq!(unpredictable_number(0).len(), 0);
    }

    #[test]
    fn successive_draws_differ() {
        // Not a proof of randomness, just a smoke test that we're not
        // returning a fixed buffer.
        let a = unpredictable_number(16);
        let b = unpredictable_number(16);
        assert_ne!(a, b);
    }
}
