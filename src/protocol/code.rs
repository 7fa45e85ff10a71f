//! Room code generation
//!
//! Codes are 8-digit numeric strings, short enough to read over the phone.
//! Uniqueness is enforced against *active* rooms only; once a room closes its
//! code goes back into the pool. The retry loop lives in
//! [`crate::api::RoomService`], next to the store that can answer the
//! collision check.

use rand::Rng;

/// Length of a room code in digits
pub const CODE_LEN: usize = 8;

/// Generate one candidate room code
///
/// Always exactly [`CODE_LEN`] digits; the first digit is never zero.
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(10_000_000u32..100_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_eight_digits() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }
}
