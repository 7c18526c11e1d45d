//! Short lowercase base36 strings for tokens and tracking numbers

use uuid::Uuid;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub(crate) fn base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// `len` random base36 characters taken from a v4 UUID
pub(crate) fn random_base36(len: usize) -> String {
    let digits = format!("{:0>25}", base36(Uuid::new_v4().as_u128()));
    digits[digits.len().saturating_sub(len)..].to_string()
}
