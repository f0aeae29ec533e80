//! Identifier helpers: timestamps and short random suffixes.

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Milliseconds since the Unix epoch
pub fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `len` random lowercase base-36 characters
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `txn_{ms}_{9 chars}`
pub fn transaction_id() -> String {
    format!("txn_{}_{}", unix_millis(), random_base36(9))
}

/// `jwt_{ms}_{user id}`; the demo has no real token issuer
pub fn session_token(user_id: u32) -> String {
    format!("jwt_{}_{}", unix_millis(), user_id)
}

/// `ERR-{ms}-{5 uppercase chars}`, quoted to shoppers when a demo failure fires
pub fn error_id() -> String {
    format!("ERR-{}-{}", unix_millis(), random_base36(5).to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_id_formats() {
        assert!(Regex::new(r"^txn_\d{13}_[0-9a-z]{9}$").unwrap().is_match(&transaction_id()));
        assert!(Regex::new(r"^ERR-\d{13}-[0-9A-Z]{5}$").unwrap().is_match(&error_id()));
        assert!(session_token(2).ends_with("_2"));
        assert!(session_token(2).starts_with("jwt_"));
    }
}
