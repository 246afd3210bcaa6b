/// Suffix appended by the placeholder transform.
const PLACEHOLDER_SUFFIX: &str = "not-secure-hash";

/// Turns a plaintext password into the value stored in `hashed_password`.
///
/// NOT a real hash: it appends a fixed suffix to the plaintext. Swap the body
/// for argon2 or similar before storing real credentials.
pub fn hash_password(plain: &str) -> String {
    format!("{plain}{PLACEHOLDER_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_and_not_the_plaintext() {
        let hash = hash_password("string123");
        assert_eq!(hash, hash_password("string123"));
        assert_ne!(hash, "string123");
        assert_eq!(hash, "string123not-secure-hash");
    }
}
