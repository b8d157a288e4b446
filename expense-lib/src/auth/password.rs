use argon2::Config;

pub fn encode_password(password: &str) -> Result<String, argon2::Error> {
    let config = Config::default();
    let salt: [u8; 32] = rand::random();
    let password_hash = argon2::hash_encoded(password.as_bytes(), &salt, &config)?;
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, argon2::Error> {
    argon2::verify_encoded(password_hash, password.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::{encode_password, verify_password};

    #[test]
    fn hashes_are_salted() {
        let first = encode_password("hunter2").unwrap();
        let second = encode_password("hunter2").unwrap();
        assert_ne!(first, second);

        assert!(verify_password("hunter2", &first).unwrap());
        assert!(verify_password("hunter2", &second).unwrap());
        assert!(!verify_password("hunter3", &first).unwrap());
    }
}
