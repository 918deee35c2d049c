use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use uuid::Uuid;

/// Mints the opaque id for a new directory user.
pub fn new_user_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_phc_strings() {
        let a = hash_password("secret-pass").unwrap();
        let b = hash_password("secret-pass").unwrap();
        assert!(a.starts_with("$argon2"));
        assert_ne!(a, b);
    }

    #[test]
    fn user_ids_are_opaque_and_unique() {
        assert_ne!(new_user_id(), new_user_id());
    }
}
