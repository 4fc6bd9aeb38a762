use crate::constants;
use serde::Serialize;
use std::fmt;

/// Login credentials. Serializes to the body `POST /rest/login` expects.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// 비밀번호 해싱 (n8n과 같은 cost)
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, constants::owner::BCRYPT_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_body_shape() {
        let creds = Credentials::new("owner@example.com", "s3cret");
        let body = serde_json::to_value(&creds).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "email": "owner@example.com", "password": "s3cret" })
        );
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("owner@example.com", "s3cret");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("owner@example.com"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn hash_uses_n8n_cost_and_verifies() {
        let hash = hash_password("changeme").unwrap();
        assert!(hash.starts_with("$2b$10$"));
        assert!(bcrypt::verify("changeme", &hash).unwrap());
        assert!(!bcrypt::verify("wrong", &hash).unwrap());
    }
}
