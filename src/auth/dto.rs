use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::PublicUser;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64, // seconds
    pub user: PublicUser,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl RegisterRequest {
    /// Normalizes the email and username in place, returning a message for
    /// the first shape problem found.
    pub fn validate(&mut self) -> Result<(), &'static str> {
        self.email = normalize_email(&self.email);
        self.username = self.username.trim().to_string();

        if !is_valid_email(&self.email) {
            return Err("Invalid email");
        }
        if self.username.is_empty() {
            return Err("Username is required");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password too short");
        }
        Ok(())
    }
}

impl LoginRequest {
    pub fn validate(&mut self) -> Result<(), &'static str> {
        self.email = normalize_email(&self.email);
        if !is_valid_email(&self.email) {
            return Err("Invalid email");
        }
        if self.password.is_empty() {
            return Err("Password is required");
        }
        Ok(())
    }
}
