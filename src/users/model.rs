//! Column constraints and the pre-persist transformation for users.
//!
//! Every write goes through [`prepare_create`] or [`prepare_update`], which
//! check the column constraints and swap the plaintext password for its
//! argon2 hash. Nothing below the handlers ever sees a plaintext password.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::error;

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    password,
    repo_types::{NewUser, User, UserPatch},
};

pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("Validation error: {0}")]
    Invalid(String),
    #[error(transparent)]
    Hash(#[from] anyhow::Error),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_username(username: &str) -> Result<(), PrepareError> {
    if username.trim().is_empty() {
        return Err(PrepareError::Invalid("username cannot be empty".into()));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), PrepareError> {
    if !is_valid_email(email) {
        return Err(PrepareError::Invalid(format!("{email:?} is not a valid email")));
    }
    Ok(())
}

fn check_password(plain: &str) -> Result<(), PrepareError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(PrepareError::Invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn prepare_create(req: CreateUserRequest) -> Result<NewUser, PrepareError> {
    check_username(&req.username)?;
    check_email(&req.email)?;
    check_password(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;
    Ok(NewUser {
        username: req.username,
        email: req.email,
        password_hash,
    })
}

pub fn prepare_update(req: UpdateUserRequest) -> Result<UserPatch, PrepareError> {
    if let Some(username) = &req.username {
        check_username(username)?;
    }
    if let Some(email) = &req.email {
        check_email(email)?;
    }
    let password_hash = match req.password {
        Some(plain) => {
            check_password(&plain)?;
            Some(password::hash_password(&plain)?)
        }
        None => None,
    };
    Ok(UserPatch {
        username: req.username,
        email: req.email,
        password_hash,
    })
}

impl User {
    pub fn verify_password(&self, candidate: &str) -> bool {
        match password::verify_password(candidate, &self.password) {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, user_id = self.id, "stored password hash is unreadable");
                false
            }
        }
    }
}
