//! Async wrappers that keep password hashing off the request workers.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::domain::{CredentialVerifier, Password};
use crate::errors::{AppError, AppResult};

/// Plain text behind the stand-in hash used when an email is unknown.
const DUMMY_PASSWORD: &str = "unknown-account-placeholder";

pub(crate) async fn hash_password(
    verifier: &Arc<dyn CredentialVerifier>,
    plain_text: &str,
) -> AppResult<Password> {
    let verifier = verifier.clone();
    let plain_text = plain_text.to_owned();
    tokio::task::spawn_blocking(move || verifier.hash(&plain_text))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
}

pub(crate) async fn verify_password(
    verifier: &Arc<dyn CredentialVerifier>,
    plain_text: &str,
    hash: Password,
) -> AppResult<bool> {
    let verifier = verifier.clone();
    let plain_text = plain_text.to_owned();
    tokio::task::spawn_blocking(move || verifier.verify(&plain_text, &hash))
        .await
        .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))
}

/// Burns one verification against a real hash of the configured cost so an
/// unknown email takes as long as a wrong password.
pub(crate) async fn verify_against_dummy(
    verifier: &Arc<dyn CredentialVerifier>,
    dummy: &Arc<OnceCell<Password>>,
    plain_text: &str,
) -> AppResult<()> {
    let verifier = verifier.clone();
    let dummy = dummy.clone();
    let plain_text = plain_text.to_owned();
    tokio::task::spawn_blocking(move || -> AppResult<()> {
        let hash = dummy.get_or_try_init(|| verifier.hash(DUMMY_PASSWORD))?;
        verifier.verify(&plain_text, hash);
        Ok(())
    })
    .await
    .map_err(|e| AppError::internal(format!("Password verification task failed: {}", e)))?
}
