//! Create-admin command - Bootstraps the first administrator.
//!
//! Registration never yields an admin, so a fresh database needs one created
//! out of band. The account is approved and active immediately.

use chrono::Utc;
use serde_json::json;

use crate::cli::args::CreateAdminArgs;
use crate::config::Config;
use crate::domain::{
    normalize_email, ApprovalStatus, Argon2Credentials, AuditAction, CredentialVerifier,
    NewAuditEvent, NewUser, PasswordStrength, UserRole,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{AuditRepository, AuditStore, Database, UserRepository, UserStore};

/// Execute the create-admin command
pub async fn execute(args: CreateAdminArgs, config: Config) -> AppResult<()> {
    let name = args.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    PasswordStrength::check(&args.password).into_result()?;

    let db = Database::connect(&config).await?;
    let users = UserStore::new(db.get_connection());
    let audit = AuditStore::new(db.get_connection());

    let email = normalize_email(&args.email);
    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let verifier = Argon2Credentials::new(config.hashing)?;
    let password_hash = verifier.hash(&args.password)?.into_string();

    let admin = users
        .insert(NewUser {
            email,
            password_hash,
            name,
            role: UserRole::Admin,
            student_id: None,
            approval_status: ApprovalStatus::Approved,
            approved_by: None,
            approved_at: Some(Utc::now()),
        })
        .await?;

    // Written synchronously; there is no recorder worker in a one-shot command
    audit
        .append(
            NewAuditEvent::new(None, AuditAction::UserCreated)
                .on_record("users", admin.id)
                .after(json!({
                    "email": admin.email,
                    "role": admin.role.as_str(),
                    "source": "cli",
                })),
        )
        .await?;

    tracing::info!(user_id = %admin.id, "Administrator created");
    println!("Created administrator {} ({})", admin.email, admin.id);

    Ok(())
}
