//! Account lifecycle tests: registration, approval, activation and auditing.

mod common;

use common::{failing_audit_setup, origin, Harness, STRONG_PASSWORD};
use gradebook::domain::{ApprovalStatus, UserRole};
use gradebook::errors::AppError;
use gradebook::services::{AccountInput, ServiceContainer};

fn input(email: &str, role: UserRole) -> AccountInput {
    AccountInput {
        email: email.to_string(),
        password: STRONG_PASSWORD.to_string(),
        name: "Grace Hopper".to_string(),
        role,
    }
}

#[tokio::test]
async fn test_register_student_is_pending_with_student_id() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");

    let user = h
        .services
        .accounts()
        .register(input("Grace@Example.edu", UserRole::Student), &origin())
        .await
        .unwrap();

    assert_eq!(user.email, "grace@example.edu");
    assert_eq!(user.approval_status, ApprovalStatus::Pending);
    assert!(user.is_active);
    let student_id = user.student_id.as_deref().unwrap();
    assert!(student_id.starts_with("STU"));
    assert_eq!(student_id.len(), 11);

    let notifications = h.uow.notifications.all();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, admin.id);

    assert_eq!(h.audit_actions().await, vec!["USER_REGISTERED"]);
}

#[tokio::test]
async fn test_register_lecturer_has_no_student_id() {
    let h = Harness::new();

    let user = h
        .services
        .accounts()
        .register(input("lecturer@example.edu", UserRole::Lecturer), &origin())
        .await
        .unwrap();

    assert_eq!(user.role, UserRole::Lecturer);
    assert!(user.student_id.is_none());
}

#[tokio::test]
async fn test_register_admin_always_rejected() {
    let h = Harness::new();

    let err = h
        .services
        .accounts()
        .register(input("sneaky@example.edu", UserRole::Admin), &origin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.uow.users.len(), 0);
}

#[tokio::test]
async fn test_register_weak_password_lists_rules() {
    let h = Harness::new();
    let mut weak = input("weak@example.edu", UserRole::Student);
    weak.password = "short".to_string();

    let err = h
        .services
        .accounts()
        .register(weak, &origin())
        .await
        .unwrap_err();

    match err {
        AppError::WeakPassword(rules) => assert!(rules.len() >= 3),
        other => panic!("expected WeakPassword, got {:?}", other),
    }
    assert_eq!(h.uow.users.len(), 0);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let h = Harness::new();
    h.seed_user("taken@example.edu", UserRole::Student, ApprovalStatus::Approved);

    let err = h
        .services
        .accounts()
        .register(input("TAKEN@example.edu", UserRole::Lecturer), &origin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DuplicateEmail));
}

#[tokio::test]
async fn test_admin_created_account_is_approved() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");

    let user = h
        .services
        .accounts()
        .create_user(admin.id, input("second-admin@example.edu", UserRole::Admin), &origin())
        .await
        .unwrap();

    assert_eq!(user.role, UserRole::Admin);
    assert_eq!(user.approval_status, ApprovalStatus::Approved);
    assert_eq!(user.approved_by, Some(admin.id));

    let events = h.audit_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "USER_CREATED");
    assert_eq!(events[0].user_id, Some(admin.id));
}

#[tokio::test]
async fn test_approve_records_admin_and_snapshots() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");
    let pending = h.seed_user("new@example.edu", UserRole::Lecturer, ApprovalStatus::Pending);

    let approved = h
        .services
        .accounts()
        .approve(pending.id, admin.id, &origin())
        .await
        .unwrap();

    assert_eq!(approved.approval_status, ApprovalStatus::Approved);
    assert_eq!(approved.approved_by, Some(admin.id));
    assert!(approved.approved_at.is_some());

    let events = h.audit_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "USER_APPROVED");
    assert_eq!(events[0].record_id, Some(pending.id));
    assert_eq!(
        events[0].old_values.as_ref().unwrap()["approval_status"],
        "pending"
    );
    assert_eq!(
        events[0].new_values.as_ref().unwrap()["approval_status"],
        "approved"
    );
}

#[tokio::test]
async fn test_reject_stores_reason() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");
    let pending = h.seed_user("new@example.edu", UserRole::Student, ApprovalStatus::Pending);

    let rejected = h
        .services
        .accounts()
        .reject(
            pending.id,
            "  Not a member of this faculty  ".to_string(),
            admin.id,
            &origin(),
        )
        .await
        .unwrap();

    assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("Not a member of this faculty")
    );
    assert_eq!(h.audit_actions().await, vec!["USER_REJECTED"]);
}

#[tokio::test]
async fn test_reject_without_reason_writes_nothing() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");
    let pending = h.seed_user("new@example.edu", UserRole::Student, ApprovalStatus::Pending);

    let err = h
        .services
        .accounts()
        .reject(pending.id, "   ".to_string(), admin.id, &origin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    let stored = h.uow.users.get(pending.id).unwrap();
    assert_eq!(stored.approval_status, ApprovalStatus::Pending);
    assert!(h.audit_actions().await.is_empty());
}

#[tokio::test]
async fn test_reapproval_overwrites_rejection() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");
    let user = h.seed_user("new@example.edu", UserRole::Student, ApprovalStatus::Pending);
    let accounts = h.services.accounts();

    accounts
        .reject(user.id, "Missing enrolment papers".to_string(), admin.id, &origin())
        .await
        .unwrap();
    let approved = accounts.approve(user.id, admin.id, &origin()).await.unwrap();

    assert_eq!(approved.approval_status, ApprovalStatus::Approved);
    assert!(approved.rejection_reason.is_none());
}

#[tokio::test]
async fn test_last_admin_cannot_be_deactivated() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");

    let err = h
        .services
        .accounts()
        .toggle_active(admin.id, admin.id, &origin())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::LastAdminProtected));
    assert!(h.uow.users.get(admin.id).unwrap().is_active);
    assert!(h.audit_actions().await.is_empty());
}

#[tokio::test]
async fn test_second_admin_can_be_deactivated_and_reactivated() {
    let h = Harness::new();
    let first = h.seed_admin("first@example.edu");
    let second = h.seed_admin("second@example.edu");
    let accounts = h.services.accounts();

    let off = accounts
        .toggle_active(second.id, first.id, &origin())
        .await
        .unwrap();
    assert!(!off.is_active);

    // Now `first` is the only active admin
    let err = accounts
        .toggle_active(first.id, first.id, &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LastAdminProtected));

    let on = accounts
        .toggle_active(second.id, first.id, &origin())
        .await
        .unwrap();
    assert!(on.is_active);

    assert_eq!(
        h.audit_actions().await,
        vec!["USER_DEACTIVATED", "USER_ACTIVATED"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_admin_deactivations_keep_one_admin() {
    let h = Harness::new();
    let first = h.seed_admin("first@example.edu");
    let second = h.seed_admin("second@example.edu");
    let accounts = h.services.accounts();

    let from = origin();
    let (a, b) = tokio::join!(
        accounts.toggle_active(first.id, second.id, &from),
        accounts.toggle_active(second.id, first.id, &from),
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AppError::LastAdminProtected))));

    let still_active = [first.id, second.id]
        .iter()
        .filter(|id| h.uow.users.get(**id).unwrap().is_active)
        .count();
    assert_eq!(still_active, 1);
    assert_eq!(h.audit_actions().await, vec!["USER_DEACTIVATED"]);
}

#[tokio::test]
async fn test_deactivated_lecturer_cannot_log_in() {
    let h = Harness::new();
    let admin = h.seed_admin("admin@example.edu");
    let lecturer = h.seed_user("lecturer@example.edu", UserRole::Lecturer, ApprovalStatus::Approved);

    h.services
        .accounts()
        .toggle_active(lecturer.id, admin.id, &origin())
        .await
        .unwrap();

    let err = h
        .services
        .auth()
        .authenticate("lecturer@example.edu", STRONG_PASSWORD, &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountDeactivated));
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let h = Harness::new();
    let user = h.seed_user("student@example.edu", UserRole::Student, ApprovalStatus::Approved);
    let accounts = h.services.accounts();

    let err = accounts
        .change_password(user.id, "Wr0ng!password", "N3w!password", &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    accounts
        .change_password(user.id, STRONG_PASSWORD, "N3w!password", &origin())
        .await
        .unwrap();

    let principal = h
        .services
        .auth()
        .authenticate("student@example.edu", "N3w!password", &origin())
        .await
        .unwrap();
    assert_eq!(principal.user_id, user.id);

    let events = h.audit_events().await;
    let changed = events
        .iter()
        .find(|e| e.action == "PASSWORD_CHANGED")
        .unwrap();
    assert!(changed.old_values.is_none() && changed.new_values.is_none());
}

#[tokio::test]
async fn test_wrong_current_password_is_audited_and_counted() {
    let h = Harness::new();
    let user = h.seed_user("lecturer@example.edu", UserRole::Lecturer, ApprovalStatus::Approved);
    let accounts = h.services.accounts();

    for _ in 0..5 {
        let err = accounts
            .change_password(user.id, "Wr0ng!password", "N3w!password", &origin())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    let stored = h.uow.users.get(user.id).unwrap();
    assert_eq!(stored.login_attempts, 5);
    assert!(stored.locked_until.is_some());

    // Locked: even the right password is refused without being checked
    let verified_before = h.verifier.verifications();
    let err = accounts
        .change_password(user.id, STRONG_PASSWORD, "N3w!password", &origin())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountLocked { .. }));
    assert_eq!(h.verifier.verifications(), verified_before);

    let events = h.audit_events().await;
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|e| e.action == "PASSWORD_CHANGE_FAILED"));
    assert_eq!(events[4].new_values.as_ref().unwrap()["locked"], true);
}

#[tokio::test]
async fn test_taken_email_wins_over_weak_password() {
    let h = Harness::new();
    h.seed_user("taken@example.edu", UserRole::Student, ApprovalStatus::Approved);
    let mut weak = input("Taken@Example.edu", UserRole::Lecturer);
    weak.password = "short".to_string();

    let err = h.services.accounts().register(weak, &origin()).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateEmail));
}

#[tokio::test]
async fn test_update_profile_trims_name() {
    let h = Harness::new();
    let user = h.seed_user("student@example.edu", UserRole::Student, ApprovalStatus::Approved);

    let updated = h
        .services
        .accounts()
        .update_profile(user.id, "  Ada King  ".to_string(), &origin())
        .await
        .unwrap();

    assert_eq!(updated.name, "Ada King");
    assert_eq!(h.audit_actions().await, vec!["PROFILE_UPDATED"]);
}

#[tokio::test]
async fn test_list_pending_only_returns_pending() {
    let h = Harness::new();
    h.seed_admin("admin@example.edu");
    let pending = h.seed_user("new@example.edu", UserRole::Student, ApprovalStatus::Pending);
    h.seed_user("old@example.edu", UserRole::Student, ApprovalStatus::Approved);

    let listed = h.services.accounts().list_pending().await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, pending.id);
}

#[tokio::test]
async fn test_audit_failure_never_escapes_operations() {
    let (uow, failing, services) = failing_audit_setup();
    let accounts = services.accounts();

    let admin = accounts
        .create_user(
            uuid::Uuid::new_v4(),
            input("admin@example.edu", UserRole::Admin),
            &origin(),
        )
        .await
        .unwrap();
    let user = accounts
        .register(input("student@example.edu", UserRole::Student), &origin())
        .await
        .unwrap();

    accounts.approve(user.id, admin.id, &origin()).await.unwrap();
    accounts
        .reject(user.id, "Wrong programme selected".to_string(), admin.id, &origin())
        .await
        .unwrap();
    accounts.toggle_active(user.id, admin.id, &origin()).await.unwrap();
    accounts
        .change_password(admin.id, STRONG_PASSWORD, "An0ther!secret", &origin())
        .await
        .unwrap();
    services
        .auth()
        .authenticate("admin@example.edu", "An0ther!secret", &origin())
        .await
        .unwrap();

    services.audit().flush().await;
    assert_eq!(failing.attempts(), 7);
    assert!(!uow.users.get(user.id).unwrap().is_active);
}
