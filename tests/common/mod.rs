//! Shared test harness: in-memory stores behind the repository traits.
//!
//! The stores follow the database semantics the services rely on: unique
//! emails, field-scoped patches, and atomic counter increments.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gradebook::config::{HashSettings, LockoutSettings};
use gradebook::domain::{
    generate_student_id, ApprovalStatus, Argon2Credentials, AuditEvent, CourseRef, CredentialVerifier, EnrollmentRef,
    EnrollmentStatus, NewAuditEvent, NewNotification, NewUser, Password, RequestOrigin, User,
    UserPatch, UserRole,
};
use gradebook::errors::{AppError, AppResult};
use gradebook::infra::{
    AuditRepository, NotificationRepository, ResourceRepository, UnitOfWork, UserRepository,
};
use gradebook::services::{ServiceContainer, Services};

pub const STRONG_PASSWORD: &str = "Corr3ct!horse";

// =============================================================================
// In-memory stores
// =============================================================================

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn get(&self, id: Uuid) -> Option<User> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Overwrite a row directly, bypassing the service layer.
    pub fn put(&self, user: User) {
        self.rows.lock().unwrap().insert(user.id, user);
    }
}

fn apply_patch(user: &mut User, patch: UserPatch) {
    if let Some(name) = patch.name {
        user.name = name;
    }
    if let Some(hash) = patch.password_hash {
        user.password_hash = hash;
    }
    if let Some(status) = patch.approval_status {
        user.approval_status = status;
    }
    if let Some(approved_by) = patch.approved_by {
        user.approved_by = approved_by;
    }
    if let Some(approved_at) = patch.approved_at {
        user.approved_at = approved_at;
    }
    if let Some(reason) = patch.rejection_reason {
        user.rejection_reason = reason;
    }
    if let Some(is_active) = patch.is_active {
        user.is_active = is_active;
    }
    if let Some(attempts) = patch.login_attempts {
        user.login_attempts = attempts;
    }
    if let Some(locked_until) = patch.locked_until {
        user.locked_until = locked_until;
    }
    if let Some(last_login) = patch.last_login {
        user.last_login = last_login;
    }
    user.updated_at = Utc::now();
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_student_id(&self, student_id: &str) -> AppResult<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|u| u.student_id.as_deref() == Some(student_id))
            .cloned())
    }

    async fn insert(&self, new_user: NewUser) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|u| u.email == new_user.email) {
            return Err(AppError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            role: new_user.role,
            student_id: new_user.student_id,
            approval_status: new_user.approval_status,
            approved_by: new_user.approved_by,
            approved_at: new_user.approved_at,
            rejection_reason: None,
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_partial(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(AppError::NotFound)?;
        apply_patch(user, patch);
        Ok(user.clone())
    }

    async fn increment_login_attempts(&self, id: Uuid) -> AppResult<i32> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(AppError::NotFound)?;
        user.login_attempts += 1;
        Ok(user.login_attempts)
    }

    async fn restart_login_window(
        &self,
        id: Uuid,
        expired_lock: DateTime<Utc>,
    ) -> AppResult<Option<i32>> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(AppError::NotFound)?;
        if user.locked_until != Some(expired_lock) {
            return Ok(None);
        }
        apply_patch(
            user,
            UserPatch {
                login_attempts: Some(1),
                locked_until: Some(None),
                ..Default::default()
            },
        );
        Ok(Some(user.login_attempts))
    }

    async fn deactivate_unless_last_admin(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut rows = self.rows.lock().unwrap();
        let active_admins = rows
            .values()
            .filter(|u| u.role == UserRole::Admin && u.is_active)
            .count();

        let user = rows.get_mut(&id).ok_or(AppError::NotFound)?;
        if user.role == UserRole::Admin && user.is_active && active_admins <= 1 {
            return Ok(None);
        }
        apply_patch(
            user,
            UserPatch {
                is_active: Some(false),
                ..Default::default()
            },
        );
        Ok(Some(user.clone()))
    }

    async fn list_by_role(&self, role: UserRole) -> AppResult<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().filter(|u| u.role == role).cloned().collect())
    }

    async fn list_pending(&self) -> AppResult<Vec<User>> {
        let rows = self.rows.lock().unwrap();
        let mut pending: Vec<User> = rows
            .values()
            .filter(|u| u.approval_status == ApprovalStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|u| u.created_at);
        Ok(pending)
    }

    async fn count_active_by_role(&self, role: UserRole) -> AppResult<u64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|u| u.role == role && u.is_active)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryResources {
    courses: Mutex<Vec<CourseRef>>,
    enrollments: Mutex<Vec<EnrollmentRef>>,
}

impl InMemoryResources {
    pub fn add_course(&self, code: &str, lecturer_id: Option<Uuid>) -> CourseRef {
        let course = CourseRef {
            id: Uuid::new_v4(),
            code: code.to_string(),
            title: format!("{} title", code),
            lecturer_id,
        };
        self.courses.lock().unwrap().push(course.clone());
        course
    }

    pub fn enroll(&self, course_id: Uuid, student_id: Uuid, status: EnrollmentStatus) {
        self.enrollments.lock().unwrap().push(EnrollmentRef {
            id: Uuid::new_v4(),
            course_id,
            student_id,
            status,
        });
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResources {
    async fn find_course_by_id(&self, id: Uuid) -> AppResult<Option<CourseRef>> {
        let courses = self.courses.lock().unwrap();
        Ok(courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list_active_enrollments_for_student(
        &self,
        student_id: Uuid,
    ) -> AppResult<Vec<EnrollmentRef>> {
        let enrollments = self.enrollments.lock().unwrap();
        Ok(enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.status == EnrollmentStatus::Active)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAudit {
    /// Persisted events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.action).collect()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAudit {
    async fn append(&self, event: NewAuditEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(AuditEvent {
            id: Uuid::new_v4(),
            user_id: event.user_id,
            action: event.action.label().to_string(),
            table_name: event.table_name,
            record_id: event.record_id,
            old_values: event.old_values,
            new_values: event.new_values,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            created_at: event.created_at,
        });
        Ok(())
    }

    async fn list_recent(&self, limit: u64) -> AppResult<Vec<AuditEvent>> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }
}

/// Audit store whose writes always fail.
#[derive(Default)]
pub struct FailingAudit {
    attempts: AtomicUsize,
}

impl FailingAudit {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditRepository for FailingAudit {
    async fn append(&self, _event: NewAuditEvent) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::internal("audit store unavailable"))
    }

    async fn list_recent(&self, _limit: u64) -> AppResult<Vec<AuditEvent>> {
        Err(AppError::internal("audit store unavailable"))
    }
}

#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<NewNotification>>,
}

impl InMemoryNotifications {
    pub fn all(&self) -> Vec<NewNotification> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn insert_many(&self, notifications: Vec<NewNotification>) -> AppResult<()> {
        self.rows.lock().unwrap().extend(notifications);
        Ok(())
    }
}

// =============================================================================
// Unit of Work and verifier
// =============================================================================

pub struct TestUnitOfWork {
    pub users: Arc<InMemoryUsers>,
    pub resources: Arc<InMemoryResources>,
    pub audit: Arc<dyn AuditRepository>,
    pub notifications: Arc<InMemoryNotifications>,
}

impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn resources(&self) -> Arc<dyn ResourceRepository> {
        self.resources.clone()
    }

    fn audit_logs(&self) -> Arc<dyn AuditRepository> {
        self.audit.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notifications.clone()
    }
}

/// Cheap argon2 that counts verifications.
pub struct CountingVerifier {
    inner: Argon2Credentials,
    verifications: AtomicUsize,
}

impl CountingVerifier {
    pub fn new() -> Self {
        Self {
            inner: Argon2Credentials::new(HashSettings {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap(),
            verifications: AtomicUsize::new(0),
        }
    }

    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}

impl CredentialVerifier for CountingVerifier {
    fn hash(&self, plain_text: &str) -> AppResult<Password> {
        self.inner.hash(plain_text)
    }

    fn verify(&self, plain_text: &str, hash: &Password) -> bool {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(plain_text, hash)
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub uow: Arc<TestUnitOfWork>,
    pub audit_store: Arc<InMemoryAudit>,
    pub verifier: Arc<CountingVerifier>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_lockout(LockoutSettings::default())
    }

    pub fn with_lockout(lockout: LockoutSettings) -> Self {
        let audit_store = Arc::new(InMemoryAudit::default());
        let uow = Arc::new(TestUnitOfWork {
            users: Arc::new(InMemoryUsers::default()),
            resources: Arc::new(InMemoryResources::default()),
            audit: audit_store.clone(),
            notifications: Arc::new(InMemoryNotifications::default()),
        });
        let verifier = Arc::new(CountingVerifier::new());
        let services = Services::new(uow.clone(), verifier.clone(), &lockout);

        Self {
            uow,
            audit_store,
            verifier,
            services,
        }
    }

    /// Insert a user with `STRONG_PASSWORD` directly into the store.
    pub fn seed_user(&self, email: &str, role: UserRole, status: ApprovalStatus) -> User {
        let now = Utc::now();
        let password_hash = self.verifier.hash(STRONG_PASSWORD).unwrap().into_string();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            name: email.split('@').next().unwrap_or(email).to_string(),
            role,
            student_id: (role == UserRole::Student).then(|| generate_student_id(now)),
            approval_status: status,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.uow.users.put(user.clone());
        user
    }

    pub fn seed_admin(&self, email: &str) -> User {
        self.seed_user(email, UserRole::Admin, ApprovalStatus::Approved)
    }

    /// Wait for queued audit events, then return their labels in order.
    pub async fn audit_actions(&self) -> Vec<String> {
        self.services.audit().flush().await;
        self.audit_store.actions()
    }

    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.services.audit().flush().await;
        self.audit_store.events()
    }
}

pub fn origin() -> RequestOrigin {
    RequestOrigin::new(Some("198.51.100.20".to_string()), Some("test-agent".to_string()))
}

/// Services wired over an audit store that rejects every write.
pub fn failing_audit_setup() -> (Arc<TestUnitOfWork>, Arc<FailingAudit>, Services) {
    let failing = Arc::new(FailingAudit::default());
    let uow = Arc::new(TestUnitOfWork {
        users: Arc::new(InMemoryUsers::default()),
        resources: Arc::new(InMemoryResources::default()),
        audit: failing.clone(),
        notifications: Arc::new(InMemoryNotifications::default()),
    });
    let services = Services::new(
        uow.clone(),
        Arc::new(CountingVerifier::new()),
        &LockoutSettings::default(),
    );
    (uow, failing, services)
}
