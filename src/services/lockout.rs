//! Lockout tracking - temporary login suppression after repeated failures.
//!
//! States per user: unlocked, locked (`now < locked_until`). Lockout is
//! independent of deactivation and of approval status.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::LockoutSettings;
use crate::domain::{User, UserPatch};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Threshold and duration of the lockout state machine.
///
/// Non-positive values disable locking entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: i32,
    lockout_minutes: i64,
}

impl LockoutPolicy {
    pub fn new(max_attempts: i32, lockout_minutes: i64) -> Self {
        Self {
            max_attempts,
            lockout_minutes,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0 && self.lockout_minutes > 0
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    /// Lock duration, or `None` when locking is disabled.
    pub fn lock_duration(&self) -> Option<Duration> {
        self.is_enabled()
            .then(|| Duration::minutes(self.lockout_minutes))
    }
}

impl From<&LockoutSettings> for LockoutPolicy {
    fn from(settings: &LockoutSettings) -> Self {
        Self::new(settings.max_attempts, settings.lockout_minutes)
    }
}

/// Result of recording one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    pub attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl FailureOutcome {
    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some()
    }
}

/// Whole minutes left on a lock, rounded up, never below one.
pub fn remaining_minutes(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (locked_until - now).num_seconds().max(0);
    ((seconds + 59) / 60).max(1)
}

/// Drives the lockout state machine against the user store.
///
/// Every write is field-scoped, and the counter itself is incremented by a
/// single UPDATE so that concurrent failures are all counted.
#[derive(Debug, Clone, Copy)]
pub struct LockoutTracker {
    policy: LockoutPolicy,
}

impl LockoutTracker {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Reject attempts against a currently locked account.
    ///
    /// Must run before any password verification.
    pub fn ensure_unlocked(&self, user: &User, now: DateTime<Utc>) -> AppResult<()> {
        match user.locked_until {
            Some(until) if user.is_locked_at(now) => Err(AppError::AccountLocked {
                minutes_remaining: remaining_minutes(until, now),
            }),
            _ => Ok(()),
        }
    }

    /// Failure path: count the attempt and lock once the threshold is reached.
    pub async fn record_failure(
        &self,
        users: &dyn UserRepository,
        user: &User,
        now: DateTime<Utc>,
    ) -> AppResult<FailureOutcome> {
        // An expired lock still on the record: this failure opens a new window.
        // Only one concurrent failure wins the restart; the rest count on top of it.
        let restarted = match user.locked_until {
            Some(expired) => users.restart_login_window(user.id, expired).await?,
            None => None,
        };
        let attempts = match restarted {
            Some(attempts) => attempts,
            None => users.increment_login_attempts(user.id).await?,
        };

        let locked_until = match self.policy.lock_duration() {
            Some(duration) if attempts >= self.policy.max_attempts() => {
                let until = now + duration;
                let patch = UserPatch {
                    locked_until: Some(Some(until)),
                    ..Default::default()
                };
                users.update_partial(user.id, patch).await?;
                tracing::warn!(user_id = %user.id, attempts, %until, "Account locked after failed logins");
                Some(until)
            }
            _ => None,
        };

        Ok(FailureOutcome {
            attempts,
            locked_until,
        })
    }

    /// Success path: reset the counter, clear any lock, stamp the login time.
    pub async fn record_success(
        &self,
        users: &dyn UserRepository,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<User> {
        let patch = UserPatch {
            login_attempts: Some(0),
            locked_until: Some(None),
            last_login: Some(Some(now)),
            ..Default::default()
        };
        users.update_partial(user_id, patch).await
    }
}

impl Default for LockoutTracker {
    fn default() -> Self {
        Self::new(LockoutPolicy::from(&LockoutSettings::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApprovalStatus, UserRole};
    use crate::infra::MockUserRepository;
    use mockall::predicate::eq;

    fn user(attempts: i32, locked_until: Option<DateTime<Utc>>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "lecturer@example.edu".to_string(),
            password_hash: "hash".to_string(),
            name: "Lecturer".to_string(),
            role: UserRole::Lecturer,
            student_id: None,
            approval_status: ApprovalStatus::Approved,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            is_active: true,
            login_attempts: attempts,
            locked_until,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_policy_disabled_for_non_positive_values() {
        assert!(!LockoutPolicy::new(0, 15).is_enabled());
        assert!(!LockoutPolicy::new(5, 0).is_enabled());
        assert!(!LockoutPolicy::new(5, -10).is_enabled());
        assert!(LockoutPolicy::new(5, 15).lock_duration().is_some());
    }

    #[test]
    fn test_remaining_minutes_rounds_up() {
        let now = Utc::now();
        assert_eq!(remaining_minutes(now + Duration::seconds(61), now), 2);
        assert_eq!(remaining_minutes(now + Duration::minutes(15), now), 15);
        assert_eq!(remaining_minutes(now + Duration::seconds(1), now), 1);
    }

    #[test]
    fn test_ensure_unlocked() {
        let tracker = LockoutTracker::default();
        let now = Utc::now();

        assert!(tracker.ensure_unlocked(&user(0, None), now).is_ok());
        assert!(tracker
            .ensure_unlocked(&user(5, Some(now - Duration::minutes(1))), now)
            .is_ok());

        let err = tracker
            .ensure_unlocked(&user(5, Some(now + Duration::minutes(10))), now)
            .unwrap_err();
        assert!(matches!(err, AppError::AccountLocked { minutes_remaining: 10 }));
    }

    #[tokio::test]
    async fn test_failure_below_threshold_only_increments() {
        let target = user(1, None);
        let mut repo = MockUserRepository::new();
        repo.expect_increment_login_attempts()
            .with(eq(target.id))
            .times(1)
            .returning(|_| Ok(2));
        repo.expect_update_partial().times(0);

        let tracker = LockoutTracker::new(LockoutPolicy::new(5, 15));
        let outcome = tracker.record_failure(&repo, &target, Utc::now()).await.unwrap();

        assert_eq!(outcome.attempts, 2);
        assert!(!outcome.is_locked());
    }

    #[tokio::test]
    async fn test_failure_at_threshold_locks() {
        let target = user(4, None);
        let now = Utc::now();
        let mut repo = MockUserRepository::new();
        repo.expect_increment_login_attempts().returning(|_| Ok(5));
        let locked = user(5, Some(now + Duration::minutes(15)));
        repo.expect_update_partial()
            .withf(move |_, patch| patch.locked_until == Some(Some(now + Duration::minutes(15))))
            .times(1)
            .returning(move |_, _| Ok(locked.clone()));

        let tracker = LockoutTracker::new(LockoutPolicy::new(5, 15));
        let outcome = tracker.record_failure(&repo, &target, now).await.unwrap();

        assert_eq!(outcome.locked_until, Some(now + Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_disabled_policy_never_locks() {
        let target = user(50, None);
        let mut repo = MockUserRepository::new();
        repo.expect_increment_login_attempts().returning(|_| Ok(51));
        repo.expect_update_partial().times(0);

        let tracker = LockoutTracker::new(LockoutPolicy::new(0, 15));
        let outcome = tracker.record_failure(&repo, &target, Utc::now()).await.unwrap();

        assert!(!outcome.is_locked());
    }

    #[tokio::test]
    async fn test_failure_after_expired_lock_restarts_window() {
        let now = Utc::now();
        let expired = now - Duration::minutes(1);
        let target = user(5, Some(expired));
        let mut repo = MockUserRepository::new();
        repo.expect_restart_login_window()
            .with(eq(target.id), eq(expired))
            .times(1)
            .returning(|_, _| Ok(Some(1)));
        repo.expect_increment_login_attempts().times(0);
        repo.expect_update_partial().times(0);

        let tracker = LockoutTracker::new(LockoutPolicy::new(5, 15));
        let outcome = tracker.record_failure(&repo, &target, now).await.unwrap();

        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.is_locked());
    }

    #[tokio::test]
    async fn test_lost_window_restart_counts_on_top() {
        let now = Utc::now();
        let target = user(5, Some(now - Duration::minutes(1)));
        let mut repo = MockUserRepository::new();
        repo.expect_restart_login_window()
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_increment_login_attempts()
            .with(eq(target.id))
            .times(1)
            .returning(|_| Ok(2));
        repo.expect_update_partial().times(0);

        let tracker = LockoutTracker::new(LockoutPolicy::new(5, 15));
        let outcome = tracker.record_failure(&repo, &target, now).await.unwrap();

        assert_eq!(outcome.attempts, 2);
        assert!(!outcome.is_locked());
    }

    #[tokio::test]
    async fn test_success_resets_counter_and_lock() {
        let now = Utc::now();
        let target = user(0, None);
        let returned = target.clone();
        let mut repo = MockUserRepository::new();
        repo.expect_update_partial()
            .withf(move |_, patch| {
                patch.login_attempts == Some(0)
                    && patch.locked_until == Some(None)
                    && patch.last_login == Some(Some(now))
                    && patch.name.is_none()
                    && patch.is_active.is_none()
            })
            .times(1)
            .returning(move |_, _| Ok(returned.clone()));

        let tracker = LockoutTracker::default();
        tracker.record_success(&repo, target.id, now).await.unwrap();
    }
}
