//! Authorization gate - ordered predicate evaluation per request.
//!
//! Each predicate is a standalone function taking the principal explicitly.
//! A [`PredicateChain`] keeps its predicates in canonical order, so the
//! first failing check is always the most fundamental one: a caller with no
//! session is `Unauthenticated` even on a role-restricted, owned route.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{ApprovalStatus, SessionPrincipal, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::ResourceRepository;

/// Why the gate refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    Unauthenticated,
    PendingApproval,
    Forbidden,
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AppError::Unauthenticated,
            Denial::PendingApproval => AppError::PendingApproval,
            Denial::Forbidden => AppError::Forbidden,
        }
    }
}

/// Outcome of evaluating one predicate or a whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }

    fn from_check(passed: bool, denial: Denial) -> Self {
        if passed {
            Decision::Allow
        } else {
            Decision::Deny(denial)
        }
    }
}

/// A single authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Authenticated,
    Approved,
    Role(Vec<UserRole>),
    /// Ownership of an arbitrary record; `None` when the record has no owner or was not found
    OwnsResource(Option<Uuid>),
    OwnsCourse(Uuid),
    EnrolledIn(Uuid),
}

impl Predicate {
    fn rank(&self) -> u8 {
        match self {
            Predicate::Authenticated => 0,
            Predicate::Approved => 1,
            Predicate::Role(_) => 2,
            Predicate::OwnsResource(_) => 3,
            Predicate::OwnsCourse(_) => 4,
            Predicate::EnrolledIn(_) => 5,
        }
    }
}

/// Ordered, short-circuiting list of predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateChain {
    predicates: Vec<Predicate>,
}

impl PredicateChain {
    /// Chain that only requires a session.
    pub fn new() -> Self {
        Self::default().with(Predicate::Authenticated)
    }

    /// Session plus approval, the baseline for every non-admin action.
    pub fn approved() -> Self {
        Self::new().with(Predicate::Approved)
    }

    /// Approved session holding the admin role.
    pub fn admin() -> Self {
        Self::approved().with(Predicate::Role(vec![UserRole::Admin]))
    }

    /// Add a predicate at its canonical position.
    pub fn with(mut self, predicate: Predicate) -> Self {
        let position = self
            .predicates
            .iter()
            .position(|p| p.rank() > predicate.rank())
            .unwrap_or(self.predicates.len());
        self.predicates.insert(position, predicate);
        self
    }

    pub fn roles(self, allowed: &[UserRole]) -> Self {
        self.with(Predicate::Role(allowed.to_vec()))
    }

    pub fn owns_course(self, course_id: Uuid) -> Self {
        self.with(Predicate::OwnsCourse(course_id))
    }

    pub fn enrolled_in(self, course_id: Uuid) -> Self {
        self.with(Predicate::EnrolledIn(course_id))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

pub fn require_authenticated(principal: Option<&SessionPrincipal>) -> Decision {
    Decision::from_check(principal.is_some(), Denial::Unauthenticated)
}

/// Admins are created approved and are never gated on approval.
pub fn require_approved(principal: &SessionPrincipal) -> Decision {
    let approved = match principal.role {
        UserRole::Admin => true,
        UserRole::Lecturer | UserRole::Student => {
            principal.approval_status == ApprovalStatus::Approved
        }
    };
    Decision::from_check(approved, Denial::PendingApproval)
}

pub fn require_role(principal: &SessionPrincipal, allowed: &[UserRole]) -> Decision {
    Decision::from_check(allowed.contains(&principal.role), Denial::Forbidden)
}

pub fn require_owner(principal: &SessionPrincipal, owner_id: Option<Uuid>) -> Decision {
    let owns = principal.is_admin() || owner_id == Some(principal.user_id);
    Decision::from_check(owns, Denial::Forbidden)
}

/// Admins pass; lecturers pass only for courses they teach.
pub async fn require_course_owner(
    principal: &SessionPrincipal,
    resources: &dyn ResourceRepository,
    course_id: Uuid,
) -> AppResult<Decision> {
    match principal.role {
        UserRole::Admin => Ok(Decision::Allow),
        UserRole::Lecturer => {
            let lecturer_id = resources
                .find_course_by_id(course_id)
                .await?
                .and_then(|course| course.lecturer_id);
            Ok(Decision::from_check(
                lecturer_id == Some(principal.user_id),
                Denial::Forbidden,
            ))
        }
        UserRole::Student => Ok(Decision::Deny(Denial::Forbidden)),
    }
}

/// Admins and lecturers pass; students need an active enrollment.
pub async fn require_enrollment(
    principal: &SessionPrincipal,
    resources: &dyn ResourceRepository,
    course_id: Uuid,
) -> AppResult<Decision> {
    match principal.role {
        UserRole::Admin | UserRole::Lecturer => Ok(Decision::Allow),
        UserRole::Student => {
            let enrolled = resources
                .list_active_enrollments_for_student(principal.user_id)
                .await?
                .iter()
                .any(|enrollment| enrollment.course_id == course_id);
            Ok(Decision::from_check(enrolled, Denial::Forbidden))
        }
    }
}

/// Evaluates predicate chains for a request.
#[derive(Clone)]
pub struct Gate {
    resources: Arc<dyn ResourceRepository>,
}

impl Gate {
    pub fn new(resources: Arc<dyn ResourceRepository>) -> Self {
        Self { resources }
    }

    /// Evaluate `chain` for `principal`, stopping at the first denial.
    ///
    /// Every predicate needs a principal, so a missing one is reported as
    /// `Unauthenticated` before anything else. Lookup failures deny.
    pub async fn authorize(
        &self,
        principal: Option<&SessionPrincipal>,
        chain: &PredicateChain,
    ) -> Decision {
        if chain.predicates().is_empty() {
            return Decision::Allow;
        }
        let principal = match principal {
            Some(principal) => principal,
            None => return Decision::Deny(Denial::Unauthenticated),
        };

        for predicate in chain.predicates() {
            let decision = self.evaluate(principal, predicate).await;
            if !decision.is_allowed() {
                tracing::debug!(
                    user_id = %principal.user_id,
                    ?predicate,
                    ?decision,
                    "Authorization denied"
                );
                return decision;
            }
        }
        Decision::Allow
    }

    async fn evaluate(&self, principal: &SessionPrincipal, predicate: &Predicate) -> Decision {
        let lookup = match predicate {
            Predicate::Authenticated => return require_authenticated(Some(principal)),
            Predicate::Approved => return require_approved(principal),
            Predicate::Role(allowed) => return require_role(principal, allowed),
            Predicate::OwnsResource(owner_id) => return require_owner(principal, *owner_id),
            Predicate::OwnsCourse(course_id) => {
                require_course_owner(principal, self.resources.as_ref(), *course_id).await
            }
            Predicate::EnrolledIn(course_id) => {
                require_enrollment(principal, self.resources.as_ref(), *course_id).await
            }
        };

        lookup.unwrap_or_else(|e| {
            tracing::error!(user_id = %principal.user_id, error = %e, "Ownership lookup failed");
            Decision::Deny(Denial::Forbidden)
        })
    }
}
