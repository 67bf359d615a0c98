//! Declarative access policies.
//!
//! A policy is an ordered list of independent rules, each pairing a subject
//! matcher with the operations it grants. Rules combine as a union: any
//! matching rule that grants the requested operation allows it. Disabled
//! operations are removed before any rule is consulted.

use std::collections::BTreeSet;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{Subject, UserRole};

/// Operation kinds a policy can grant.
pub trait PolicyOperation: Copy + Ord + Debug {
    /// Returns true when a rule granting `granted` also grants `self`.
    fn granted_by(self, granted: Self) -> bool {
        self == granted
    }

    /// Returns a stable label for error messages.
    fn label(self) -> &'static str;
}

/// Record operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create a record.
    Create,
    /// Read a record.
    Read,
    /// Update a record.
    Update,
    /// Delete a record.
    Delete,
    /// Listen to record changes.
    Subscribe,
}

impl PolicyOperation for Operation {
    fn granted_by(self, granted: Self) -> bool {
        self == granted || (self == Self::Subscribe && granted == Self::Read)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Subscribe => "subscribe",
        }
    }
}

/// Who a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectMatcher {
    /// Callers without identity.
    Guest,
    /// Any caller with an identity.
    Authenticated,
    /// Callers belonging to at least one of the groups.
    Groups(Vec<UserRole>),
    /// Callers whose identity equals the record's owner field.
    Owner,
}

/// One rule of a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule<Op> {
    matcher: SubjectMatcher,
    operations: BTreeSet<Op>,
}

impl<Op: PolicyOperation> AccessRule<Op> {
    /// Creates a rule granting operations to matching subjects.
    #[must_use]
    pub fn new(matcher: SubjectMatcher, operations: &[Op]) -> Self {
        Self {
            matcher,
            operations: operations.iter().copied().collect(),
        }
    }

    /// Returns the subject matcher.
    #[must_use]
    pub fn matcher(&self) -> &SubjectMatcher {
        &self.matcher
    }

    fn grants(&self, operation: Op) -> bool {
        self.operations
            .iter()
            .any(|granted| operation.granted_by(*granted))
    }
}

/// Ownership facts available when a rule is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerCheck<'a> {
    /// A stored record exists; carries its owner field value.
    Instance(Option<&'a str>),
    /// No stored record yet; carries the owner field value the caller proposes.
    Proposed(Option<&'a str>),
    /// The target has no ownership concept.
    NotApplicable,
}

impl OwnerCheck<'_> {
    fn is_owned_by(self, subject: &Subject) -> bool {
        let owner = match self {
            Self::Instance(owner) | Self::Proposed(owner) => owner,
            Self::NotApplicable => None,
        };

        match (owner, subject.identity_id()) {
            (Some(owner), Some(identity)) => owner == identity,
            _ => false,
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No rule granted the operation.
    NotAuthorized,
    /// The operation is structurally unavailable.
    OperationDisabled,
}

/// Policy evaluation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation is refused.
    Deny(DenyReason),
}

impl Decision {
    /// Returns true for [`Decision::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Scope of records a subject may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingScope {
    /// Every record of the type.
    All,
    /// Only records whose owner field equals the identity.
    Owned(String),
    /// Listing is refused.
    Denied(DenyReason),
}

/// Ordered rule set with disabled operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy<Op> {
    rules: Vec<AccessRule<Op>>,
    disabled: BTreeSet<Op>,
}

impl<Op: PolicyOperation> Default for Policy<Op> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            disabled: BTreeSet::new(),
        }
    }
}

impl<Op: PolicyOperation> Policy<Op> {
    /// Creates a policy from rules.
    #[must_use]
    pub fn new(rules: Vec<AccessRule<Op>>) -> Self {
        Self {
            rules,
            disabled: BTreeSet::new(),
        }
    }

    /// Adds a rule.
    #[must_use]
    pub fn allow(mut self, matcher: SubjectMatcher, operations: &[Op]) -> Self {
        self.rules.push(AccessRule::new(matcher, operations));
        self
    }

    /// Disables operations regardless of rules.
    #[must_use]
    pub fn disable(mut self, operations: &[Op]) -> Self {
        self.disabled.extend(operations.iter().copied());
        self
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[AccessRule<Op>] {
        self.rules.as_slice()
    }

    /// Returns true when the operation is structurally disabled.
    #[must_use]
    pub fn is_disabled(&self, operation: Op) -> bool {
        self.disabled.contains(&operation)
    }

    /// Decides whether the subject may perform the operation.
    #[must_use]
    pub fn evaluate(&self, subject: &Subject, operation: Op, owner: OwnerCheck<'_>) -> Decision {
        if self.is_disabled(operation) {
            return Decision::Deny(DenyReason::OperationDisabled);
        }

        if matches!(subject, Subject::System) {
            return Decision::Allow;
        }

        let granted = self
            .rules
            .iter()
            .filter(|rule| rule.grants(operation))
            .any(|rule| Self::matches(rule.matcher(), subject, owner));

        if granted {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::NotAuthorized)
        }
    }

    /// Decides which records of a type the subject may list with `operation`.
    ///
    /// When only ownership rules grant the operation the listing narrows to
    /// the subject's own records.
    #[must_use]
    pub fn listing_scope(&self, subject: &Subject, operation: Op) -> ListingScope {
        if self.is_disabled(operation) {
            return ListingScope::Denied(DenyReason::OperationDisabled);
        }

        if matches!(subject, Subject::System) {
            return ListingScope::All;
        }

        let granting = self.rules.iter().filter(|rule| rule.grants(operation));
        let mut owner_rule = false;
        for rule in granting {
            match rule.matcher() {
                SubjectMatcher::Owner => owner_rule = true,
                matcher => {
                    if Self::matches(matcher, subject, OwnerCheck::NotApplicable) {
                        return ListingScope::All;
                    }
                }
            }
        }

        match (owner_rule, subject.identity_id()) {
            (true, Some(identity)) => ListingScope::Owned(identity.to_owned()),
            _ => ListingScope::Denied(DenyReason::NotAuthorized),
        }
    }

    fn matches(matcher: &SubjectMatcher, subject: &Subject, owner: OwnerCheck<'_>) -> bool {
        match matcher {
            SubjectMatcher::Guest => matches!(subject, Subject::Guest),
            SubjectMatcher::Authenticated => matches!(subject, Subject::Authenticated { .. }),
            SubjectMatcher::Groups(groups) => groups.iter().any(|group| subject.in_group(*group)),
            SubjectMatcher::Owner => owner.is_owned_by(subject),
        }
    }
}

#[cfg(test)]
mod tests {
    use enermina_core::UserIdentity;
    use proptest::prelude::*;

    use super::{DenyReason, Decision, ListingScope, Operation, OwnerCheck, Policy, SubjectMatcher};
    use crate::{Subject, UserRole};

    fn reminder_policy() -> Policy<Operation> {
        Policy::default()
            .allow(
                SubjectMatcher::Owner,
                &[
                    Operation::Read,
                    Operation::Create,
                    Operation::Update,
                    Operation::Delete,
                ],
            )
            .allow(
                SubjectMatcher::Groups(vec![UserRole::Admin, UserRole::Professional]),
                &[
                    Operation::Read,
                    Operation::Update,
                    Operation::Create,
                    Operation::Delete,
                ],
            )
    }

    fn member(id: &str, groups: &[UserRole]) -> Subject {
        Subject::authenticated(UserIdentity::new(id, None), groups.iter().copied())
    }

    #[test]
    fn ownership_rule_requires_matching_identity() {
        let policy = reminder_policy();
        let subject = member("user-a", &[UserRole::Subscriber]);

        assert_eq!(
            policy.evaluate(&subject, Operation::Update, OwnerCheck::Instance(Some("user-b"))),
            Decision::Deny(DenyReason::NotAuthorized)
        );
        assert_eq!(
            policy.evaluate(&subject, Operation::Update, OwnerCheck::Instance(Some("user-a"))),
            Decision::Allow
        );
    }

    #[test]
    fn group_rule_is_independent_of_ownership() {
        let policy = reminder_policy();
        let admin = member("user-a", &[UserRole::Admin]);

        assert_eq!(
            policy.evaluate(&admin, Operation::Update, OwnerCheck::Instance(Some("user-b"))),
            Decision::Allow
        );
    }

    #[test]
    fn proposed_owner_is_checked_on_create() {
        let policy = reminder_policy();
        let subject = member("user-a", &[]);

        assert!(
            policy
                .evaluate(&subject, Operation::Create, OwnerCheck::Proposed(Some("user-a")))
                .is_allowed()
        );
        assert!(
            !policy
                .evaluate(&subject, Operation::Create, OwnerCheck::Proposed(Some("user-b")))
                .is_allowed()
        );
        assert!(
            !policy
                .evaluate(&subject, Operation::Create, OwnerCheck::Proposed(None))
                .is_allowed()
        );
    }

    #[test]
    fn read_grant_covers_subscribe_unless_disabled() {
        let policy = Policy::default().allow(SubjectMatcher::Authenticated, &[Operation::Read]);
        let subject = member("user-a", &[]);
        assert!(
            policy
                .evaluate(&subject, Operation::Subscribe, OwnerCheck::NotApplicable)
                .is_allowed()
        );

        let policy = policy.disable(&[Operation::Subscribe]);
        assert_eq!(
            policy.evaluate(&subject, Operation::Subscribe, OwnerCheck::NotApplicable),
            Decision::Deny(DenyReason::OperationDisabled)
        );
    }

    #[test]
    fn guest_matcher_does_not_cover_authenticated_callers() {
        let policy = Policy::default().allow(SubjectMatcher::Guest, &[Operation::Read]);
        assert!(
            policy
                .evaluate(&Subject::Guest, Operation::Read, OwnerCheck::NotApplicable)
                .is_allowed()
        );
        assert!(
            !policy
                .evaluate(&member("user-a", &[]), Operation::Read, OwnerCheck::NotApplicable)
                .is_allowed()
        );
    }

    #[test]
    fn system_subject_is_bounded_by_disabled_operations() {
        let policy = reminder_policy().disable(&[Operation::Delete]);
        assert!(
            policy
                .evaluate(&Subject::System, Operation::Create, OwnerCheck::Proposed(None))
                .is_allowed()
        );
        assert_eq!(
            policy.evaluate(&Subject::System, Operation::Delete, OwnerCheck::Instance(None)),
            Decision::Deny(DenyReason::OperationDisabled)
        );
    }

    #[test]
    fn listing_narrows_to_owned_records_for_owner_only_grants() {
        let policy = reminder_policy();
        assert_eq!(
            policy.listing_scope(&member("user-a", &[UserRole::Subscriber]), Operation::Read),
            ListingScope::Owned("user-a".to_owned())
        );
        assert_eq!(
            policy.listing_scope(&member("user-a", &[UserRole::Professional]), Operation::Read),
            ListingScope::All
        );
        assert_eq!(
            policy.listing_scope(&Subject::Guest, Operation::Read),
            ListingScope::Denied(DenyReason::NotAuthorized)
        );
    }

    fn any_operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            Just(Operation::Create),
            Just(Operation::Read),
            Just(Operation::Update),
            Just(Operation::Delete),
            Just(Operation::Subscribe),
        ]
    }

    fn any_subject() -> impl Strategy<Value = Subject> {
        prop_oneof![
            Just(Subject::Guest),
            Just(Subject::System),
            (
                "[a-c]",
                proptest::collection::btree_set(
                    prop_oneof![
                        Just(UserRole::Admin),
                        Just(UserRole::Professional),
                        Just(UserRole::Subscriber),
                    ],
                    0..3
                )
            )
                .prop_map(|(id, groups)| member(&id, &groups.into_iter().collect::<Vec<_>>())),
        ]
    }

    proptest! {
        #[test]
        fn disabled_operations_always_deny(
            subject in any_subject(),
            operation in any_operation(),
            owner in proptest::option::of("[a-c]"),
        ) {
            let policy = reminder_policy()
                .allow(SubjectMatcher::Guest, &[Operation::Read])
                .disable(&[operation]);
            let decision = policy.evaluate(&subject, operation, OwnerCheck::Instance(owner.as_deref()));
            prop_assert_eq!(decision, Decision::Deny(DenyReason::OperationDisabled));
        }

        #[test]
        fn adding_a_rule_never_revokes_access(
            subject in any_subject(),
            operation in any_operation(),
            owner in proptest::option::of("[a-c]"),
        ) {
            let base = reminder_policy();
            let extended = reminder_policy().allow(SubjectMatcher::Guest, &[Operation::Read]);
            let check = OwnerCheck::Instance(owner.as_deref());
            if base.evaluate(&subject, operation, check).is_allowed() {
                prop_assert!(extended.evaluate(&subject, operation, check).is_allowed());
            }
        }
    }
}
