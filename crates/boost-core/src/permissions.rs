//! Permission sets, delegation scopes and capabilities
//!
//! A [`PermissionSet`] carries five boolean flags that apply to the boost the
//! set is attached to, and five delegation flags whose [`ChildScope`] reaches
//! down into descendants. Sets form a join-semilattice with
//! [`PermissionSet::empty`] as bottom; merging never narrows a grant.
//!
//! On the wire a delegation flag is `"*"` (every current and future
//! descendant), `""`/`null` (no delegation) or a list of boost URIs.

use crate::identifiers::BoostUri;
use crate::semilattice::{Bottom, JoinSemilattice};
use crate::{BoostError, BoostResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Delegation scope
// ============================================================================

/// How far a delegation flag reaches into the subtree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ChildScope {
    /// No delegation
    #[default]
    None,
    /// Every current and future descendant, at any depth
    All,
    /// Only the listed boosts
    Explicit(BTreeSet<BoostUri>),
}

impl ChildScope {
    /// Build an explicit scope, collapsing an empty list to `None`
    pub fn explicit(uris: impl IntoIterator<Item = BoostUri>) -> Self {
        let set: BTreeSet<BoostUri> = uris.into_iter().collect();
        if set.is_empty() {
            Self::None
        } else {
            Self::Explicit(set)
        }
    }

    /// Whether this scope delegates nothing
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::All => false,
            Self::Explicit(set) => set.is_empty(),
        }
    }

    /// Whether this scope reaches `target`
    pub fn covers(&self, target: &BoostUri) -> bool {
        match self {
            Self::None => false,
            Self::All => true,
            Self::Explicit(set) => set.contains(target),
        }
    }

    /// Whether every boost reached by `other` is also reached by `self`
    pub fn contains(&self, other: &ChildScope) -> bool {
        match (self, other) {
            (_, Self::None) => true,
            (Self::All, _) => true,
            (Self::Explicit(mine), Self::Explicit(theirs)) => theirs.is_subset(mine),
            _ => other.is_none(),
        }
    }
}

impl JoinSemilattice for ChildScope {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::None, scope) | (scope, Self::None) => scope.clone(),
            (Self::Explicit(a), Self::Explicit(b)) => Self::Explicit(a.union(b).cloned().collect()),
        }
    }
}

impl Bottom for ChildScope {
    fn bottom() -> Self {
        Self::None
    }
}

impl Serialize for ChildScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_str(""),
            Self::All => serializer.serialize_str("*"),
            Self::Explicit(set) => set.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ChildScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawScope {
            Text(String),
            List(Vec<BoostUri>),
        }

        match Option::<RawScope>::deserialize(deserializer)? {
            None => Ok(Self::None),
            Some(RawScope::Text(text)) => match text.as_str() {
                "" => Ok(Self::None),
                "*" => Ok(Self::All),
                other => Err(D::Error::custom(format!(
                    "invalid delegation scope: {other}"
                ))),
            },
            Some(RawScope::List(uris)) => Ok(Self::explicit(uris)),
        }
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// A single capability the resolver can be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Edit the boost
    Edit,
    /// Issue credentials under the boost
    Issue,
    /// Revoke issued credentials
    Revoke,
    /// Grant and retract roles on the boost
    ManagePermissions,
    /// Read issuance analytics
    ViewAnalytics,
    /// Issue under descendants
    IssueChildren,
    /// Create child boosts
    CreateChildren,
    /// Edit descendants
    EditChildren,
    /// Revoke under descendants
    RevokeChildren,
    /// Manage permissions on descendants
    ManageChildrenPermissions,
}

impl Capability {
    /// Every capability, booleans first
    pub const ALL: [Capability; 10] = [
        Capability::Edit,
        Capability::Issue,
        Capability::Revoke,
        Capability::ManagePermissions,
        Capability::ViewAnalytics,
        Capability::IssueChildren,
        Capability::CreateChildren,
        Capability::EditChildren,
        Capability::RevokeChildren,
        Capability::ManageChildrenPermissions,
    ];

    /// Whether this capability is backed by a delegation flag
    pub fn is_delegation(self) -> bool {
        matches!(
            self,
            Capability::IssueChildren
                | Capability::CreateChildren
                | Capability::EditChildren
                | Capability::RevokeChildren
                | Capability::ManageChildrenPermissions
        )
    }

    /// Delegation flag an ancestor must hold to confer this capability.
    ///
    /// Delegation capabilities are their own children variant: holding
    /// `createChildren` over a subtree lets the holder create children
    /// anywhere inside it.
    pub fn children_variant(self) -> Option<Capability> {
        match self {
            Capability::Edit => Some(Capability::EditChildren),
            Capability::Issue => Some(Capability::IssueChildren),
            Capability::Revoke => Some(Capability::RevokeChildren),
            Capability::ManagePermissions => Some(Capability::ManageChildrenPermissions),
            Capability::ViewAnalytics => None,
            delegation => Some(delegation),
        }
    }

    /// Wire name of the capability
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Edit => "edit",
            Capability::Issue => "issue",
            Capability::Revoke => "revoke",
            Capability::ManagePermissions => "managePermissions",
            Capability::ViewAnalytics => "viewAnalytics",
            Capability::IssueChildren => "issueChildren",
            Capability::CreateChildren => "createChildren",
            Capability::EditChildren => "editChildren",
            Capability::RevokeChildren => "revokeChildren",
            Capability::ManageChildrenPermissions => "manageChildrenPermissions",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = BoostError;

    fn from_str(raw: &str) -> BoostResult<Self> {
        Capability::ALL
            .into_iter()
            .find(|cap| cap.as_str() == raw)
            .ok_or_else(|| BoostError::bad_request(format!("Unknown capability: {raw}")))
    }
}

// ============================================================================
// Permission set
// ============================================================================

/// Role or policy permission record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionSet {
    /// Edit the boost
    pub can_edit: bool,
    /// Issue credentials under the boost
    pub can_issue: bool,
    /// Revoke issued credentials
    pub can_revoke: bool,
    /// Manage roles on the boost
    pub can_manage_permissions: bool,
    /// Read analytics
    pub can_view_analytics: bool,
    /// Issue under descendants
    pub can_issue_children: ChildScope,
    /// Create children
    pub can_create_children: ChildScope,
    /// Edit descendants
    pub can_edit_children: ChildScope,
    /// Revoke under descendants
    pub can_revoke_children: ChildScope,
    /// Manage permissions on descendants
    pub can_manage_children_permissions: ChildScope,
}

/// One unit of grant inside a [`PermissionSet`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GrantedFlag {
    /// A boolean flag set to true
    Flag(Capability),
    /// A delegation flag set to `All`
    AllChildren(Capability),
    /// A delegation flag listing this boost
    Child(Capability, BoostUri),
}

impl PermissionSet {
    /// Set with nothing granted
    pub fn empty() -> Self {
        Self::default()
    }

    /// Admin set: every boolean flag, no delegation
    pub fn admin() -> Self {
        Self {
            can_edit: true,
            can_issue: true,
            can_revoke: true,
            can_manage_permissions: true,
            can_view_analytics: true,
            ..Self::default()
        }
    }

    /// Creator set: every boolean flag and every delegation flag at `All`
    pub fn creator() -> Self {
        Self {
            can_issue_children: ChildScope::All,
            can_create_children: ChildScope::All,
            can_edit_children: ChildScope::All,
            can_revoke_children: ChildScope::All,
            can_manage_children_permissions: ChildScope::All,
            ..Self::admin()
        }
    }

    /// Whether no flag is granted
    pub fn is_empty(&self) -> bool {
        Capability::ALL.into_iter().all(|cap| match self.scope(cap) {
            Some(scope) => scope.is_none(),
            None => !self.flag(cap),
        })
    }

    /// Whether every boolean admin flag is granted
    pub fn is_admin(&self) -> bool {
        self.can_edit
            && self.can_issue
            && self.can_revoke
            && self.can_manage_permissions
            && self.can_view_analytics
    }

    /// Value of a boolean flag; false for delegation capabilities
    pub fn flag(&self, cap: Capability) -> bool {
        match cap {
            Capability::Edit => self.can_edit,
            Capability::Issue => self.can_issue,
            Capability::Revoke => self.can_revoke,
            Capability::ManagePermissions => self.can_manage_permissions,
            Capability::ViewAnalytics => self.can_view_analytics,
            _ => false,
        }
    }

    /// Delegation scope for a delegation capability
    pub fn scope(&self, cap: Capability) -> Option<&ChildScope> {
        match cap {
            Capability::IssueChildren => Some(&self.can_issue_children),
            Capability::CreateChildren => Some(&self.can_create_children),
            Capability::EditChildren => Some(&self.can_edit_children),
            Capability::RevokeChildren => Some(&self.can_revoke_children),
            Capability::ManageChildrenPermissions => Some(&self.can_manage_children_permissions),
            _ => None,
        }
    }

    fn scope_mut(&mut self, cap: Capability) -> Option<&mut ChildScope> {
        match cap {
            Capability::IssueChildren => Some(&mut self.can_issue_children),
            Capability::CreateChildren => Some(&mut self.can_create_children),
            Capability::EditChildren => Some(&mut self.can_edit_children),
            Capability::RevokeChildren => Some(&mut self.can_revoke_children),
            Capability::ManageChildrenPermissions => {
                Some(&mut self.can_manage_children_permissions)
            }
            _ => None,
        }
    }

    /// Set a boolean flag; ignored for delegation capabilities
    pub fn set_flag(&mut self, cap: Capability, value: bool) {
        match cap {
            Capability::Edit => self.can_edit = value,
            Capability::Issue => self.can_issue = value,
            Capability::Revoke => self.can_revoke = value,
            Capability::ManagePermissions => self.can_manage_permissions = value,
            Capability::ViewAnalytics => self.can_view_analytics = value,
            _ => {}
        }
    }

    /// Replace a delegation scope; ignored for boolean capabilities
    pub fn set_scope(&mut self, cap: Capability, scope: ChildScope) {
        if let Some(slot) = self.scope_mut(cap) {
            *slot = scope;
        }
    }

    /// Whether this set grants `cap` when evaluated at `target`.
    ///
    /// Boolean capabilities map one to one. A delegation capability is granted
    /// when its scope covers `target`.
    pub fn grants(&self, cap: Capability, target: &BoostUri) -> bool {
        match self.scope(cap) {
            Some(scope) => scope.covers(target),
            None => self.flag(cap),
        }
    }

    /// Decompose into individual grant units
    pub fn granted_flags(&self) -> Vec<GrantedFlag> {
        let mut flags = Vec::new();
        for cap in Capability::ALL {
            match self.scope(cap) {
                Some(ChildScope::None) => {}
                Some(ChildScope::All) => flags.push(GrantedFlag::AllChildren(cap)),
                Some(ChildScope::Explicit(uris)) => {
                    flags.extend(uris.iter().map(|uri| GrantedFlag::Child(cap, uri.clone())));
                }
                None if self.flag(cap) => flags.push(GrantedFlag::Flag(cap)),
                None => {}
            }
        }
        flags
    }

    /// Rebuild a set from grant units
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = &'a GrantedFlag>) -> Self {
        let mut set = Self::empty();
        for flag in flags {
            match flag {
                GrantedFlag::Flag(cap) => set.set_flag(*cap, true),
                GrantedFlag::AllChildren(cap) => set.set_scope(*cap, ChildScope::All),
                GrantedFlag::Child(cap, uri) => {
                    let widened = set
                        .scope(*cap)
                        .map(|scope| scope.join(&ChildScope::explicit([uri.clone()])));
                    if let Some(widened) = widened {
                        set.set_scope(*cap, widened);
                    }
                }
            }
        }
        set
    }

    /// Capabilities this set holds at `target`
    pub fn capabilities_at(&self, target: &BoostUri) -> BTreeSet<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.grants(*cap, target))
            .collect()
    }
}

impl JoinSemilattice for PermissionSet {
    fn join(&self, other: &Self) -> Self {
        Self {
            can_edit: self.can_edit || other.can_edit,
            can_issue: self.can_issue || other.can_issue,
            can_revoke: self.can_revoke || other.can_revoke,
            can_manage_permissions: self.can_manage_permissions || other.can_manage_permissions,
            can_view_analytics: self.can_view_analytics || other.can_view_analytics,
            can_issue_children: self.can_issue_children.join(&other.can_issue_children),
            can_create_children: self.can_create_children.join(&other.can_create_children),
            can_edit_children: self.can_edit_children.join(&other.can_edit_children),
            can_revoke_children: self.can_revoke_children.join(&other.can_revoke_children),
            can_manage_children_permissions: self
                .can_manage_children_permissions
                .join(&other.can_manage_children_permissions),
        }
    }
}

impl Bottom for PermissionSet {
    fn bottom() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Partial updates
// ============================================================================

/// Partial permission update; absent fields are left untouched
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionUpdate {
    /// New `canEdit`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_edit: Option<bool>,
    /// New `canIssue`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_issue: Option<bool>,
    /// New `canRevoke`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_revoke: Option<bool>,
    /// New `canManagePermissions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_manage_permissions: Option<bool>,
    /// New `canViewAnalytics`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_view_analytics: Option<bool>,
    /// New `canIssueChildren`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_issue_children: Option<ChildScope>,
    /// New `canCreateChildren`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_create_children: Option<ChildScope>,
    /// New `canEditChildren`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_edit_children: Option<ChildScope>,
    /// New `canRevokeChildren`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_revoke_children: Option<ChildScope>,
    /// New `canManageChildrenPermissions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_manage_children_permissions: Option<ChildScope>,
}

/// A single field named by a [`PermissionUpdate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagUpdate {
    /// Boolean flag and its new value
    Flag(Capability, bool),
    /// Delegation flag and its new scope
    Scope(Capability, ChildScope),
}

impl PermissionUpdate {
    /// Fields this update names, in capability order
    pub fn entries(&self) -> Vec<FlagUpdate> {
        let flags = [
            (Capability::Edit, self.can_edit),
            (Capability::Issue, self.can_issue),
            (Capability::Revoke, self.can_revoke),
            (Capability::ManagePermissions, self.can_manage_permissions),
            (Capability::ViewAnalytics, self.can_view_analytics),
        ];
        let scopes = [
            (Capability::IssueChildren, &self.can_issue_children),
            (Capability::CreateChildren, &self.can_create_children),
            (Capability::EditChildren, &self.can_edit_children),
            (Capability::RevokeChildren, &self.can_revoke_children),
            (
                Capability::ManageChildrenPermissions,
                &self.can_manage_children_permissions,
            ),
        ];

        flags
            .into_iter()
            .filter_map(|(cap, value)| value.map(|v| FlagUpdate::Flag(cap, v)))
            .chain(
                scopes
                    .into_iter()
                    .filter_map(|(cap, scope)| scope.clone().map(|s| FlagUpdate::Scope(cap, s))),
            )
            .collect()
    }

    /// Whether the update names no field
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Overwrite the named fields of `set`
    pub fn apply_to(&self, set: &mut PermissionSet) {
        for entry in self.entries() {
            match entry {
                FlagUpdate::Flag(cap, value) => set.set_flag(cap, value),
                FlagUpdate::Scope(cap, scope) => set.set_scope(cap, scope),
            }
        }
    }
}

impl From<&PermissionSet> for PermissionUpdate {
    /// Update naming exactly the granted fields of `set`
    fn from(set: &PermissionSet) -> Self {
        let non_empty = |scope: &ChildScope| (!scope.is_none()).then(|| scope.clone());
        let truthy = |value: bool| value.then_some(true);
        Self {
            can_edit: truthy(set.can_edit),
            can_issue: truthy(set.can_issue),
            can_revoke: truthy(set.can_revoke),
            can_manage_permissions: truthy(set.can_manage_permissions),
            can_view_analytics: truthy(set.can_view_analytics),
            can_issue_children: non_empty(&set.can_issue_children),
            can_create_children: non_empty(&set.can_create_children),
            can_edit_children: non_empty(&set.can_edit_children),
            can_revoke_children: non_empty(&set.can_revoke_children),
            can_manage_children_permissions: non_empty(&set.can_manage_children_permissions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uri(id: &str) -> BoostUri {
        BoostUri::new("example.org", id)
    }

    fn scope_strategy() -> impl Strategy<Value = ChildScope> {
        prop_oneof![
            Just(ChildScope::None),
            Just(ChildScope::All),
            prop::collection::btree_set(0u8..6, 0..4)
                .prop_map(|ids| ChildScope::explicit(ids.into_iter().map(|i| uri(&i.to_string())))),
        ]
    }

    #[test]
    fn scope_wire_format() {
        let all: ChildScope = serde_json::from_str("\"*\"").unwrap();
        assert_eq!(all, ChildScope::All);
        let none: ChildScope = serde_json::from_str("\"\"").unwrap();
        assert_eq!(none, ChildScope::None);
        let null: ChildScope = serde_json::from_str("null").unwrap();
        assert_eq!(null, ChildScope::None);
        let listed: ChildScope =
            serde_json::from_str("[\"lc:network:example.org:boost:a\"]").unwrap();
        assert!(listed.covers(&uri("a")));
        assert!(!listed.covers(&uri("b")));

        assert!(serde_json::from_str::<ChildScope>("\"some\"").is_err());
        assert_eq!(serde_json::to_string(&ChildScope::All).unwrap(), "\"*\"");
    }

    #[test]
    fn permission_set_defaults_missing_fields() {
        let set: PermissionSet =
            serde_json::from_str(r#"{"canIssue": true, "canRevokeChildren": "*"}"#).unwrap();
        assert!(set.can_issue);
        assert!(!set.can_edit);
        assert_eq!(set.can_revoke_children, ChildScope::All);
        assert_eq!(set.can_issue_children, ChildScope::None);
    }

    #[test]
    fn malformed_permission_set_is_rejected() {
        let parsed = serde_json::from_str::<PermissionSet>(r#"{"canIssue": "yes"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn grants_respects_scope() {
        let set = PermissionSet {
            can_issue_children: ChildScope::explicit([uri("child")]),
            can_revoke_children: ChildScope::All,
            ..PermissionSet::admin()
        };
        assert!(set.grants(Capability::Issue, &uri("x")));
        assert!(set.grants(Capability::IssueChildren, &uri("child")));
        assert!(!set.grants(Capability::IssueChildren, &uri("other")));
        assert!(set.grants(Capability::RevokeChildren, &uri("other")));
        assert!(!set.grants(Capability::CreateChildren, &uri("child")));
    }

    #[test]
    fn admin_and_creator_sets() {
        assert!(PermissionSet::admin().is_admin());
        assert!(PermissionSet::admin().can_issue_children.is_none());
        assert!(PermissionSet::creator().is_admin());
        assert_eq!(
            PermissionSet::creator().can_manage_children_permissions,
            ChildScope::All
        );
        assert!(PermissionSet::empty().is_empty());
        assert!(!PermissionSet::admin().is_empty());
    }

    #[test]
    fn capability_parsing() {
        assert_eq!(
            "manageChildrenPermissions".parse::<Capability>().unwrap(),
            Capability::ManageChildrenPermissions
        );
        let err = "teleport".parse::<Capability>().unwrap_err();
        assert!(matches!(err, BoostError::BadRequest { .. }));
        assert_eq!(
            Capability::Issue.children_variant(),
            Some(Capability::IssueChildren)
        );
        assert_eq!(Capability::ViewAnalytics.children_variant(), None);
    }

    #[test]
    fn update_only_touches_named_fields() {
        let mut set = PermissionSet::admin();
        let update = PermissionUpdate {
            can_issue: Some(false),
            can_issue_children: Some(ChildScope::All),
            ..PermissionUpdate::default()
        };
        update.apply_to(&mut set);
        assert!(!set.can_issue);
        assert!(set.can_edit);
        assert_eq!(set.can_issue_children, ChildScope::All);
        assert_eq!(update.entries().len(), 2);
    }

    #[test]
    fn update_from_set_names_granted_fields() {
        let update = PermissionUpdate::from(&PermissionSet {
            can_issue: true,
            can_edit_children: ChildScope::All,
            ..PermissionSet::empty()
        });
        assert_eq!(
            update.entries(),
            vec![
                FlagUpdate::Flag(Capability::Issue, true),
                FlagUpdate::Scope(Capability::EditChildren, ChildScope::All),
            ]
        );
    }

    proptest! {
        #[test]
        fn scope_join_laws(a in scope_strategy(), b in scope_strategy(), c in scope_strategy()) {
            prop_assert_eq!(a.join(&a), a.clone());
            prop_assert_eq!(a.join(&b), b.join(&a));
            prop_assert_eq!(a.join(&b).join(&c), a.join(&b.join(&c)));
            prop_assert_eq!(a.join(&ChildScope::bottom()), a.clone());
        }

        #[test]
        fn join_contains_both_sides(a in scope_strategy(), b in scope_strategy()) {
            let joined = a.join(&b);
            prop_assert!(joined.contains(&a));
            prop_assert!(joined.contains(&b));
            prop_assert_eq!(a.leq(&b), b.contains(&a));
        }

        #[test]
        fn flags_round_trip(issue in any::<bool>(), edit in any::<bool>(), scope in scope_strategy()) {
            let set = PermissionSet {
                can_issue: issue,
                can_edit: edit,
                can_revoke_children: scope,
                ..PermissionSet::empty()
            };
            prop_assert_eq!(PermissionSet::from_flags(&set.granted_flags()), set);
        }
    }
}
