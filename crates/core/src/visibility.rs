//! Visibility gate for approval requests.
//!
//! Admins see everything by id. Everyone else needs the approvals module
//! permission, and for `restricted` / `top_secret` requests must also be a
//! participant: the requester or one of the named approvers.

use crate::approval::VisibilityScope;
use crate::identity::IdentityKeys;

/// The caller, as far as visibility is concerned.
#[derive(Debug, Clone, Copy)]
pub struct Viewer<'a> {
    pub is_admin: bool,
    pub has_module_access: bool,
    pub keys: &'a IdentityKeys,
}

/// Whether the viewer is the requester or any approver on the chain.
pub fn is_participant<'a>(
    keys: &IdentityKeys,
    requester: &str,
    approver_names: impl IntoIterator<Item = &'a str>,
) -> bool {
    keys.matches(requester) || approver_names.into_iter().any(|name| keys.matches(name))
}

/// Single-item gate used by the detail view and attachment download.
pub fn can_view(scope: VisibilityScope, viewer: Viewer<'_>, participant: bool) -> bool {
    if viewer.is_admin {
        return true;
    }
    if !viewer.has_module_access {
        return false;
    }
    match scope {
        VisibilityScope::Org => true,
        VisibilityScope::Restricted | VisibilityScope::TopSecret => participant,
    }
}

/// Gate for search and listing results.
///
/// Stricter than [`can_view`]: `top_secret` requests are only ever listed to
/// participants, admins included.
pub fn can_list(scope: VisibilityScope, viewer: Viewer<'_>, participant: bool) -> bool {
    match scope {
        VisibilityScope::TopSecret => participant && (viewer.is_admin || viewer.has_module_access),
        _ => can_view(scope, viewer, participant),
    }
}

/// Whether the confidential note may be shown: admins and participants only.
pub fn can_read_confidential(viewer: Viewer<'_>, participant: bool) -> bool {
    viewer.is_admin || participant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::DirectoryEntry;

    fn keys(login: &str) -> IdentityKeys {
        let dir = vec![DirectoryEntry {
            english_name: "Bob Lin".into(),
            name: "林大寶".into(),
            email: "bob.lin@hotel.example".into(),
        }];
        IdentityKeys::for_login(login, &dir)
    }

    fn viewer(keys: &IdentityKeys, is_admin: bool, access: bool) -> Viewer<'_> {
        Viewer {
            is_admin,
            has_module_access: access,
            keys,
        }
    }

    #[test]
    fn participant_by_requester_or_approver_alias() {
        let k = keys("bob.lin");
        assert!(is_participant(&k, "bob.lin", ["Alice"]));
        assert!(is_participant(&k, "carol", ["Alice", "林大寶"]));
        assert!(!is_participant(&k, "carol", ["Alice"]));
    }

    #[test]
    fn org_scope_requires_module_access() {
        let k = keys("dave");
        assert!(can_view(VisibilityScope::Org, viewer(&k, false, true), false));
        assert!(!can_view(VisibilityScope::Org, viewer(&k, false, false), false));
    }

    #[test]
    fn restricted_scope_requires_participation() {
        let k = keys("dave");
        assert!(!can_view(VisibilityScope::Restricted, viewer(&k, false, true), false));
        assert!(can_view(VisibilityScope::Restricted, viewer(&k, false, true), true));
        assert!(can_view(VisibilityScope::TopSecret, viewer(&k, true, false), false));
    }

    #[test]
    fn participants_without_module_access_are_refused() {
        let k = keys("dave");
        assert!(!can_view(VisibilityScope::Restricted, viewer(&k, false, false), true));
    }

    #[test]
    fn top_secret_is_never_listed_to_non_participants() {
        let k = keys("dave");
        assert!(!can_list(VisibilityScope::TopSecret, viewer(&k, true, true), false));
        assert!(can_list(VisibilityScope::TopSecret, viewer(&k, true, false), true));
        assert!(can_list(VisibilityScope::Restricted, viewer(&k, true, false), false));
        assert!(!can_list(VisibilityScope::Restricted, viewer(&k, false, true), false));
    }

    #[test]
    fn confidential_note_for_participants_and_admins() {
        let k = keys("dave");
        assert!(can_read_confidential(viewer(&k, true, true), false));
        assert!(can_read_confidential(viewer(&k, false, true), true));
        assert!(!can_read_confidential(viewer(&k, false, true), false));
    }
}
