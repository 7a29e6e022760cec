//! Identity resolution between free-text approver names and login accounts.
//!
//! The same person may be addressed by login name, local (legal) name,
//! English name, the combined "English Local" label shown in pickers, or the
//! local part of their email address. All comparisons go through
//! [`fold_key`]: whitespace collapsed, case folded.

use std::collections::HashSet;

/// One row of the employee directory, as needed for identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub english_name: String,
    pub name: String,
    pub email: String,
}

impl DirectoryEntry {
    /// Picker label: `"English Local"`, or whichever half is present.
    pub fn label(&self) -> String {
        combine_label(&self.english_name, &self.name)
    }

    /// The email if it looks like an address.
    pub fn usable_email(&self) -> Option<String> {
        let email = self.email.trim();
        email.contains('@').then(|| email.to_string())
    }

    /// Every folded form this person can be addressed by.
    pub fn forms(&self) -> HashSet<String> {
        let local_part = self.email.split('@').next().unwrap_or_default();
        [
            self.english_name.as_str(),
            self.name.as_str(),
            self.label().as_str(),
            local_part,
        ]
        .into_iter()
        .map(fold_key)
        .filter(|k| !k.is_empty())
        .collect()
    }

    /// Forms accepted by [`find_by_display`]: names and label, not email.
    fn display_forms(&self) -> [String; 3] {
        [
            fold_key(&self.english_name),
            fold_key(&self.name),
            fold_key(&self.label()),
        ]
    }
}

/// Collapse runs of whitespace to a single space and trim.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize`] plus case folding; the comparison key for names.
pub fn fold_key(s: &str) -> String {
    normalize(s).to_lowercase()
}

/// Join English and local names the way the approver picker displays them.
pub fn combine_label(english_name: &str, name: &str) -> String {
    let a = english_name.trim();
    let b = name.trim();
    match (a.is_empty(), b.is_empty()) {
        (false, false) => format!("{a} {b}"),
        (false, true) => a.to_string(),
        _ => b.to_string(),
    }
}

/// Find the first directory row whose English name, local name, or combined
/// label equals `display` (folded). Linear scan.
pub fn find_by_display<'a>(
    entries: &'a [DirectoryEntry],
    display: &str,
) -> Option<&'a DirectoryEntry> {
    let target = fold_key(display);
    if target.is_empty() {
        return None;
    }
    entries
        .iter()
        .find(|e| e.display_forms().iter().any(|f| *f == target))
}

/// An approver name resolved for storage on a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedApprover {
    /// Local name, else English name, else the raw (normalized) input.
    pub name: String,
    pub email: Option<String>,
}

/// Resolve a typed display name to the name and email stored on a step.
///
/// Unresolvable names fall back to the normalized input with no email.
pub fn resolve_approver(entries: &[DirectoryEntry], display: &str) -> ResolvedApprover {
    let raw = normalize(display);
    match find_by_display(entries, &raw) {
        Some(entry) => {
            let name = [entry.name.trim(), entry.english_name.trim()]
                .into_iter()
                .find(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| raw.clone());
            ResolvedApprover {
                name,
                email: entry.usable_email(),
            }
        }
        None => ResolvedApprover {
            name: raw,
            email: None,
        },
    }
}

/// Email for anyone addressed by display name or login form, if known.
pub fn email_for(entries: &[DirectoryEntry], any_name: &str) -> Option<String> {
    if let Some(entry) = find_by_display(entries, any_name) {
        return entry.usable_email();
    }
    let key = fold_key(any_name);
    entries
        .iter()
        .find(|e| e.forms().contains(&key))
        .and_then(DirectoryEntry::usable_email)
}

// ---------------------------------------------------------------------------
// Identity keys
// ---------------------------------------------------------------------------

/// The set of folded names a logged-in account may act as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityKeys(HashSet<String>);

impl IdentityKeys {
    /// Expand a login into every form of every directory row that names it.
    pub fn for_login(login: &str, entries: &[DirectoryEntry]) -> Self {
        let mut keys = HashSet::new();
        let login_key = fold_key(login);
        if login_key.is_empty() {
            return Self(keys);
        }
        keys.insert(login_key.clone());

        for entry in entries {
            let forms = entry.forms();
            if forms.contains(&login_key) {
                keys.extend(forms);
            }
        }
        Self(keys)
    }

    /// Whether `name` (e.g. a step's approver name) refers to this identity.
    pub fn matches(&self, name: &str) -> bool {
        let key = fold_key(name);
        !key.is_empty() && self.0.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys in sorted order, for stable output.
    pub fn sorted(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.iter().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(en: &str, nm: &str, email: &str) -> DirectoryEntry {
        DirectoryEntry {
            english_name: en.to_string(),
            name: nm.to_string(),
            email: email.to_string(),
        }
    }

    fn directory() -> Vec<DirectoryEntry> {
        vec![
            entry("Samuel Huang", "黃金昇", "samuel.huang@hotel.example"),
            entry("Alice", "", "alice@hotel.example"),
            entry("", "陳美玲", "not-an-address"),
        ]
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Samuel \t  Huang \n"), "Samuel Huang");
        assert_eq!(fold_key(" ALICE  Smith"), "alice smith");
    }

    #[test]
    fn combine_label_uses_whichever_half_exists() {
        assert_eq!(combine_label("Samuel Huang", "黃金昇"), "Samuel Huang 黃金昇");
        assert_eq!(combine_label("Alice", " "), "Alice");
        assert_eq!(combine_label("", "陳美玲"), "陳美玲");
        assert_eq!(combine_label("", ""), "");
    }

    #[test]
    fn find_by_display_matches_any_name_form() {
        let dir = directory();
        for query in ["samuel  huang", "黃金昇", "Samuel Huang 黃金昇"] {
            let found = find_by_display(&dir, query).expect("should resolve");
            assert_eq!(found.name, "黃金昇");
        }
        assert!(find_by_display(&dir, "samuel.huang").is_none());
        assert!(find_by_display(&dir, "   ").is_none());
    }

    #[test]
    fn resolve_prefers_local_name_and_valid_email() {
        let dir = directory();
        let r = resolve_approver(&dir, "SAMUEL HUANG");
        assert_eq!(r.name, "黃金昇");
        assert_eq!(r.email.as_deref(), Some("samuel.huang@hotel.example"));

        let r = resolve_approver(&dir, "alice");
        assert_eq!(r.name, "Alice");

        let r = resolve_approver(&dir, "陳美玲");
        assert_eq!(r.email, None, "addresses without @ are dropped");
    }

    #[test]
    fn unresolved_name_falls_back_to_raw_text() {
        let r = resolve_approver(&directory(), "  Night   Manager ");
        assert_eq!(r.name, "Night Manager");
        assert_eq!(r.email, None);
    }

    #[test]
    fn identity_keys_expand_from_email_prefix() {
        let keys = IdentityKeys::for_login("samuel.huang", &directory());
        assert!(keys.matches("Samuel Huang"));
        assert!(keys.matches("黃金昇"));
        assert!(keys.matches("samuel huang 黃金昇"));
        assert!(keys.matches("SAMUEL.HUANG"));
        assert!(!keys.matches("Alice"));
    }

    #[test]
    fn identity_keys_expand_from_legal_name() {
        let keys = IdentityKeys::for_login("黃金昇", &directory());
        assert!(keys.matches("samuel.huang"));
        assert!(keys.matches("Samuel Huang"));
    }

    #[test]
    fn unknown_login_only_matches_itself() {
        let keys = IdentityKeys::for_login("frontdesk", &directory());
        assert!(keys.matches("FrontDesk"));
        assert!(!keys.matches("Alice"));
        assert_eq!(keys.sorted(), vec!["frontdesk".to_string()]);
    }

    #[test]
    fn blank_login_has_no_keys() {
        let keys = IdentityKeys::for_login("  ", &directory());
        assert!(keys.is_empty());
        assert!(!keys.matches(""));
    }

    #[test]
    fn email_for_accepts_display_or_login_forms() {
        let dir = directory();
        assert_eq!(
            email_for(&dir, "samuel.huang").as_deref(),
            Some("samuel.huang@hotel.example")
        );
        assert_eq!(
            email_for(&dir, "Alice").as_deref(),
            Some("alice@hotel.example")
        );
        assert_eq!(email_for(&dir, "nobody"), None);
    }
}
