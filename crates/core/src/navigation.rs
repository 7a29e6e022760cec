//! Portal navigation tree and its permission filter.
//!
//! The tree is built once at startup and shared read-only; each request
//! filters it against the caller's permission flags.

use std::collections::HashMap;

use serde::Serialize;

use crate::roles::{PERM_ANNOUNCEMENTS, PERM_APPROVALS};

/// One entry of the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavNode {
    pub key: String,
    pub label: String,
    /// Flag required to see this node; `None` means visible to everyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavNode>,
}

impl NavNode {
    pub fn leaf(key: &str, label: &str, permission_key: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            permission_key: permission_key.map(str::to_string),
            children: Vec::new(),
        }
    }

    pub fn group(key: &str, label: &str, children: Vec<NavNode>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            permission_key: None,
            children,
        }
    }

    fn is_allowed(&self, is_admin: bool, permissions: &HashMap<String, bool>) -> bool {
        match &self.permission_key {
            None => true,
            Some(_) if is_admin => true,
            Some(key) => permissions.get(key).copied().unwrap_or(false),
        }
    }
}

/// Keep the nodes the caller may see.
///
/// A group survives if it is allowed itself and, when it has children, at
/// least one child survives.
pub fn filter_visible(
    nodes: &[NavNode],
    is_admin: bool,
    permissions: &HashMap<String, bool>,
) -> Vec<NavNode> {
    nodes
        .iter()
        .filter(|n| n.is_allowed(is_admin, permissions))
        .filter_map(|n| {
            if n.children.is_empty() {
                return Some(n.clone());
            }
            let children = filter_visible(&n.children, is_admin, permissions);
            (!children.is_empty()).then(|| NavNode {
                children,
                ..n.clone()
            })
        })
        .collect()
}

/// The navigation served by the portal.
pub fn default_tree() -> Vec<NavNode> {
    vec![
        NavNode::leaf("dashboard", "Dashboard", None),
        NavNode::group(
            "workflow",
            "Workflow",
            vec![
                NavNode::leaf("approvals", "Approvals", Some(PERM_APPROVALS)),
                NavNode::leaf("announcements", "Announcements", Some(PERM_ANNOUNCEMENTS)),
            ],
        ),
        NavNode::group(
            "admin",
            "Administration",
            vec![NavNode::leaf("approvals_maintenance", "Approval maintenance", Some("admin"))],
        ),
    ]
}
