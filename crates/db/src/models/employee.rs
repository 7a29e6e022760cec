//! Employee directory model.

use portal_core::identity::DirectoryEntry;
use portal_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `employees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub english_name: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub department_1: String,
    pub team: String,
    pub job_title: String,
    pub employee_id: String,
    pub extension_number: String,
}

impl Employee {
    pub fn entry(&self) -> DirectoryEntry {
        DirectoryEntry {
            english_name: self.english_name.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// DTO for adding a directory row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEmployee {
    pub english_name: String,
    pub name: String,
    pub email: String,
    pub department: String,
    #[serde(default)]
    pub department_1: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default)]
    pub extension_number: String,
}
