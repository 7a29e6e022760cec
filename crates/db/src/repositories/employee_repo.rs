//! Repository for the `employees` directory.

use portal_core::identity::{combine_label, DirectoryEntry};
use sqlx::PgPool;

use crate::models::employee::{CreateEmployee, Employee};

const COLUMNS: &str = "id, english_name, name, email, department, department_1, team, \
                        job_title, employee_id, extension_number";

/// Read access to the employee directory.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert a directory row.
    pub async fn create(pool: &PgPool, input: &CreateEmployee) -> Result<Employee, sqlx::Error> {
        let query = format!(
            "INSERT INTO employees
                (english_name, name, email, department, department_1, team,
                 job_title, employee_id, extension_number)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(&input.english_name)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.department)
            .bind(&input.department_1)
            .bind(&input.team)
            .bind(&input.job_title)
            .bind(&input.employee_id)
            .bind(&input.extension_number)
            .fetch_one(pool)
            .await
    }

    /// Name and email columns of every row, in directory order.
    pub async fn directory_entries(pool: &PgPool) -> Result<Vec<DirectoryEntry>, sqlx::Error> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT english_name, name, email FROM employees ORDER BY id")
                .fetch_all(pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(english_name, name, email)| DirectoryEntry {
                english_name,
                name,
                email,
            })
            .collect())
    }

    /// Distinct non-blank primary and secondary departments, sorted.
    pub async fn list_departments(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT d FROM (
                SELECT TRIM(department) AS d FROM employees
                UNION
                SELECT TRIM(department_1) AS d FROM employees
             ) depts
             WHERE d <> ''
             ORDER BY d",
        )
        .fetch_all(pool)
        .await
    }

    /// Picker labels of everyone in `department` (primary or secondary),
    /// de-duplicated in order of first appearance.
    pub async fn names_by_department(
        pool: &PgPool,
        department: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT english_name, name FROM employees
             WHERE TRIM(department) = $1 OR TRIM(department_1) = $1
             ORDER BY id",
        )
        .bind(department.trim())
        .fetch_all(pool)
        .await?;

        let mut labels: Vec<String> = Vec::with_capacity(rows.len());
        for (english_name, name) in rows {
            let label = combine_label(&english_name, &name);
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        Ok(labels)
    }

    /// Case-insensitive substring search over names, contact, and org fields.
    ///
    /// `pattern` is an escaped `ILIKE` pattern.
    pub async fn search(
        pool: &PgPool,
        pattern: &str,
        limit: i64,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees
             WHERE department ILIKE $1
                OR department_1 ILIKE $1
                OR english_name ILIKE $1
                OR name ILIKE $1
                OR email ILIKE $1
                OR extension_number ILIKE $1
                OR team ILIKE $1
                OR job_title ILIKE $1
                OR employee_id ILIKE $1
             ORDER BY department, english_name, id
             LIMIT $2"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(pattern)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
