//! Diesel row models for task persistence.

use super::schema::{code_locations, implementations, tasks};
use crate::task::ports::{CodeLocationRecord, ImplementationRecord, TaskRecord};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: i32,
    pub complexity: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: i32,
    pub complexity: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable task columns. `None` writes `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    pub title: String,
    pub description: Option<String>,
    pub priority: i32,
    pub complexity: i32,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRow> for TaskRecord {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            priority: row.priority,
            complexity: row.complexity,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&TaskRecord> for NewTaskRow {
    fn from(record: &TaskRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            priority: record.priority,
            complexity: record.complexity,
            status: record.status.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<&TaskRecord> for TaskChangeset {
    fn from(record: &TaskRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            priority: record.priority,
            complexity: record.complexity,
            status: record.status.clone(),
            updated_at: record.updated_at,
        }
    }
}

/// Query result row for code locations.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = code_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CodeLocationRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_path: String,
    pub start_line: i32,
    pub end_line: Option<i32>,
    pub branch_name: Option<String>,
    pub commit_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert model for code locations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = code_locations)]
pub struct NewCodeLocationRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_path: String,
    pub start_line: i32,
    pub end_line: Option<i32>,
    pub branch_name: Option<String>,
    pub commit_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mutable code location columns. `None` writes `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = code_locations)]
#[diesel(treat_none_as_null = true)]
pub struct CodeLocationChangeset {
    pub task_id: Uuid,
    pub file_path: String,
    pub start_line: i32,
    pub end_line: Option<i32>,
    pub branch_name: Option<String>,
    pub commit_ref: Option<String>,
}

impl From<CodeLocationRow> for CodeLocationRecord {
    fn from(row: CodeLocationRow) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            file_path: row.file_path,
            start_line: row.start_line,
            end_line: row.end_line,
            branch_name: row.branch_name,
            commit_ref: row.commit_ref,
            created_at: row.created_at,
        }
    }
}

impl From<&CodeLocationRecord> for NewCodeLocationRow {
    fn from(record: &CodeLocationRecord) -> Self {
        Self {
            id: record.id,
            task_id: record.task_id,
            file_path: record.file_path.clone(),
            start_line: record.start_line,
            end_line: record.end_line,
            branch_name: record.branch_name.clone(),
            commit_ref: record.commit_ref.clone(),
            created_at: record.created_at,
        }
    }
}

impl From<&CodeLocationRecord> for CodeLocationChangeset {
    fn from(record: &CodeLocationRecord) -> Self {
        Self {
            task_id: record.task_id,
            file_path: record.file_path.clone(),
            start_line: record.start_line,
            end_line: record.end_line,
            branch_name: record.branch_name.clone(),
            commit_ref: record.commit_ref.clone(),
        }
    }
}

/// Query result row for implementations.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = implementations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImplementationRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub pattern_type: String,
    pub pattern_data: String,
    pub success_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Insert model for implementations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = implementations)]
pub struct NewImplementationRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub pattern_type: String,
    pub pattern_data: String,
    pub success_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Mutable implementation columns. `None` writes `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = implementations)]
#[diesel(treat_none_as_null = true)]
pub struct ImplementationChangeset {
    pub pattern_type: String,
    pub pattern_data: String,
    pub success_rating: Option<f64>,
}

impl From<ImplementationRow> for ImplementationRecord {
    fn from(row: ImplementationRow) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            pattern_type: row.pattern_type,
            pattern_data: row.pattern_data,
            success_rating: row.success_rating,
            created_at: row.created_at,
        }
    }
}

impl From<&ImplementationRecord> for NewImplementationRow {
    fn from(record: &ImplementationRecord) -> Self {
        Self {
            id: record.id,
            task_id: record.task_id,
            pattern_type: record.pattern_type.clone(),
            pattern_data: record.pattern_data.clone(),
            success_rating: record.success_rating,
            created_at: record.created_at,
        }
    }
}

impl From<&ImplementationRecord> for ImplementationChangeset {
    fn from(record: &ImplementationRecord) -> Self {
        Self {
            pattern_type: record.pattern_type.clone(),
            pattern_data: record.pattern_data.clone(),
            success_rating: record.success_rating,
        }
    }
}
