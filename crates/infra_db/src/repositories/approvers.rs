//! User roles and approver relationships

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for roles and approver assignments
#[derive(Debug, Clone)]
pub struct ApproverRepository {
    pool: PgPool,
}

impl ApproverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether `approver` is an admin or is assigned to approve for `staff`
    pub async fn may_approve(&self, approver: Uuid, staff: Uuid) -> Result<bool, DatabaseError> {
        let allowed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_roles WHERE user_id = $1 AND role = 'admin'
            ) OR EXISTS (
                SELECT 1 FROM approver_assignments WHERE approver_id = $1 AND staff_id = $2
            )
            "#,
        )
        .bind(approver)
        .bind(staff)
        .fetch_one(&self.pool)
        .await?;
        Ok(allowed)
    }

    /// Role names held by a user
    pub async fn roles_of(&self, user_id: Uuid) -> Result<Vec<String>, DatabaseError> {
        let roles = sqlx::query_scalar::<_, String>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Grants a role; granting twice is a no-op
    pub async fn grant_role(&self, user_id: Uuid, role: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Assigns `approver` to decide on claims of `staff`
    pub async fn assign(&self, approver: Uuid, staff: Uuid) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO approver_assignments (approver_id, staff_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(approver)
        .bind(staff)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
