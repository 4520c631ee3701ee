use sqlx::{sqlite::SqliteRow, Row};

use fleetline_core::domain::notification::AdminUser;

use super::quotation::parse_uuid;
use super::{AdminDirectory, RepositoryError};
use crate::DbPool;

pub struct SqlAdminDirectory {
    pool: DbPool,
}

impl SqlAdminDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdminDirectory for SqlAdminDirectory {
    async fn insert(&self, admin: &AdminUser) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO admin_users (id, email, first_name, last_name, role)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(admin.id.to_string())
        .bind(&admin.email)
        .bind(admin.first_name.as_deref())
        .bind(admin.last_name.as_deref())
        .bind(&admin.role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, email, first_name, last_name, role
             FROM admin_users
             WHERE LOWER(role) = 'admin'
             ORDER BY email ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(admin_from_row).collect()
    }
}

fn admin_from_row(row: &SqliteRow) -> Result<AdminUser, RepositoryError> {
    Ok(AdminUser {
        id: parse_uuid("id", row.try_get("id")?)?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        role: row.try_get("role")?,
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use fleetline_core::domain::notification::AdminUser;

    use super::SqlAdminDirectory;
    use crate::migrations;
    use crate::repositories::AdminDirectory;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn admin(email: &str, role: &str) -> AdminUser {
        AdminUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn admin_role_matching_is_case_insensitive() {
        let pool = setup_pool().await;
        let directory = SqlAdminDirectory::new(pool.clone());

        directory.insert(&admin("upper@fleetline.example", "ADMIN")).await.expect("insert");
        directory.insert(&admin("lower@fleetline.example", "admin")).await.expect("insert");
        directory.insert(&admin("driver@fleetline.example", "driver")).await.expect("insert");

        let admins = directory.list_admins().await.expect("list admins");

        assert_eq!(admins.len(), 2);
        assert!(admins.iter().all(|a| a.role.eq_ignore_ascii_case("admin")));

        pool.close().await;
    }
}
