//! User repository for database operations

use sqlx::postgres::PgExecutor;

use crate::db::postgres::models::UserRow;
use crate::models::NewUser;

/// Insert a user and return the stored row
pub async fn insert<'e, E>(executor: E, user: &NewUser) -> Result<UserRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (first_name, last_name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, first_name, last_name, email, password_hash, created_at, updated_at
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .fetch_one(executor)
    .await
}

/// Find user by primary key
pub async fn find_by_id<'e, E>(executor: E, id: i32) -> Result<Option<UserRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, first_name, last_name, email, password_hash, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Find user by email (unique)
pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<UserRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, first_name, last_name, email, password_hash, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}
