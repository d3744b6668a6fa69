//! Playlist repository for database operations

use sqlx::postgres::PgExecutor;

use crate::db::postgres::models::{PlaylistPairRow, PlaylistRow};

/// Insert a playlist row and return it
pub async fn insert<'e, E>(
    executor: E,
    name: &str,
    owner_email: &str,
    user_id: i32,
) -> Result<PlaylistRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PlaylistRow>(
        r#"
        INSERT INTO playlists (name, owner_email, user_id)
        VALUES ($1, $2, $3)
        RETURNING id, name, owner_email, user_id, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(owner_email)
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Find playlist by ID
pub async fn find_by_id<'e, E>(executor: E, id: i32) -> Result<Option<PlaylistRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PlaylistRow>(
        r#"
        SELECT id, name, owner_email, user_id, created_at, updated_at
        FROM playlists
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Find playlist by ID and lock the row for the rest of the transaction
pub async fn find_by_id_for_update<'e, E>(
    executor: E,
    id: i32,
) -> Result<Option<PlaylistRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PlaylistRow>(
        r#"
        SELECT id, name, owner_email, user_id, created_at, updated_at
        FROM playlists
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// List `(id, name)` for every playlist a user owns
pub async fn list_pairs_by_user<'e, E>(
    executor: E,
    user_id: i32,
) -> Result<Vec<PlaylistPairRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PlaylistPairRow>(
        r#"
        SELECT id, name
        FROM playlists
        WHERE user_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// List all playlists
pub async fn list_all<'e, E>(executor: E) -> Result<Vec<PlaylistRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PlaylistRow>(
        r#"
        SELECT id, name, owner_email, user_id, created_at, updated_at
        FROM playlists
        ORDER BY id ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Rename a playlist
pub async fn update_name<'e, E>(
    executor: E,
    id: i32,
    name: &str,
) -> Result<PlaylistRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PlaylistRow>(
        r#"
        UPDATE playlists SET
            name = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, owner_email, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_one(executor)
    .await
}

/// Delete a playlist row
pub async fn delete<'e, E>(executor: E, id: i32) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
