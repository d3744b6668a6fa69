//! Song repository for database operations
//!
//! Order is carried by `song_index`, which always equals the song's
//! position in the list it was written from.

use sqlx::postgres::{PgConnection, PgExecutor};

use crate::db::postgres::models::SongRow;
use crate::models::Song;

/// Insert songs for a playlist, tagging each with its position
pub async fn insert_all(
    conn: &mut PgConnection,
    playlist_id: i32,
    songs: &[Song],
) -> Result<(), sqlx::Error> {
    for (index, song) in songs.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO songs (playlist_id, title, artist, year, youtube_id, song_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(playlist_id)
        .bind(&song.title)
        .bind(&song.artist)
        .bind(song.year)
        .bind(&song.you_tube_id)
        .bind(index as i32)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Songs of one playlist in order
pub async fn list_by_playlist<'e, E>(
    executor: E,
    playlist_id: i32,
) -> Result<Vec<SongRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, SongRow>(
        r#"
        SELECT id, playlist_id, title, artist, year, youtube_id, song_index
        FROM songs
        WHERE playlist_id = $1
        ORDER BY song_index ASC
        "#,
    )
    .bind(playlist_id)
    .fetch_all(executor)
    .await
}

/// Songs of several playlists, grouped by playlist and ordered within each
pub async fn list_by_playlists<'e, E>(
    executor: E,
    playlist_ids: &[i32],
) -> Result<Vec<SongRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, SongRow>(
        r#"
        SELECT id, playlist_id, title, artist, year, youtube_id, song_index
        FROM songs
        WHERE playlist_id = ANY($1)
        ORDER BY playlist_id ASC, song_index ASC
        "#,
    )
    .bind(playlist_ids)
    .fetch_all(executor)
    .await
}

/// Remove every song of a playlist
pub async fn delete_by_playlist<'e, E>(executor: E, playlist_id: i32) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM songs WHERE playlist_id = $1")
        .bind(playlist_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
