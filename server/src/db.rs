use crate::models::{NewVideoRecord, VideoRecord};
use sqlx::sqlite::SqliteRow;
use sqlx::{query, Row, SqlitePool};

pub async fn initialize_database(pool: SqlitePool) -> Result<(), sqlx::Error> {
    let create = r#"
        CREATE TABLE IF NOT EXISTS videos (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            public_id TEXT NOT NULL,
            original_size TEXT NOT NULL,
            compressed_size TEXT NOT NULL,
            duration REAL NOT NULL DEFAULT 0,
            url TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
    "#;

    query(create).execute(&pool).await?;

    Ok(())
}

fn row_to_record(row: &SqliteRow) -> VideoRecord {
    VideoRecord {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        public_id: row.get("public_id"),
        original_size: row.get("original_size"),
        compressed_size: row.get("compressed_size"),
        duration: row.get("duration"),
        url: row.get("url"),
        created_at: row.get("created_at"),
    }
}

pub async fn insert_video(
    pool: SqlitePool,
    record: &NewVideoRecord,
) -> Result<VideoRecord, sqlx::Error> {
    let q = r#"
        INSERT INTO videos (title, description, public_id, original_size, compressed_size, duration, url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#;

    let result = query(q)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.public_id)
        .bind(&record.original_size)
        .bind(&record.compressed_size)
        .bind(record.duration)
        .bind(&record.url)
        .execute(&pool)
        .await?;

    let id = result.last_insert_rowid();
    let row = query("SELECT * FROM videos WHERE id = ?1")
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok(row_to_record(&row))
}

// no ORDER BY: callers get store order, matching the listing contract
pub async fn list_videos(pool: SqlitePool) -> Result<Vec<VideoRecord>, sqlx::Error> {
    let rows = query("SELECT * FROM videos").fetch_all(&pool).await?;
    Ok(rows.iter().map(row_to_record).collect())
}
