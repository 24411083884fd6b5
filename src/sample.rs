//! Canned platform indexes.
//!
//! The real media and contacts indexes belong to the platform; these
//! builders exist so the tool can be exercised end to end on a machine that
//! has none. The `demo` subcommand seeds them and the tests build fixtures
//! through the same helpers, which keeps the fixture schema and the
//! collector queries in one place.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

/// Create (or reset) a media index at `path` and hand back the connection
/// for seeding.
pub fn create_media_index(path: &Path) -> Result<Connection> {
    let conn = open_index(path)?;
    conn.execute_batch(
        "DROP TABLE IF EXISTS media_files;
         CREATE TABLE media_files (
             display_name TEXT NOT NULL,
             date_added INTEGER NOT NULL,
             size INTEGER NOT NULL,
             width INTEGER,
             height INTEGER,
             duration_ms INTEGER
         );",
    )
    .context("failed to create media index schema")?;
    Ok(conn)
}

/// Insert one media row. `dimensions` is `(width, height)`; pass `None` for
/// rows the platform indexed without them. A `duration_ms` marks the row as
/// a video.
pub fn insert_media_file(
    conn: &Connection,
    display_name: &str,
    date_added: DateTime<Utc>,
    size: i64,
    dimensions: Option<(i64, i64)>,
    duration_ms: Option<i64>,
) -> Result<()> {
    let (width, height) = match dimensions {
        Some((width, height)) => (Some(width), Some(height)),
        None => (None, None),
    };
    conn.execute(
        "INSERT INTO media_files (display_name, date_added, size, width, height, duration_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            display_name,
            date_added.timestamp(),
            size,
            width,
            height,
            duration_ms
        ],
    )
    .with_context(|| format!("failed to insert media row '{display_name}'"))?;
    Ok(())
}

/// Create (or reset) a contacts index at `path` and hand back the
/// connection for seeding.
pub fn create_contacts_index(path: &Path) -> Result<Connection> {
    let conn = open_index(path)?;
    conn.execute_batch(
        "DROP TABLE IF EXISTS phone_numbers;
         DROP TABLE IF EXISTS contacts;
         CREATE TABLE contacts (
             id INTEGER PRIMARY KEY,
             display_name TEXT NOT NULL,
             has_phone_number INTEGER NOT NULL DEFAULT 0
         );
         CREATE TABLE phone_numbers (
             contact_id INTEGER NOT NULL,
             number TEXT NOT NULL
         );",
    )
    .context("failed to create contacts index schema")?;
    Ok(conn)
}

/// Insert one contact and its numbers. The `has_phone_number` flag is
/// stored as given even when it disagrees with `numbers`, because the real
/// index contains such rows and the collector has to cope with them.
pub fn insert_contact(
    conn: &Connection,
    id: i64,
    display_name: &str,
    has_phone_number: bool,
    numbers: &[&str],
) -> Result<()> {
    conn.execute(
        "INSERT INTO contacts (id, display_name, has_phone_number) VALUES (?1, ?2, ?3)",
        params![id, display_name, has_phone_number],
    )
    .with_context(|| format!("failed to insert contact '{display_name}'"))?;
    for number in numbers {
        conn.execute(
            "INSERT INTO phone_numbers (contact_id, number) VALUES (?1, ?2)",
            params![id, number],
        )
        .with_context(|| format!("failed to insert phone number for contact {id}"))?;
    }
    Ok(())
}

/// Seed both demo indexes with a small predictable data set: four images
/// (two at 1920 x 1080, one at 640 x 480, one without dimensions), one
/// two-minute video, and three contacts of which one has two numbers.
pub fn seed_demo_indexes(media_path: &Path, contacts_path: &Path) -> Result<()> {
    let conn = create_media_index(media_path)?;
    let base = Utc::now() - Duration::days(30);
    insert_media_file(&conn, "beach.jpg", base, 2_412_044, Some((1920, 1080)), None)?;
    insert_media_file(
        &conn,
        "sunset.jpg",
        base + Duration::days(1),
        1_988_310,
        Some((1920, 1080)),
        None,
    )?;
    insert_media_file(
        &conn,
        "receipt.png",
        base + Duration::days(2),
        240_583,
        Some((640, 480)),
        None,
    )?;
    insert_media_file(&conn, "scan.jpg", base + Duration::days(3), 118_221, None, None)?;
    insert_media_file(
        &conn,
        "birthday.mp4",
        base + Duration::days(4),
        58_113_902,
        Some((1920, 1080)),
        Some(120_000),
    )?;

    let conn = create_contacts_index(contacts_path)?;
    insert_contact(&conn, 1, "Alice Chen", true, &["415-555-0100", "415-555-0199"])?;
    insert_contact(&conn, 2, "Bob Singh", true, &["650-555-0123"])?;
    insert_contact(&conn, 3, "Dana Cruz", false, &[])?;

    Ok(())
}

fn open_index(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create index directory {}", parent.display()))?;
    }
    Connection::open(path).with_context(|| format!("failed to open index {}", path.display()))
}
