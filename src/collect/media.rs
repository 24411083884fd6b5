use std::convert::TryFrom;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use log::info;
use rusqlite::{Connection, OpenFlags};

use crate::models::{MediaRecord, DURATION_NONE};

/// Read-only handle on the platform's unified media index.
pub struct MediaIndex {
    path: PathBuf,
}

impl MediaIndex {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List every row of the index as a normalized record.
    ///
    /// The platform may rewrite the index between calls, so the database is
    /// opened fresh each time. Rows come back in index order.
    pub fn list(&self) -> Result<Vec<MediaRecord>> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open media index {}", self.path.display()))?;

        let mut stmt = conn.prepare(
            "SELECT display_name, date_added, size, width, height, duration_ms
             FROM media_files
             ORDER BY rowid",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<i64>>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (display_name, date_added, size, width, height, duration_ms) =
                row.context("failed to read media index row")?;

            let date_created = DateTime::from_timestamp(date_added, 0).ok_or_else(|| {
                anyhow!("media row '{display_name}' has out-of-range date_added {date_added}")
            })?;
            let file_size = to_u64(size, "size")
                .with_context(|| format!("media row '{display_name}' is malformed"))?;

            records.push(MediaRecord {
                file_name: display_name,
                date_created,
                file_size,
                dimensions: match (width, height) {
                    (Some(width), Some(height)) => Some(format!("{width} x {height}")),
                    _ => None,
                },
                duration: match duration_ms {
                    Some(ms) => format_duration_ms(ms),
                    None => DURATION_NONE.to_string(),
                },
            });
        }

        info!("Media index listed {} records", records.len());
        Ok(records)
    }
}

fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} is negative ({value})"))
}

/// Render a millisecond duration for display: `M:SS`, growing to `H:MM:SS`
/// past an hour. Sub-second remainders are truncated.
fn format_duration_ms(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{create_media_index, insert_media_file};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn list_normalizes_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media.db");
        let conn = create_media_index(&path).unwrap();

        let taken = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        insert_media_file(&conn, "beach.jpg", taken, 2_412_044, Some((1920, 1080)), None).unwrap();
        insert_media_file(&conn, "scan.jpg", taken, 118_221, None, None).unwrap();
        insert_media_file(
            &conn,
            "birthday.mp4",
            taken,
            58_113_902,
            Some((1920, 1080)),
            Some(120_000),
        )
        .unwrap();
        drop(conn);

        let records = MediaIndex::new(path).list().unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].file_name, "beach.jpg");
        assert_eq!(records[0].dimensions.as_deref(), Some("1920 x 1080"));
        assert_eq!(records[0].duration, "N/A");
        assert_eq!(records[0].file_size, 2_412_044);
        assert_eq!(records[0].date_created, taken);
        assert!(!records[0].is_video());

        assert_eq!(records[1].file_name, "scan.jpg");
        assert_eq!(records[1].dimensions, None);

        assert_eq!(records[2].file_name, "birthday.mp4");
        assert_eq!(records[2].duration, "2:00");
        assert!(records[2].is_video());
    }

    #[test]
    fn indexes_without_an_id_column_list_in_row_order() {
        // Platform builds carry only the declared columns; ordering rests on
        // the implicit rowid.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE media_files (
                 display_name TEXT NOT NULL,
                 date_added INTEGER NOT NULL,
                 size INTEGER NOT NULL,
                 width INTEGER,
                 height INTEGER,
                 duration_ms INTEGER
             );
             INSERT INTO media_files VALUES ('first.jpg', 1715938200, 10, 640, 480, NULL);
             INSERT INTO media_files VALUES ('second.jpg', 1715938260, 20, NULL, NULL, NULL);",
        )
        .unwrap();
        drop(conn);

        let records = MediaIndex::new(path).list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_name, "first.jpg");
        assert_eq!(records[1].file_name, "second.jpg");
    }

    #[test]
    fn empty_index_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media.db");
        create_media_index(&path).unwrap();

        let records = MediaIndex::new(path).list().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_index_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = MediaIndex::new(dir.path().join("absent.db")).list();
        assert!(result.is_err());
    }

    #[test]
    fn durations_render_like_a_player() {
        assert_eq!(format_duration_ms(0), "0:00");
        assert_eq!(format_duration_ms(7_500), "0:07");
        assert_eq!(format_duration_ms(120_000), "2:00");
        assert_eq!(format_duration_ms(3_725_000), "1:02:05");
        assert_eq!(format_duration_ms(-42), "0:00");
    }
}
