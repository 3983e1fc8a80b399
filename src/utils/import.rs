use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, error, info};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total: usize,
    pub succeeded: usize,
    /// Table definitions left to the migrations
    pub skipped: usize,
}

/// Tables owned by the migrations, under both their current and legacy names.
const APP_TABLES: [&str; 7] = [
    "students",
    "teachers",
    "marks",
    "attendance_records",
    "attendancerecords",
    "leave_requests",
    "leaverequests",
];

/// Legacy dumps write to `AttendanceRecords` and `LeaveRequests`. These views
/// forward their inserts to the current tables for the duration of an import.
/// Column order follows the legacy tables so positional `INSERT ... VALUES`
/// rows line up.
const LEGACY_VIEWS: [&str; 4] = [
    r#"
    CREATE TEMP VIEW AttendanceRecords AS
        SELECT id, student_id, timestamp FROM attendance_records
    "#,
    r#"
    CREATE TEMP TRIGGER AttendanceRecords_insert
    INSTEAD OF INSERT ON AttendanceRecords
    BEGIN
        INSERT INTO attendance_records (id, student_id, timestamp, attend_date)
        VALUES (
            NEW.id,
            NEW.student_id,
            strftime('%Y-%m-%d %H:%M:%f', NEW.timestamp),
            date(NEW.timestamp)
        );
    END
    "#,
    r#"
    CREATE TEMP VIEW LeaveRequests AS
        SELECT id, student_id, start_date, end_date, reason, document_url, status
        FROM leave_requests
    "#,
    r#"
    CREATE TEMP TRIGGER LeaveRequests_insert
    INSTEAD OF INSERT ON LeaveRequests
    BEGIN
        INSERT INTO leave_requests
            (id, student_id, start_date, end_date, reason, document_url, status)
        VALUES (
            NEW.id,
            NEW.student_id,
            NEW.start_date,
            NEW.end_date,
            NEW.reason,
            NEW.document_url,
            COALESCE(NEW.status, 'Pending')
        );
    END
    "#,
];

/// Replays an exported `.sql` dump. Statements that fail are logged and skipped.
pub async fn import_sql_file(pool: &SqlitePool, path: &Path) -> Result<ImportReport> {
    let dump = std::fs::read_to_string(path)
        .with_context(|| format!("{} not found", path.display()))?;

    info!(path = %path.display(), "Importing data to database");
    let report = import_sql(pool, &dump).await?;
    info!(
        total = report.total,
        succeeded = report.succeeded,
        skipped = report.skipped,
        "Data import finished"
    );

    Ok(report)
}

/// Runs every statement on one connection so `BEGIN`/`COMMIT` pairs and the
/// temporary legacy views share a session.
pub async fn import_sql(pool: &SqlitePool, dump: &str) -> Result<ImportReport> {
    let statements: Vec<&str> = split_statements(dump).collect();
    let mut report = ImportReport {
        total: statements.len(),
        ..ImportReport::default()
    };

    let mut conn = pool.acquire().await.context("no connection for import")?;
    for sql in LEGACY_VIEWS {
        sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .context("failed to create legacy table views")?;
    }

    for (index, sql) in statements.iter().enumerate() {
        if creates_app_table(sql) {
            debug!(statement = index + 1, "Skipping table definition");
            report.skipped += 1;
            continue;
        }

        match sqlx::query(sql).execute(&mut *conn).await {
            Ok(_) => report.succeeded += 1,
            Err(e) => error!(error = %e, statement = index + 1, "Import statement failed"),
        }
    }

    // dumps usually switch foreign keys off; the connection goes back to the pool
    for sql in [
        "DROP TRIGGER IF EXISTS temp.AttendanceRecords_insert",
        "DROP VIEW IF EXISTS temp.AttendanceRecords",
        "DROP TRIGGER IF EXISTS temp.LeaveRequests_insert",
        "DROP VIEW IF EXISTS temp.LeaveRequests",
        "PRAGMA foreign_keys = ON",
    ] {
        sqlx::query(sql).execute(&mut *conn).await?;
    }

    Ok(report)
}

/// Dumps end each statement with `;` at end of line.
fn split_statements(dump: &str) -> impl Iterator<Item = &str> {
    dump.split(";\n")
        .map(str::trim)
        .map(|s| s.trim_end_matches(';').trim())
        .filter(|s| !s.is_empty())
}

/// `CREATE TABLE [IF NOT EXISTS] <name>` for one of the app's tables.
fn creates_app_table(sql: &str) -> bool {
    let mut words = sql.split_whitespace().map(str::to_ascii_lowercase);
    if words.next().as_deref() != Some("create") || words.next().as_deref() != Some("table") {
        return false;
    }

    let mut name = words.next().unwrap_or_default();
    if name == "if" {
        // IF NOT EXISTS
        name = words.nth(2).unwrap_or_default();
    }

    let name = name
        .split('(')
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| matches!(c, '"' | '`' | '[' | ']' | '\''));
    APP_TABLES.contains(&name)
}
