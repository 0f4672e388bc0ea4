use crate::error::DbError;

const SCHEMA_SQL: &str = r#"
-- Registered accounts (one row per user)
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    INTEGER NOT NULL
);

-- Bearer sessions (tokens are stored as SHA-256 hashes, never plaintext)
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

-- Monitored sites, each owned by exactly one user
CREATE TABLE IF NOT EXISTS sites (
    id          TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    url         TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sites_owner ON sites(owner_id);

-- Completed scans (full vulnerability list kept as JSON alongside
-- denormalized rows for aggregation queries)
CREATE TABLE IF NOT EXISTS scans (
    id                   TEXT PRIMARY KEY,
    site_id              TEXT NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    timestamp            INTEGER NOT NULL,
    report               TEXT NOT NULL,
    vulnerabilities_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scans_site ON scans(site_id);
CREATE INDEX IF NOT EXISTS idx_scans_timestamp ON scans(timestamp);

-- Per-finding rows (for severity buckets and type counts)
CREATE TABLE IF NOT EXISTS scan_vulnerabilities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id     TEXT NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
    vuln_type   TEXT NOT NULL,
    severity    TEXT NOT NULL,
    description TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scan_vulns_scan ON scan_vulnerabilities(scan_id);

-- Activity log entries. Messages can name the owner's sites, so every read
-- path filters by owner_id.
CREATE TABLE IF NOT EXISTS logs (
    id        TEXT PRIMARY KEY,
    owner_id  TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    level     TEXT NOT NULL,
    message   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);
"#;

pub fn initialize(conn: &rusqlite::Connection) -> Result<(), DbError> {
    // Set WAL mode and foreign keys BEFORE schema creation for crash safety
    // and foreign key enforcement during initial DDL.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA_SQL)?;

    // Safe migrations: link log entries to the scan that produced them, and
    // to the account whose activity they describe. Only swallow "duplicate
    // column name" errors; propagate other DB errors.
    for stmt in &[
        "ALTER TABLE logs ADD COLUMN scan_id TEXT",
        "ALTER TABLE logs ADD COLUMN owner_id TEXT NOT NULL DEFAULT ''",
    ] {
        if let Err(e) = conn.execute(stmt, []) {
            let msg = e.to_string();
            if !msg.contains("duplicate column name") {
                return Err(e.into());
            }
        }
    }

    // Indexes over migrated columns go here, after the column exists.
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_logs_owner ON logs(owner_id);")?;

    Ok(())
}
