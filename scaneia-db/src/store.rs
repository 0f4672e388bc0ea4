use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use scaneia_types::{LogEntry, LogLevel, Scan, Severity, Site, User, Vulnerability};
use tracing::debug;

use crate::error::DbError;
use crate::schema;

/// Persistent application database backed by SQLite.
///
/// Reads return `Ok(None)` for absent documents; writes surface the
/// underlying SQLite error unmodified inside [`DbError`].
pub struct AppStore {
    conn: Connection,
}

/// A user record together with its password hash, for authentication flows.
/// Never serialized — the hash must not leave the server.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A scan joined with the URL of the site it ran against.
#[derive(Debug, Clone)]
pub struct ScanWithSite {
    pub scan: Scan,
    pub site_url: String,
}

/// Vulnerability counts per severity bucket. All four keys are always
/// present in the serialized form, zero-filled when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeverityCounts {
    #[serde(rename = "Baixa")]
    pub baixa: u64,
    #[serde(rename = "Média")]
    pub media: u64,
    #[serde(rename = "Alta")]
    pub alta: u64,
    #[serde(rename = "Crítica")]
    pub critica: u64,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity, count: u64) {
        match severity {
            Severity::Baixa => self.baixa += count,
            Severity::Media => self.media += count,
            Severity::Alta => self.alta += count,
            Severity::Critica => self.critica += count,
        }
    }
}

/// Vulnerability count for one type label.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub count: u64,
}

/// One entry of the recent-scans slice on the reports page.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentScan {
    pub id: String,
    pub site_id: String,
    pub site_url: String,
    pub timestamp: u64,
    pub vulnerabilities_count: u64,
}

/// Aggregated statistics for one owner, computed with indexed joins
/// instead of one query per site.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStatistics {
    pub total_sites: u64,
    pub total_scans: u64,
    pub total_vulnerabilities: u64,
    pub vulnerabilities_by_severity: SeverityCounts,
    /// Top 5 vulnerability types, descending by count.
    pub vulnerabilities_by_type: Vec<TypeCount>,
    /// The 5 most recent scans, newest first.
    pub recent_scans: Vec<RecentScan>,
}

fn default_db_path() -> PathBuf {
    if cfg!(windows) {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("scaneia").join("scaneia.db")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".scaneia").join("scaneia.db")
    }
}

/// Map a UNIQUE violation on `users.email` to [`DbError::Conflict`]; every
/// other SQLite error passes through unchanged.
fn map_email_conflict(e: rusqlite::Error) -> DbError {
    if let rusqlite::Error::SqliteFailure(err, Some(ref msg)) = e
        && err.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.contains("users.email")
    {
        return DbError::Conflict("email already registered".into());
    }
    e.into()
}

impl AppStore {
    /// Open (or create) the database at the default location.
    pub fn open_default() -> Result<Self, DbError> {
        let path = default_db_path();
        Self::open(&path)
    }

    /// Open a database at a specific path.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Other(format!(
                    "failed to create db directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        debug!(path = %path.display(), "application database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Create a user account. A duplicate email surfaces as
    /// [`DbError::Conflict`].
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        now: u64,
    ) -> Result<User, DbError> {
        let id = format!("user-{}", uuid::Uuid::new_v4());
        self.conn
            .execute(
                "INSERT INTO users (id, name, email, password_hash, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, email, password_hash, now as i64],
            )
            .map_err(map_email_conflict)?;
        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, DbError> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up a user and password hash by email, for login.
    pub fn credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DbError> {
        let creds = self
            .conn
            .query_row(
                "SELECT id, name, email, created_at, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserCredentials {
                        user: user_from_row(row)?,
                        password_hash: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(creds)
    }

    /// The stored password hash for a user, for re-authentication before
    /// sensitive profile changes.
    pub fn password_hash(&self, user_id: &str) -> Result<Option<String>, DbError> {
        let hash = self
            .conn
            .query_row(
                "SELECT password_hash FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    pub fn update_user_name(&self, id: &str, name: &str) -> Result<bool, DbError> {
        let n = self
            .conn
            .execute("UPDATE users SET name = ?2 WHERE id = ?1", params![id, name])?;
        Ok(n > 0)
    }

    pub fn update_user_email(&self, id: &str, email: &str) -> Result<bool, DbError> {
        let n = self
            .conn
            .execute(
                "UPDATE users SET email = ?2 WHERE id = ?1",
                params![id, email],
            )
            .map_err(map_email_conflict)?;
        Ok(n > 0)
    }

    pub fn update_user_password(&self, id: &str, password_hash: &str) -> Result<bool, DbError> {
        let n = self.conn.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![id, password_hash],
        )?;
        Ok(n > 0)
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Record a session. Only the token's hash is stored; the plaintext
    /// token is returned to the client once and never persisted.
    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        now: u64,
        expires_at: u64,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![token_hash, user_id, now as i64, expires_at as i64],
        )?;
        Ok(())
    }

    /// Resolve a session token hash to its user, ignoring expired sessions.
    pub fn session_user(&self, token_hash: &str, now: u64) -> Result<Option<User>, DbError> {
        let user = self
            .conn
            .query_row(
                "SELECT u.id, u.name, u.email, u.created_at \
                 FROM sessions s JOIN users u ON s.user_id = u.id \
                 WHERE s.token_hash = ?1 AND s.expires_at > ?2",
                params![token_hash, now as i64],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool, DbError> {
        let n = self.conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash],
        )?;
        Ok(n > 0)
    }

    /// Remove expired sessions. Returns the number deleted.
    pub fn purge_expired_sessions(&self, now: u64) -> Result<usize, DbError> {
        let n = self.conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![now as i64],
        )?;
        Ok(n)
    }

    // -----------------------------------------------------------------------
    // Sites
    // -----------------------------------------------------------------------

    pub fn create_site(
        &self,
        owner_id: &str,
        url: &str,
        description: &str,
        now: u64,
    ) -> Result<Site, DbError> {
        let id = format!("site-{}", uuid::Uuid::new_v4());
        self.conn.execute(
            "INSERT INTO sites (id, owner_id, url, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, owner_id, url, description, now as i64],
        )?;
        Ok(Site {
            id,
            owner_id: owner_id.to_string(),
            url: url.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_site(&self, id: &str) -> Result<Option<Site>, DbError> {
        let site = self
            .conn
            .query_row(
                "SELECT id, owner_id, url, description, created_at, updated_at \
                 FROM sites WHERE id = ?1",
                params![id],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    /// All sites owned by one user, newest first.
    pub fn list_sites(&self, owner_id: &str) -> Result<Vec<Site>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, url, description, created_at, updated_at \
             FROM sites WHERE owner_id = ?1 ORDER BY created_at DESC",
        )?;
        let sites = stmt
            .query_map(params![owner_id], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    /// Update a site's URL and/or description; absent fields keep their
    /// current value. Bumps `updated_at`. Returns the updated record, or
    /// `None` if the site does not exist.
    pub fn update_site(
        &self,
        id: &str,
        url: Option<&str>,
        description: Option<&str>,
        now: u64,
    ) -> Result<Option<Site>, DbError> {
        let n = self.conn.execute(
            "UPDATE sites SET url = COALESCE(?2, url), \
             description = COALESCE(?3, description), updated_at = ?4 \
             WHERE id = ?1",
            params![id, url, description, now as i64],
        )?;
        if n == 0 {
            return Ok(None);
        }
        self.get_site(id)
    }

    /// Delete a site. Its scans (and their vulnerability rows) cascade.
    pub fn delete_site(&self, id: &str) -> Result<bool, DbError> {
        let n = self
            .conn
            .execute("DELETE FROM sites WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    /// Persist a completed scan: the document row plus one denormalized row
    /// per vulnerability, in a single transaction.
    pub fn save_scan(&self, scan: &Scan) -> Result<(), DbError> {
        let vulnerabilities_json = serde_json::to_string(&scan.vulnerabilities)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO scans (id, site_id, timestamp, report, vulnerabilities_json) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                scan.id,
                scan.site_id,
                scan.timestamp as i64,
                scan.report,
                vulnerabilities_json,
            ],
        )?;
        for vuln in &scan.vulnerabilities {
            tx.execute(
                "INSERT INTO scan_vulnerabilities (scan_id, vuln_type, severity, description) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![scan.id, vuln.vuln_type, vuln.severity.as_str(), vuln.description],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_scan(&self, id: &str) -> Result<Option<Scan>, DbError> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, site_id, timestamp, report, vulnerabilities_json \
                 FROM scans WHERE id = ?1",
                params![id],
                raw_scan_from_row,
            )
            .optional()?;
        raw.map(RawScan::into_scan).transpose()
    }

    /// Scan history for one site, newest first.
    pub fn list_scans_for_site(&self, site_id: &str) -> Result<Vec<Scan>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, timestamp, report, vulnerabilities_json \
             FROM scans WHERE site_id = ?1 ORDER BY timestamp DESC",
        )?;
        let raw = stmt
            .query_map(params![site_id], raw_scan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawScan::into_scan).collect()
    }

    /// All scans across one owner's sites, newest first, as a single join.
    pub fn list_scans_for_owner(&self, owner_id: &str) -> Result<Vec<ScanWithSite>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.site_id, s.timestamp, s.report, s.vulnerabilities_json, st.url \
             FROM scans s JOIN sites st ON s.site_id = st.id \
             WHERE st.owner_id = ?1 ORDER BY s.timestamp DESC",
        )?;
        let raw = stmt
            .query_map(params![owner_id], |row| {
                Ok((raw_scan_from_row(row)?, row.get::<_, String>(5)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(raw, site_url)| {
                Ok(ScanWithSite {
                    scan: raw.into_scan()?,
                    site_url,
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Compute the reports-page statistics for one owner.
    ///
    /// Each figure is one indexed join over the owner's sites; the reads are
    /// not wrapped in a transaction, so a write landing mid-computation can
    /// produce a slightly stale mix. That was always accepted behavior.
    pub fn owner_statistics(&self, owner_id: &str) -> Result<OwnerStatistics, DbError> {
        let total_sites: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sites WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        let total_scans: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scans s JOIN sites st ON s.site_id = st.id \
             WHERE st.owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;

        let mut vulnerabilities_by_severity = SeverityCounts::default();
        let mut total_vulnerabilities: u64 = 0;
        {
            let mut stmt = self.conn.prepare(
                "SELECT v.severity, COUNT(*) \
                 FROM scan_vulnerabilities v \
                 JOIN scans s ON v.scan_id = s.id \
                 JOIN sites st ON s.site_id = st.id \
                 WHERE st.owner_id = ?1 GROUP BY v.severity",
            )?;
            let rows = stmt
                .query_map(params![owner_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (label, count) in rows {
                let severity = Severity::try_from(label.as_str()).map_err(DbError::Other)?;
                vulnerabilities_by_severity.add(severity, count as u64);
                total_vulnerabilities += count as u64;
            }
        }

        let vulnerabilities_by_type = {
            let mut stmt = self.conn.prepare(
                "SELECT v.vuln_type, COUNT(*) AS n \
                 FROM scan_vulnerabilities v \
                 JOIN scans s ON v.scan_id = s.id \
                 JOIN sites st ON s.site_id = st.id \
                 WHERE st.owner_id = ?1 \
                 GROUP BY v.vuln_type ORDER BY n DESC, v.vuln_type ASC LIMIT 5",
            )?;
            stmt.query_map(params![owner_id], |row| {
                Ok(TypeCount {
                    vuln_type: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
        };

        let recent_scans = {
            let mut stmt = self.conn.prepare(
                "SELECT s.id, s.site_id, st.url, s.timestamp, \
                 (SELECT COUNT(*) FROM scan_vulnerabilities v WHERE v.scan_id = s.id) \
                 FROM scans s JOIN sites st ON s.site_id = st.id \
                 WHERE st.owner_id = ?1 ORDER BY s.timestamp DESC LIMIT 5",
            )?;
            stmt.query_map(params![owner_id], |row| {
                Ok(RecentScan {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    site_url: row.get(2)?,
                    timestamp: row.get::<_, i64>(3)? as u64,
                    vulnerabilities_count: row.get::<_, i64>(4)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
        };

        Ok(OwnerStatistics {
            total_sites: total_sites as u64,
            total_scans: total_scans as u64,
            total_vulnerabilities,
            vulnerabilities_by_severity,
            vulnerabilities_by_type,
            recent_scans,
        })
    }

    // -----------------------------------------------------------------------
    // Logs
    // -----------------------------------------------------------------------

    /// Append a log entry for one account. The owner is a scoping column
    /// only; it is not part of the serialized record.
    pub fn append_log(
        &self,
        owner_id: &str,
        level: LogLevel,
        message: &str,
        scan_id: Option<&str>,
        now: u64,
    ) -> Result<LogEntry, DbError> {
        let id = format!("log-{}", uuid::Uuid::new_v4());
        self.conn.execute(
            "INSERT INTO logs (id, owner_id, timestamp, level, message, scan_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, owner_id, now as i64, level.as_str(), message, scan_id],
        )?;
        Ok(LogEntry {
            id,
            timestamp: now,
            level,
            message: message.to_string(),
            scan_id: scan_id.map(str::to_string),
        })
    }

    /// The newest log entries for one account, up to `limit`. Log messages
    /// name the account's sites, so there is no unscoped read path.
    pub fn list_logs(&self, owner_id: &str, limit: usize) -> Result<Vec<LogEntry>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, level, message, scan_id FROM logs \
             WHERE owner_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
        )?;
        let raw = stmt
            .query_map(params![owner_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(id, timestamp, level, message, scan_id)| {
                Ok(LogEntry {
                    id,
                    timestamp: timestamp as u64,
                    level: LogLevel::try_from(level.as_str()).map_err(DbError::Other)?,
                    message,
                    scan_id,
                })
            })
            .collect()
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: row.get::<_, i64>(3)? as u64,
    })
}

fn site_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Site> {
    Ok(Site {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get::<_, i64>(4)? as u64,
        updated_at: row.get::<_, i64>(5)? as u64,
    })
}

/// A scan row before its vulnerability JSON has been parsed. Parsing happens
/// outside the rusqlite row closure so JSON errors map to [`DbError::Json`].
struct RawScan {
    id: String,
    site_id: String,
    timestamp: i64,
    report: String,
    vulnerabilities_json: String,
}

impl RawScan {
    fn into_scan(self) -> Result<Scan, DbError> {
        let vulnerabilities: Vec<Vulnerability> =
            serde_json::from_str(&self.vulnerabilities_json)?;
        Ok(Scan {
            id: self.id,
            site_id: self.site_id,
            timestamp: self.timestamp as u64,
            vulnerabilities,
            report: self.report,
        })
    }
}

fn raw_scan_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawScan> {
    Ok(RawScan {
        id: row.get(0)?,
        site_id: row.get(1)?,
        timestamp: row.get(2)?,
        report: row.get(3)?,
        vulnerabilities_json: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AppStore {
        AppStore::open_in_memory().unwrap()
    }

    fn seed_user(store: &AppStore) -> User {
        store
            .create_user("Ana", "ana@example.com", "hash", 1000)
            .unwrap()
    }

    fn seed_site(store: &AppStore, owner: &User, url: &str, now: u64) -> Site {
        store.create_site(&owner.id, url, "desc", now).unwrap()
    }

    fn vuln(vuln_type: &str, severity: Severity) -> Vulnerability {
        Vulnerability {
            vuln_type: vuln_type.into(),
            severity,
            description: "desc".into(),
        }
    }

    fn scan(id: &str, site_id: &str, timestamp: u64, vulns: Vec<Vulnerability>) -> Scan {
        Scan {
            id: id.into(),
            site_id: site_id.into(),
            timestamp,
            vulnerabilities: vulns,
            report: "relatório".into(),
        }
    }

    // --- Users ---

    #[test]
    fn create_and_get_user() {
        let store = store();
        let user = seed_user(&store);
        let loaded = store.get_user(&user.id).unwrap().unwrap();
        assert_eq!(loaded, user);
    }

    #[test]
    fn get_user_not_found() {
        let store = store();
        assert!(store.get_user("user-missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let store = store();
        seed_user(&store);
        let err = store
            .create_user("Outra", "ana@example.com", "hash2", 2000)
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn credentials_by_email_includes_hash() {
        let store = store();
        let user = seed_user(&store);
        let creds = store
            .credentials_by_email("ana@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "hash");
        assert!(store.credentials_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn update_email_conflicts_with_existing() {
        let store = store();
        seed_user(&store);
        let other = store
            .create_user("Bea", "bea@example.com", "hash", 1000)
            .unwrap();
        let err = store
            .update_user_email(&other.id, "ana@example.com")
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn update_name_and_password() {
        let store = store();
        let user = seed_user(&store);
        assert!(store.update_user_name(&user.id, "Ana Maria").unwrap());
        assert!(store.update_user_password(&user.id, "newhash").unwrap());
        assert_eq!(store.get_user(&user.id).unwrap().unwrap().name, "Ana Maria");
        assert_eq!(
            store.password_hash(&user.id).unwrap().unwrap(),
            "newhash"
        );
    }

    // --- Sessions ---

    #[test]
    fn session_round_trip_and_expiry() {
        let store = store();
        let user = seed_user(&store);
        store.create_session("th-1", &user.id, 1000, 2000).unwrap();

        let resolved = store.session_user("th-1", 1500).unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        // Expired at or past expires_at
        assert!(store.session_user("th-1", 2000).unwrap().is_none());
        assert!(store.session_user("th-unknown", 1500).unwrap().is_none());
    }

    #[test]
    fn delete_session_revokes() {
        let store = store();
        let user = seed_user(&store);
        store.create_session("th-1", &user.id, 1000, 9000).unwrap();
        assert!(store.delete_session("th-1").unwrap());
        assert!(!store.delete_session("th-1").unwrap());
        assert!(store.session_user("th-1", 1500).unwrap().is_none());
    }

    #[test]
    fn purge_expired_sessions_keeps_live_ones() {
        let store = store();
        let user = seed_user(&store);
        store.create_session("th-old", &user.id, 1000, 2000).unwrap();
        store.create_session("th-live", &user.id, 1000, 9000).unwrap();
        assert_eq!(store.purge_expired_sessions(5000).unwrap(), 1);
        assert!(store.session_user("th-live", 5000).unwrap().is_some());
    }

    // --- Sites ---

    #[test]
    fn list_sites_newest_first() {
        let store = store();
        let user = seed_user(&store);
        seed_site(&store, &user, "https://a.example.com", 1000);
        let newer = seed_site(&store, &user, "https://b.example.com", 2000);

        let sites = store.list_sites(&user.id).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].id, newer.id);
    }

    #[test]
    fn list_sites_scoped_to_owner() {
        let store = store();
        let user = seed_user(&store);
        let other = store
            .create_user("Bea", "bea@example.com", "hash", 1000)
            .unwrap();
        seed_site(&store, &user, "https://a.example.com", 1000);
        assert!(store.list_sites(&other.id).unwrap().is_empty());
    }

    #[test]
    fn update_site_partial_fields() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);

        let updated = store
            .update_site(&site.id, None, Some("nova descrição"), 2000)
            .unwrap()
            .unwrap();
        assert_eq!(updated.url, "https://a.example.com");
        assert_eq!(updated.description, "nova descrição");
        assert_eq!(updated.updated_at, 2000);
        assert_eq!(updated.created_at, 1000);

        assert!(store.update_site("site-missing", None, None, 2000).unwrap().is_none());
    }

    #[test]
    fn delete_site_cascades_to_scans() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);
        store
            .save_scan(&scan("scan-1", &site.id, 1500, vec![vuln("XSS", Severity::Alta)]))
            .unwrap();

        assert!(store.delete_site(&site.id).unwrap());
        assert!(store.get_scan("scan-1").unwrap().is_none());
        let stats = store.owner_statistics(&user.id).unwrap();
        assert_eq!(stats.total_vulnerabilities, 0);
    }

    // --- Scans ---

    #[test]
    fn save_and_get_scan() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);
        let saved = scan(
            "scan-1",
            &site.id,
            1500,
            vec![vuln("XSS", Severity::Alta), vuln("Insecure Cookies", Severity::Baixa)],
        );
        store.save_scan(&saved).unwrap();

        let loaded = store.get_scan("scan-1").unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(store.get_scan("scan-missing").unwrap().is_none());
    }

    #[test]
    fn list_scans_for_site_newest_first() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);
        store.save_scan(&scan("scan-1", &site.id, 1500, vec![])).unwrap();
        store.save_scan(&scan("scan-2", &site.id, 2500, vec![])).unwrap();

        let scans = store.list_scans_for_site(&site.id).unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].id, "scan-2");
    }

    #[test]
    fn list_scans_for_owner_joins_site_url() {
        let store = store();
        let user = seed_user(&store);
        let site_a = seed_site(&store, &user, "https://a.example.com", 1000);
        let site_b = seed_site(&store, &user, "https://b.example.com", 1000);
        store.save_scan(&scan("scan-1", &site_a.id, 1500, vec![])).unwrap();
        store.save_scan(&scan("scan-2", &site_b.id, 2500, vec![])).unwrap();

        let scans = store.list_scans_for_owner(&user.id).unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].scan.id, "scan-2");
        assert_eq!(scans[0].site_url, "https://b.example.com");
        assert_eq!(scans[1].site_url, "https://a.example.com");
    }

    // --- Statistics ---

    #[test]
    fn statistics_single_alta_vulnerability() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);
        store
            .save_scan(&scan("scan-1", &site.id, 1500, vec![vuln("XSS", Severity::Alta)]))
            .unwrap();

        let stats = store.owner_statistics(&user.id).unwrap();
        assert_eq!(stats.total_sites, 1);
        assert_eq!(stats.total_scans, 1);
        assert_eq!(stats.total_vulnerabilities, 1);
        assert_eq!(stats.vulnerabilities_by_severity.alta, 1);
        assert_eq!(stats.vulnerabilities_by_severity.baixa, 0);
        assert_eq!(stats.vulnerabilities_by_type.len(), 1);
        assert_eq!(stats.vulnerabilities_by_type[0].vuln_type, "XSS");
        assert_eq!(stats.recent_scans.len(), 1);
        assert_eq!(stats.recent_scans[0].site_url, "https://a.example.com");
        assert_eq!(stats.recent_scans[0].vulnerabilities_count, 1);
    }

    #[test]
    fn statistics_severity_buckets_serialize_all_four_keys() {
        let store = store();
        let user = seed_user(&store);
        let stats = store.owner_statistics(&user.id).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        for key in ["Baixa", "Média", "Alta", "Crítica"] {
            assert_eq!(json["vulnerabilitiesBySeverity"][key], 0, "missing {key}");
        }
        assert_eq!(json["totalSites"], 0);
    }

    #[test]
    fn statistics_top_types_descending_capped_at_five() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);

        let types = ["XSS", "SQL Injection", "CSRF", "Headers", "Cookies", "TLS"];
        let mut vulns = Vec::new();
        for (i, t) in types.iter().enumerate() {
            // type i appears i+1 times
            for _ in 0..=i {
                vulns.push(vuln(t, Severity::Baixa));
            }
        }
        store.save_scan(&scan("scan-1", &site.id, 1500, vulns)).unwrap();

        let stats = store.owner_statistics(&user.id).unwrap();
        assert_eq!(stats.vulnerabilities_by_type.len(), 5);
        assert_eq!(stats.vulnerabilities_by_type[0].vuln_type, "TLS");
        assert_eq!(stats.vulnerabilities_by_type[0].count, 6);
        // "XSS" (count 1) is the one cut off
        assert!(stats
            .vulnerabilities_by_type
            .iter()
            .all(|t| t.vuln_type != "XSS"));
    }

    #[test]
    fn statistics_recent_scans_capped_at_five() {
        let store = store();
        let user = seed_user(&store);
        let site = seed_site(&store, &user, "https://a.example.com", 1000);
        for i in 0..7 {
            store
                .save_scan(&scan(&format!("scan-{i}"), &site.id, 1000 + i, vec![]))
                .unwrap();
        }
        let stats = store.owner_statistics(&user.id).unwrap();
        assert_eq!(stats.recent_scans.len(), 5);
        assert_eq!(stats.recent_scans[0].id, "scan-6");
    }

    // --- Logs ---

    #[test]
    fn logs_newest_first_with_limit() {
        let store = store();
        let user = seed_user(&store);
        store
            .append_log(&user.id, LogLevel::Info, "primeiro", None, 1000)
            .unwrap();
        store
            .append_log(&user.id, LogLevel::Error, "segundo", Some("scan-1"), 2000)
            .unwrap();
        store
            .append_log(&user.id, LogLevel::Warning, "terceiro", None, 3000)
            .unwrap();

        let logs = store.list_logs(&user.id, 2).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "terceiro");
        assert_eq!(logs[1].level, LogLevel::Error);
        assert_eq!(logs[1].scan_id.as_deref(), Some("scan-1"));
    }

    #[test]
    fn logs_scoped_to_owner() {
        let store = store();
        let user = seed_user(&store);
        let other = store
            .create_user("Bea", "bea@example.com", "hash", 1000)
            .unwrap();
        store
            .append_log(
                &user.id,
                LogLevel::Info,
                "Varredura iniciada para o site https://a.example.com",
                None,
                1000,
            )
            .unwrap();

        assert!(store.list_logs(&other.id, 50).unwrap().is_empty());
        assert_eq!(store.list_logs(&user.id, 50).unwrap().len(), 1);
    }
}
