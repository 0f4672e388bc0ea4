// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use scaneia_ai::TextGenerator;
use scaneia_db::AppStore;
use scaneia_scan::EngineConfig;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};

/// Status of a scan tracked by the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Running,
    Completed,
    Failed(String),
}

/// Transient record of a running or recently-finished scan. The durable Scan
/// document only exists once the report has been generated and persisted.
pub struct TrackedScan {
    pub scan_id: String,
    pub site_id: String,
    pub owner_id: String,
    pub status: ScanStatus,
    /// Cosmetic progress percentage (0–100).
    pub progress: u8,
    pub phase: &'static str,
    pub started_at: u64,
    pub finished_at: Option<u64>,
}

/// Global application state for the API server.
pub struct AppState {
    /// Persistent application database.
    pub store: Mutex<AppStore>,
    /// Currently tracked scans (running + recently finished in-memory).
    pub scans: RwLock<HashMap<String, TrackedScan>>,
    /// Text-generation client shared by all prompt paths.
    pub generator: Arc<dyn TextGenerator>,
    /// Timing of the simulated scan engine.
    pub engine: EngineConfig,
    /// Lifetime of a newly issued session.
    pub session_ttl: Duration,
    /// Server start time for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: AppStore,
        generator: Arc<dyn TextGenerator>,
        engine: EngineConfig,
        session_ttl: Duration,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            scans: RwLock::new(HashMap::new()),
            generator,
            engine,
            session_ttl,
            started_at: Instant::now(),
        }
    }

    /// An AppState over an in-memory database with a short simulated scan
    /// duration, for testing.
    pub fn new_in_memory(generator: Arc<dyn TextGenerator>) -> Self {
        let store = AppStore::open_in_memory().expect("failed to open in-memory database");
        let engine = EngineConfig {
            scan_duration: Duration::from_millis(100),
            tick: Duration::from_millis(20),
        };
        Self::new(store, generator, engine, Duration::from_secs(3600))
    }
}

/// Get the current timestamp in milliseconds since the UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Hash a plaintext session token to its stored form. Only hashes touch the
/// database, so a leaked table cannot be replayed as live credentials.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_token_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_token("abd"), hash);
    }
}
