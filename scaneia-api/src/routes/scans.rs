// ---------------------------------------------------------------------------
// Scan workflow routes
// ---------------------------------------------------------------------------
//
// Starting a scan spawns an engine task plus a relay task per scan. The
// relay applies progress to the tracked entry and, on completion, persists
// the Scan document in one transaction. A failure anywhere marks the
// tracked scan failed and persists nothing — a retry is a fresh attempt
// with a new identifier.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use scaneia_scan::{ScanEngine, ScanEvent};
use scaneia_types::{LogLevel, Scan};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::routes::sites::fetch_owned_site;
use crate::state::{AppState, ScanStatus, TrackedScan, now_ms};

/// The one generic message every scan failure collapses to.
pub const SCAN_FAILED: &str =
    "Ocorreu um erro durante a varredura. Por favor, tente novamente.";

// ---------------------------------------------------------------------------
// POST /api/scans — start a scan
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanRequest {
    pub site_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanResponse {
    pub scan_id: String,
    pub status: String,
}

pub async fn start_scan(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<StartScanRequest>,
) -> Result<(StatusCode, Json<StartScanResponse>), ApiError> {
    // The tracked entry needs an address before any document exists, and the
    // start log entry carries it too.
    let scan_id = format!("scan-{}", uuid::Uuid::new_v4());

    let site = {
        let store = state.store.lock().await;
        let site = fetch_owned_site(&store, &req.site_id, &session.user.id)?;
        store
            .append_log(
                &session.user.id,
                LogLevel::Info,
                &format!("Varredura iniciada para o site {}", site.url),
                Some(&scan_id),
                now_ms(),
            )
            .ok();
        site
    };

    let started_at = now_ms();

    let tracked = TrackedScan {
        scan_id: scan_id.clone(),
        site_id: site.id.clone(),
        owner_id: session.user.id.clone(),
        status: ScanStatus::Running,
        progress: 0,
        phase: scaneia_scan::progress_phase(0),
        started_at,
        finished_at: None,
    };
    state.scans.write().await.insert(scan_id.clone(), tracked);

    // Spawn the engine task
    let (tx, rx) = mpsc::channel(64);
    let generator = state.generator.clone();
    let engine_config = state.engine.clone();
    let site_url = site.url.clone();
    tokio::spawn(async move {
        if let Err(e) =
            ScanEngine::run_streaming(&engine_config, &site_url, generator.as_ref(), tx.clone())
                .await
        {
            warn!(error = %e, "scan engine error");
            let _ = tx.send(ScanEvent::Error(e.to_string())).await;
        }
    });

    // Spawn the relay task
    let state_for_relay = state.clone();
    let scan_id_for_relay = scan_id.clone();
    let site_id_for_relay = site.id.clone();
    let owner_id_for_relay = session.user.id.clone();
    tokio::spawn(async move {
        relay_scan_events(
            rx,
            state_for_relay,
            scan_id_for_relay,
            site_id_for_relay,
            owner_id_for_relay,
        )
        .await;
    });

    info!(scan_id = %scan_id, site_id = %site.id, "scan started");

    Ok((
        StatusCode::CREATED,
        Json(StartScanResponse {
            scan_id,
            status: "running".into(),
        }),
    ))
}

async fn relay_scan_events(
    mut rx: mpsc::Receiver<ScanEvent>,
    state: Arc<AppState>,
    scan_id: String,
    site_id: String,
    owner_id: String,
) {
    while let Some(event) = rx.recv().await {
        match event {
            ScanEvent::Progress { percent, phase } => {
                let mut scans = state.scans.write().await;
                if let Some(tracked) = scans.get_mut(&scan_id) {
                    tracked.progress = percent;
                    tracked.phase = phase;
                }
            }
            ScanEvent::Complete {
                vulnerabilities,
                report,
            } => {
                let timestamp = now_ms();
                let findings = vulnerabilities.len();
                let scan = Scan {
                    id: scan_id.clone(),
                    site_id: site_id.clone(),
                    timestamp,
                    vulnerabilities,
                    report,
                };

                let saved = {
                    let store = state.store.lock().await;
                    let result = store.save_scan(&scan);
                    match &result {
                        Ok(()) => {
                            store
                                .append_log(
                                    &owner_id,
                                    LogLevel::Info,
                                    &format!(
                                        "Varredura concluída: {findings} vulnerabilidade(s) encontrada(s)"
                                    ),
                                    Some(&scan_id),
                                    timestamp,
                                )
                                .ok();
                        }
                        Err(_) => {
                            store
                                .append_log(
                                    &owner_id,
                                    LogLevel::Error,
                                    "Falha na varredura: não foi possível salvar o resultado",
                                    Some(&scan_id),
                                    now_ms(),
                                )
                                .ok();
                        }
                    }
                    result
                };

                let mut scans = state.scans.write().await;
                if let Some(tracked) = scans.get_mut(&scan_id) {
                    tracked.finished_at = Some(now_ms());
                    match saved {
                        Ok(()) => {
                            tracked.status = ScanStatus::Completed;
                            tracked.progress = 100;
                        }
                        Err(ref e) => {
                            warn!(error = %e, scan_id = %scan_id, "failed to persist scan");
                            tracked.status = ScanStatus::Failed(SCAN_FAILED.into());
                        }
                    }
                }
            }
            ScanEvent::Error(msg) => {
                warn!(scan_id = %scan_id, error = %msg, "scan failed");
                {
                    let store = state.store.lock().await;
                    store
                        .append_log(
                            &owner_id,
                            LogLevel::Error,
                            &format!("Falha na varredura: {msg}"),
                            Some(&scan_id),
                            now_ms(),
                        )
                        .ok();
                }
                let mut scans = state.scans.write().await;
                if let Some(tracked) = scans.get_mut(&scan_id) {
                    tracked.status = ScanStatus::Failed(SCAN_FAILED.into());
                    tracked.finished_at = Some(now_ms());
                }
            }
        }
    }

    // If the channel closed while the scan was still Running, the engine
    // task dropped the sender without a terminal event. Mark as failed.
    let mut scans = state.scans.write().await;
    if let Some(tracked) = scans.get_mut(&scan_id)
        && matches!(tracked.status, ScanStatus::Running)
    {
        warn!(scan_id = %scan_id, "scan terminated unexpectedly");
        tracked.status = ScanStatus::Failed(SCAN_FAILED.into());
        tracked.finished_at = Some(now_ms());
    }
}

/// Maximum age (in seconds) of a finished scan before it is swept from memory.
const FINISHED_SCAN_TTL_SECS: u64 = 300;

/// Interval between background sweep runs.
const SWEEP_INTERVAL_SECS: u64 = 60;

/// Spawns a single background task that periodically removes completed/
/// failed scans older than `FINISHED_SCAN_TTL_SECS` from memory.
pub fn spawn_scan_sweep_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let now = now_ms();
            let mut scans = state.scans.write().await;
            scans.retain(|_id, tracked| {
                if matches!(tracked.status, ScanStatus::Running) {
                    return true;
                }
                match tracked.finished_at {
                    Some(finished) => {
                        let age_secs = now.saturating_sub(finished) / 1000;
                        age_secs < FINISHED_SCAN_TTL_SECS
                    }
                    None => true,
                }
            });
        }
    });
}

// ---------------------------------------------------------------------------
// GET /api/scans — list the caller's scans across all sites
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListScansQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummaryResponse {
    pub id: String,
    pub site_id: String,
    pub status: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vulnerabilities_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct ListScansResponse {
    pub scans: Vec<ScanSummaryResponse>,
    pub total: usize,
}

pub async fn list_scans(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Query(params): Query<ListScansQuery>,
) -> Result<Json<ListScansResponse>, ApiError> {
    const MAX_PAGE_SIZE: usize = 200;
    let limit = params.limit.unwrap_or(50).min(MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    let mut summaries = Vec::new();

    // Running and failed scans only exist in memory. Completed tracked
    // entries are skipped here: their document row is already in the store
    // by the time the status flips to Completed.
    {
        let scans = state.scans.read().await;
        for tracked in scans.values() {
            if tracked.owner_id != session.user.id {
                continue;
            }
            let status = match &tracked.status {
                ScanStatus::Running => "running",
                ScanStatus::Failed(_) => "failed",
                ScanStatus::Completed => continue,
            };
            summaries.push(ScanSummaryResponse {
                id: tracked.scan_id.clone(),
                site_id: tracked.site_id.clone(),
                status: status.into(),
                timestamp: tracked.started_at,
                site_url: None,
                vulnerabilities_count: None,
                progress: matches!(tracked.status, ScanStatus::Running)
                    .then_some(tracked.progress),
            });
        }
    }

    // Persisted scans: one join over the owner's sites.
    {
        let store = state.store.lock().await;
        for row in store.list_scans_for_owner(&session.user.id)? {
            summaries.push(ScanSummaryResponse {
                id: row.scan.id,
                site_id: row.scan.site_id,
                status: "completed".into(),
                timestamp: row.scan.timestamp,
                site_url: Some(row.site_url),
                vulnerabilities_count: Some(row.scan.vulnerabilities.len()),
                progress: None,
            });
        }
    }

    summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total = summaries.len();
    let page: Vec<_> = summaries.into_iter().skip(offset).take(limit).collect();

    Ok(Json(ListScansResponse { scans: page, total }))
}

// ---------------------------------------------------------------------------
// GET /api/scans/{id} — scan status or full result
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDetailResponse {
    pub scan_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    #[serde(flatten)]
    pub scan: Option<Scan>,
}

pub async fn get_scan(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Path(scan_id): Path<String>,
) -> Result<Json<ScanDetailResponse>, ApiError> {
    // In-memory state first: running and failed scans have no document row.
    {
        let scans = state.scans.read().await;
        if let Some(tracked) = scans.get(&scan_id) {
            if tracked.owner_id != session.user.id {
                return Err(ApiError::Forbidden("scan belongs to another account".into()));
            }
            match &tracked.status {
                ScanStatus::Running => {
                    return Ok(Json(ScanDetailResponse {
                        scan_id: tracked.scan_id.clone(),
                        status: "running".into(),
                        progress: Some(tracked.progress),
                        phase: Some(tracked.phase.to_string()),
                        error: None,
                        site_url: None,
                        scan: None,
                    }));
                }
                ScanStatus::Failed(msg) => {
                    return Ok(Json(ScanDetailResponse {
                        scan_id: tracked.scan_id.clone(),
                        status: "failed".into(),
                        progress: None,
                        phase: None,
                        error: Some(msg.clone()),
                        site_url: None,
                        scan: None,
                    }));
                }
                // Completed scans fall through to the store for the document.
                ScanStatus::Completed => {}
            }
        }
    }

    let store = state.store.lock().await;
    let scan = store
        .get_scan(&scan_id)?
        .ok_or_else(|| ApiError::NotFound(format!("scan not found: {scan_id}")))?;
    let site = fetch_owned_site(&store, &scan.site_id, &session.user.id)?;

    Ok(Json(ScanDetailResponse {
        scan_id: scan.id.clone(),
        status: "completed".into(),
        progress: None,
        phase: None,
        error: None,
        site_url: Some(site.url),
        scan: Some(scan),
    }))
}
