use std::time::Duration;

use rand::Rng;
use scaneia_ai::{AiError, TextGenerator, generate_vulnerability_report};
use scaneia_types::Vulnerability;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::info;

use crate::catalog::sample_vulnerabilities;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("report generation failed: {0}")]
    Report(#[from] AiError),
}

/// Event emitted during a simulated scan.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Cosmetic progress update, roughly once per tick.
    Progress { percent: u8, phase: &'static str },
    /// Terminal event on success: the sampled findings and their report.
    Complete {
        vulnerabilities: Vec<Vulnerability>,
        report: String,
    },
    /// Non-recoverable failure. Sent by the caller's wrapper task when
    /// [`ScanEngine::run_streaming`] returns an error.
    Error(String),
}

/// Timing of the simulated scan. The defaults match the product's original
/// behavior: a 5-second scan with a progress tick every second.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scan_duration: Duration,
    pub tick: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_duration: Duration::from_secs(5),
            tick: Duration::from_secs(1),
        }
    }
}

/// The progress phase string shown for a given percentage.
pub fn progress_phase(percent: u8) -> &'static str {
    match percent {
        0..=29 => "Iniciando varredura...",
        30..=59 => "Analisando a estrutura do site...",
        60..=89 => "Verificando vulnerabilidades conhecidas...",
        90..=99 => "Finalizando análise...",
        _ => "Gerando relatório...",
    }
}

pub struct ScanEngine;

impl ScanEngine {
    /// Run one simulated scan, emitting [`ScanEvent`]s as it goes.
    ///
    /// Progress is cosmetic: each tick adds a random 1–10, capped at 95
    /// until the scan duration elapses, then forced to 100. After the timer
    /// the engine samples findings from the catalog and requests the report;
    /// a report failure is returned without emitting `Complete`, so the
    /// caller never persists a partial scan.
    ///
    /// Events are sent best-effort — a dropped receiver doesn't fail the
    /// scan. On success the final event is always `Complete`.
    pub async fn run_streaming(
        config: &EngineConfig,
        site_url: &str,
        generator: &dyn TextGenerator,
        tx: mpsc::Sender<ScanEvent>,
    ) -> Result<(), EngineError> {
        let deadline = Instant::now() + config.scan_duration;
        let mut interval = tokio::time::interval(config.tick);
        interval.tick().await; // first tick fires immediately

        let mut percent: u8 = 0;
        while Instant::now() < deadline {
            interval.tick().await;
            let step = rand::rng().random_range(1..=10u8);
            percent = percent.saturating_add(step).min(95);
            let _ = tx
                .send(ScanEvent::Progress {
                    percent,
                    phase: progress_phase(percent),
                })
                .await;
        }

        percent = 100;
        let _ = tx
            .send(ScanEvent::Progress {
                percent,
                phase: progress_phase(percent),
            })
            .await;

        let vulnerabilities = sample_vulnerabilities(&mut rand::rng());
        info!(
            url = %site_url,
            findings = vulnerabilities.len(),
            "simulated scan finished, generating report"
        );

        let report = generate_vulnerability_report(generator, &vulnerabilities, site_url).await?;

        let _ = tx
            .send(ScanEvent::Complete {
                vulnerabilities,
                report,
            })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MAX_FINDINGS, vulnerability_catalog};
    use async_trait::async_trait;
    use rand::Rng;

    struct FixedGenerator {
        fail: bool,
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, AiError> {
            if self.fail {
                Err(AiError::Status(500))
            } else {
                Ok("relatório gerado".into())
            }
        }
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            scan_duration: Duration::from_millis(60),
            tick: Duration::from_millis(10),
        }
    }

    #[test]
    fn phases_match_percent_ranges() {
        assert_eq!(progress_phase(0), "Iniciando varredura...");
        assert_eq!(progress_phase(29), "Iniciando varredura...");
        assert_eq!(progress_phase(30), "Analisando a estrutura do site...");
        assert_eq!(progress_phase(60), "Verificando vulnerabilidades conhecidas...");
        assert_eq!(progress_phase(90), "Finalizando análise...");
        assert_eq!(progress_phase(100), "Gerando relatório...");
    }

    #[tokio::test]
    async fn run_emits_monotonic_progress_then_complete() {
        let (tx, mut rx) = mpsc::channel(64);
        let generator = FixedGenerator { fail: false };

        ScanEngine::run_streaming(&fast_config(), "https://example.com", &generator, tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        let mut last_percent = 0;
        let mut saw_complete = false;
        for event in &events {
            match event {
                ScanEvent::Progress { percent, phase } => {
                    assert!(!saw_complete, "progress after terminal event");
                    assert!(*percent >= last_percent);
                    assert!(*percent == 100 || *percent <= 95);
                    assert_eq!(*phase, progress_phase(*percent));
                    last_percent = *percent;
                }
                ScanEvent::Complete {
                    vulnerabilities,
                    report,
                } => {
                    saw_complete = true;
                    assert_eq!(last_percent, 100);
                    assert!(vulnerabilities.len() <= MAX_FINDINGS);
                    for vuln in vulnerabilities {
                        assert!(vulnerability_catalog().contains(vuln));
                    }
                    assert_eq!(report, "relatório gerado");
                }
                ScanEvent::Error(_) => panic!("unexpected error event"),
            }
        }
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn report_failure_emits_no_complete() {
        let (tx, mut rx) = mpsc::channel(64);
        let generator = FixedGenerator { fail: true };

        let err =
            ScanEngine::run_streaming(&fast_config(), "https://example.com", &generator, tx)
                .await
                .unwrap_err();
        assert!(matches!(err, EngineError::Report(AiError::Status(500))));

        while let Some(event) = rx.recv().await {
            assert!(
                !matches!(event, ScanEvent::Complete { .. }),
                "no complete event after a failed report"
            );
        }
    }

    #[test]
    fn sampling_count_is_inclusive_of_zero_and_three() {
        // The draw is 0..=3; spot-check the range against the RNG contract.
        let mut rng = rand::rng();
        for _ in 0..100 {
            let count: usize = rng.random_range(0..=MAX_FINDINGS);
            assert!(count <= 3);
        }
    }
}
