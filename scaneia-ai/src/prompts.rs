//! The three fixed prompts and their fallback strings.
//!
//! URL analysis and log analysis collapse every failure into a fixed
//! Portuguese fallback string. Report generation instead propagates transport
//! failures so the scan workflow can abort without persisting anything.

use scaneia_types::{LogEntry, Vulnerability};
use tracing::warn;

use crate::client::TextGenerator;
use crate::error::AiError;

const URL_ANALYSIS_SYSTEM: &str = "Você é um especialista em segurança da informação. Analise o \
URL fornecido e identifique potenciais vulnerabilidades conhecidas ou riscos associados. Forneça \
uma descrição resumida em português dos riscos potenciais (máximo 150 palavras).";

const REPORT_SYSTEM: &str = "Você é um especialista em segurança da informação que escreve \
relatórios detalhados sobre vulnerabilidades encontradas em sites. Forneça um relatório \
estruturado e detalhado em português sobre as vulnerabilidades detectadas, incluindo \
recomendações específicas para mitigação.";

const LOG_ANALYSIS_SYSTEM: &str = "Você é um especialista em segurança da informação \
especializado em análise de logs. Analise os logs fornecidos e identifique padrões suspeitos ou \
indicadores de possíveis incidentes de segurança. Forneça um resumo em português dos achados.";

const URL_ANALYSIS_EMPTY: &str = "Não foi possível analisar o URL.";
const URL_ANALYSIS_FAILED: &str = "Ocorreu um erro ao analisar o URL. Tente novamente mais tarde.";
const REPORT_EMPTY: &str = "Não foi possível gerar o relatório.";
const LOG_ANALYSIS_EMPTY: &str = "Não foi possível analisar os logs.";
const LOG_ANALYSIS_FAILED: &str =
    "Ocorreu um erro ao analisar os logs. Tente novamente mais tarde.";

/// Summarize the risks of a URL (max ~150 words of Portuguese prose).
/// Never fails: any error resolves to a fixed fallback string.
pub async fn analyze_url(generator: &dyn TextGenerator, url: &str) -> String {
    let user = format!("Analise este URL: {url}");
    match generator.complete(URL_ANALYSIS_SYSTEM, &user, 300).await {
        Ok(text) => text,
        Err(AiError::EmptyCompletion) => URL_ANALYSIS_EMPTY.to_string(),
        Err(e) => {
            warn!(error = %e, url = %url, "URL analysis failed");
            URL_ANALYSIS_FAILED.to_string()
        }
    }
}

/// Generate the full vulnerability report for a completed scan.
///
/// Transport and endpoint failures are returned to the caller — the scan is
/// only persisted after a successful report, so the workflow must see them.
/// An empty completion still yields a (placeholder) report.
pub async fn generate_vulnerability_report(
    generator: &dyn TextGenerator,
    vulnerabilities: &[Vulnerability],
    url: &str,
) -> Result<String, AiError> {
    let serialized = serde_json::to_string(vulnerabilities)?;
    let user = format!(
        "Estas são as vulnerabilidades encontradas no site {url}:\n{serialized}\n\n\
         Gere um relatório detalhado com recomendações de mitigação."
    );
    match generator.complete(REPORT_SYSTEM, &user, 1000).await {
        Ok(text) => Ok(text),
        Err(AiError::EmptyCompletion) => Ok(REPORT_EMPTY.to_string()),
        Err(e) => Err(e),
    }
}

/// Summarize suspicious patterns across recent log entries.
/// Never fails: any error resolves to a fixed fallback string.
pub async fn analyze_logs(generator: &dyn TextGenerator, logs: &[LogEntry]) -> String {
    let serialized = match serde_json::to_string(logs) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "log serialization failed");
            return LOG_ANALYSIS_FAILED.to_string();
        }
    };
    let user = format!("Analise estes logs:\n{serialized}");
    match generator.complete(LOG_ANALYSIS_SYSTEM, &user, 500).await {
        Ok(text) => text,
        Err(AiError::EmptyCompletion) => LOG_ANALYSIS_EMPTY.to_string(),
        Err(e) => {
            warn!(error = %e, "log analysis failed");
            LOG_ANALYSIS_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scaneia_types::Severity;
    use std::sync::Mutex;

    enum Reply {
        Text(String),
        Empty,
        Status(u16),
    }

    struct MockGenerator {
        reply: Reply,
        calls: Mutex<Vec<(String, String, u32)>>,
    }

    impl MockGenerator {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        async fn complete(
            &self,
            system: &str,
            user: &str,
            max_tokens: u32,
        ) -> Result<String, AiError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string(), max_tokens));
            match &self.reply {
                Reply::Text(t) => Ok(t.clone()),
                Reply::Empty => Err(AiError::EmptyCompletion),
                Reply::Status(code) => Err(AiError::Status(*code)),
            }
        }
    }

    fn sample_vuln() -> Vulnerability {
        Vulnerability {
            vuln_type: "XSS".into(),
            severity: Severity::Alta,
            description: "desc".into(),
        }
    }

    #[tokio::test]
    async fn analyze_url_formats_prompt() {
        let generator = MockGenerator::new(Reply::Text("resumo".into()));
        let text = analyze_url(&generator, "https://example.com").await;
        assert_eq!(text, "resumo");

        let calls = generator.calls.lock().unwrap();
        let (system, user, max_tokens) = &calls[0];
        assert!(system.contains("especialista em segurança"));
        assert_eq!(user, "Analise este URL: https://example.com");
        assert_eq!(*max_tokens, 300);
    }

    #[tokio::test]
    async fn analyze_url_swallows_failures() {
        let generator = MockGenerator::new(Reply::Status(500));
        let text = analyze_url(&generator, "https://example.com").await;
        assert_eq!(text, URL_ANALYSIS_FAILED);

        let generator = MockGenerator::new(Reply::Empty);
        let text = analyze_url(&generator, "https://example.com").await;
        assert_eq!(text, URL_ANALYSIS_EMPTY);
    }

    #[tokio::test]
    async fn report_includes_serialized_vulnerabilities() {
        let generator = MockGenerator::new(Reply::Text("relatório".into()));
        let report =
            generate_vulnerability_report(&generator, &[sample_vuln()], "https://example.com")
                .await
                .unwrap();
        assert_eq!(report, "relatório");

        let calls = generator.calls.lock().unwrap();
        let (_, user, max_tokens) = &calls[0];
        assert!(user.contains("https://example.com"));
        assert!(user.contains("\"type\":\"XSS\""));
        assert!(user.contains("recomendações de mitigação"));
        assert_eq!(*max_tokens, 1000);
    }

    #[tokio::test]
    async fn report_propagates_transport_failure() {
        let generator = MockGenerator::new(Reply::Status(429));
        let err =
            generate_vulnerability_report(&generator, &[sample_vuln()], "https://example.com")
                .await
                .unwrap_err();
        assert!(matches!(err, AiError::Status(429)));
    }

    #[tokio::test]
    async fn report_empty_completion_falls_back() {
        let generator = MockGenerator::new(Reply::Empty);
        let report = generate_vulnerability_report(&generator, &[], "https://example.com")
            .await
            .unwrap();
        assert_eq!(report, REPORT_EMPTY);
    }

    #[tokio::test]
    async fn log_analysis_swallows_failures() {
        let generator = MockGenerator::new(Reply::Status(503));
        let text = analyze_logs(&generator, &[]).await;
        assert_eq!(text, LOG_ANALYSIS_FAILED);

        let generator = MockGenerator::new(Reply::Empty);
        let text = analyze_logs(&generator, &[]).await;
        assert_eq!(text, LOG_ANALYSIS_EMPTY);

        let generator = MockGenerator::new(Reply::Text("achados".into()));
        let text = analyze_logs(&generator, &[]).await;
        assert_eq!(text, "achados");
        assert_eq!(generator.calls.lock().unwrap()[0].2, 500);
    }
}
