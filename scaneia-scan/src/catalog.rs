// ---------------------------------------------------------------------------
// Bundled vulnerability template catalog
// ---------------------------------------------------------------------------
//
// The fixed set of vulnerability classes a simulated scan can report. The
// type labels, severities, and Portuguese descriptions are part of the
// product surface — they appear verbatim in scan results and reports.

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::IndexedRandom;
use scaneia_types::{Severity, Vulnerability};

/// Maximum number of findings a simulated scan can report.
pub const MAX_FINDINGS: usize = 3;

static CATALOG: LazyLock<Vec<Vulnerability>> = LazyLock::new(|| {
    vec![
        vuln(
            "XSS",
            Severity::Alta,
            "Vulnerabilidade Cross-Site Scripting (XSS) detectada em formulários de entrada",
        ),
        vuln(
            "SQL Injection",
            Severity::Alta,
            "Possível vulnerabilidade de injeção SQL em parâmetros de consulta",
        ),
        vuln(
            "Outdated SSL/TLS",
            Severity::Media,
            "Versões desatualizadas de SSL/TLS em uso",
        ),
        vuln(
            "Cross-Site Request Forgery (CSRF)",
            Severity::Media,
            "Proteção contra CSRF ausente em formulários críticos",
        ),
        vuln(
            "Information Disclosure",
            Severity::Baixa,
            "Divulgação de informações sensíveis em cabeçalhos HTTP",
        ),
        vuln(
            "Insecure Cookies",
            Severity::Baixa,
            "Cookies sem flags de segurança (HttpOnly, Secure)",
        ),
        vuln(
            "Missing HTTP Security Headers",
            Severity::Baixa,
            "Cabeçalhos de segurança HTTP ausentes (Content-Security-Policy, X-XSS-Protection)",
        ),
    ]
});

fn vuln(vuln_type: &str, severity: Severity, description: &str) -> Vulnerability {
    Vulnerability {
        vuln_type: vuln_type.to_string(),
        severity,
        description: description.to_string(),
    }
}

/// The fixed 7-template catalog.
pub fn vulnerability_catalog() -> &'static [Vulnerability] {
    &CATALOG
}

/// Draw a simulated result set: a uniform count in `0..=MAX_FINDINGS`
/// templates, sampled uniformly with replacement from the catalog.
pub fn sample_vulnerabilities<R: Rng + ?Sized>(rng: &mut R) -> Vec<Vulnerability> {
    let count = rng.random_range(0..=MAX_FINDINGS);
    (0..count)
        .filter_map(|_| vulnerability_catalog().choose(rng).cloned())
        .collect()
}
