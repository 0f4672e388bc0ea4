use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a vulnerability, lowest to highest.
///
/// The labels are the Portuguese strings the product has always used; they
/// are also the wire and storage representation, so the serde names carry
/// their accents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Baixa,
    #[serde(rename = "Média")]
    Media,
    Alta,
    #[serde(rename = "Crítica")]
    Critica,
}

impl Severity {
    /// All severities, lowest to highest. Useful for zero-filled buckets.
    pub const ALL: [Severity; 4] = [
        Severity::Baixa,
        Severity::Media,
        Severity::Alta,
        Severity::Critica,
    ];

    /// The display/storage label for this severity.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Baixa => "Baixa",
            Severity::Media => "Média",
            Severity::Alta => "Alta",
            Severity::Critica => "Crítica",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Severity {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Baixa" => Ok(Severity::Baixa),
            "Média" => Ok(Severity::Media),
            "Alta" => Ok(Severity::Alta),
            "Crítica" => Ok(Severity::Critica),
            other => Err(format!("invalid severity: {other}")),
        }
    }
}

/// One matched vulnerability template, embedded in a [`Scan`].
///
/// Not independently addressable: vulnerabilities exist only inside the scan
/// that matched them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Short type label, e.g. "XSS" or "SQL Injection".
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub severity: Severity,
    /// Portuguese description of the finding.
    pub description: String,
}

/// One completed assessment run against a [`Site`](crate::Site).
///
/// Immutable once written. The report is the generated free-text summary
/// returned by the text-generation client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub id: String,
    pub site_id: String,
    /// Milliseconds since the UNIX epoch, assigned by the store at persist
    /// time.
    pub timestamp: u64,
    pub vulnerabilities: Vec<Vulnerability>,
    pub report: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_labels_round_trip() {
        for sev in Severity::ALL {
            assert_eq!(Severity::try_from(sev.as_str()), Ok(sev));
        }
        assert!(Severity::try_from("Urgente").is_err());
    }

    #[test]
    fn severity_serializes_as_portuguese_label() {
        assert_eq!(
            serde_json::to_value(Severity::Media).unwrap(),
            serde_json::json!("Média")
        );
        assert_eq!(
            serde_json::to_value(Severity::Critica).unwrap(),
            serde_json::json!("Crítica")
        );
        let parsed: Severity = serde_json::from_str("\"Alta\"").unwrap();
        assert_eq!(parsed, Severity::Alta);
    }

    #[test]
    fn severity_ordering_is_lowest_to_highest() {
        assert!(Severity::Baixa < Severity::Media);
        assert!(Severity::Media < Severity::Alta);
        assert!(Severity::Alta < Severity::Critica);
    }

    #[test]
    fn scan_wire_format_is_camel_case() {
        let scan = Scan {
            id: "scan-1".into(),
            site_id: "site-1".into(),
            timestamp: 1_700_000_000_000,
            vulnerabilities: vec![Vulnerability {
                vuln_type: "XSS".into(),
                severity: Severity::Alta,
                description: "desc".into(),
            }],
            report: "relatório".into(),
        };

        let json = serde_json::to_value(&scan).unwrap();
        assert_eq!(json["siteId"], "site-1");
        assert_eq!(json["vulnerabilities"][0]["type"], "XSS");
        assert_eq!(json["vulnerabilities"][0]["severity"], "Alta");
    }
}
