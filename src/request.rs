use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ScanError;

/// The scan triggers offered to the operator, in display order.
pub const SCAN_LABELS: [&str; 5] = ["Fast Scan", "Version Scan", "Full Scan", "OS Scan", "Exploits"];

/// Scan strategy forwarded to the backend as `scan_type`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Fast,
    Version,
    Full,
    Os,
    Exploits,
}

impl ScanType {
    pub const ALL: [ScanType; 5] = [
        ScanType::Fast,
        ScanType::Version,
        ScanType::Full,
        ScanType::Os,
        ScanType::Exploits,
    ];

    /// Wire value, as the backend expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            ScanType::Fast => "fast",
            ScanType::Version => "version",
            ScanType::Full => "full",
            ScanType::Os => "os",
            ScanType::Exploits => "exploits",
        }
    }

    /// Derive the mode from a trigger label: its first word, lower-cased.
    pub fn from_label(label: &str) -> Option<ScanType> {
        mode_key(label).parse().ok()
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScanType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ScanError::UnknownMode(s.to_string()))
    }
}

/// Body of `POST /scan`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub scan_type: ScanType,
}

/// Build the request for `target` from a trigger label such as "Full Scan".
///
/// The target is passed through untouched; validation happens in the controller.
pub fn build_request(target: &str, label: &str) -> Result<ScanRequest, ScanError> {
    let scan_type =
        ScanType::from_label(label).ok_or_else(|| ScanError::UnknownMode(label.to_string()))?;
    Ok(ScanRequest {
        target: target.to_string(),
        scan_type,
    })
}

fn mode_key(label: &str) -> String {
    label
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
