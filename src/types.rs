use serde::{de, Deserialize, Deserializer, Serialize};

/// Parsed body of a successful scan: every host the backend reported, in backend order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultModel {
    /// Target echoed back by the backend, when it sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub hosts: Vec<HostResult>,
}

/// One scanned host.
///
/// `os_detections` and `vulnerabilities` stay `None` when the backend omitted the key;
/// `None` means "not requested", which is not the same as an empty list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HostResult {
    pub ip: String,
    pub state: String,
    #[serde(default)]
    pub protocols: Vec<ProtocolResult>,
    #[serde(
        rename = "os_detection",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub os_detections: Option<Vec<OsGuess>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProtocolResult {
    pub name: String,
    #[serde(default)]
    pub ports: Vec<PortResult>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub port: u16,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OsGuess {
    pub name: String,
    /// Percentage in 0..=100.
    #[serde(deserialize_with = "accuracy_percent")]
    pub accuracy: u8,
}

impl ResultModel {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

/// nmap reports accuracy as a string ("98"); other backends send a number.
/// Both are accepted and clamped into 0..=100.
fn accuracy_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n as f64,
        Raw::Float(f) => f,
        Raw::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid accuracy: {s:?}")))?,
    };
    if value.is_nan() {
        return Err(de::Error::custom("invalid accuracy: NaN"));
    }
    Ok(value.clamp(0.0, 100.0).round() as u8)
}
