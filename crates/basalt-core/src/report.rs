//! Check report model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed check report, as delivered back by the execution engine.
///
/// Reports arrive as JSON over the result ingestion surface. Producers are
/// not under our control, so every field defaults and the time fields accept
/// both string and numeric encodings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub check_id: String,

    #[serde(default)]
    pub checktype_name: String,

    #[serde(default)]
    pub checktype_version: String,

    /// Final check status as reported by the engine (e.g. `FINISHED`).
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub target: String,

    #[serde(default, with = "flexible_time")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default, with = "flexible_time")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

/// A single finding inside a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub summary: String,

    /// CVSS-style score in `[0.0, 10.0]`.
    #[serde(default)]
    pub score: f32,

    #[serde(default)]
    pub affected_resource: String,

    #[serde(default)]
    pub fingerprint: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub details: String,

    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default)]
    pub references: Vec<String>,
}

impl Vulnerability {
    /// Severity bucket derived from the score.
    pub fn severity(&self) -> Severity {
        Severity::from_score(self.score)
    }
}

/// Severity buckets for findings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Bucket a CVSS-style score.
    pub fn from_score(score: f32) -> Self {
        match score {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s >= 0.1 => Severity::Low,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serde helper for report time fields.
///
/// Accepts RFC 3339 text, `YYYY-MM-DD HH:MM:SS[.frac]` text (assumed UTC) or
/// Unix seconds; serializes back as RFC 3339.
mod flexible_time {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Text(String),
        Seconds(i64),
    }

    pub fn serialize<S>(time: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Encoded>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Encoded::Seconds(secs)) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {secs}"))),
            Some(Encoded::Text(s)) => parse_text(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }

    fn parse_text(s: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Ok(t.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(t.and_utc());
            }
        }
        Err(format!("unrecognized time {s:?}"))
    }
}
