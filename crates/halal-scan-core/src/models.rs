//! Core data models used throughout Halal Scan.
//!
//! These types represent the candidates, verdicts, and curated reference
//! entries that flow through the classification pipeline.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Halal status of a single ingredient or a whole product.
///
/// Serialized exactly as `"OK"`, `"Caution"`, `"Avoid"`, `"Unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HalalStatus {
    #[serde(rename = "OK")]
    Ok,
    Caution,
    Avoid,
    Unknown,
}

impl HalalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HalalStatus::Ok => "OK",
            HalalStatus::Caution => "Caution",
            HalalStatus::Avoid => "Avoid",
            HalalStatus::Unknown => "Unknown",
        }
    }

    /// Whether this status may be stored on a curated reference entry.
    ///
    /// Reference entries are always decided; `Unknown` is reserved for
    /// pipeline output and candidate entries.
    pub fn is_curated(&self) -> bool {
        !matches!(self, HalalStatus::Unknown)
    }
}

impl fmt::Display for HalalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for HalalStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Ok(HalalStatus::Ok),
            "caution" => Ok(HalalStatus::Caution),
            "avoid" => Ok(HalalStatus::Avoid),
            "unknown" => Ok(HalalStatus::Unknown),
            other => anyhow::bail!(
                "invalid halal status '{}': must be OK, Caution, Avoid, or Unknown",
                other
            ),
        }
    }
}

/// A normalized, lower-cased ingredient name pulled out of label text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientCandidate {
    pub name: String,
    /// `true` when the name came from inside a parenthesized group, i.e. it
    /// is a sub-ingredient of a compound ingredient.
    pub nested: bool,
}

impl IngredientCandidate {
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: false,
        }
    }

    pub fn nested(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: true,
        }
    }
}

/// A curated ingredient from the reference store.
///
/// Names are meant to be unique but the store does not enforce it; the
/// matcher tolerates duplicates by taking the first hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceIngredient {
    pub name: String,
    /// Food additive code such as `E471`.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub category: String,
    pub status: HalalStatus,
    #[serde(default)]
    pub description: String,
}

/// Per-candidate pipeline output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedIngredient {
    pub name: String,
    pub status: HalalStatus,
    pub description: String,
}

/// Final output of one classification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVerdict {
    pub ingredients: Vec<ClassifiedIngredient>,
    #[serde(rename = "overallStatus")]
    pub overall_status: HalalStatus,
}

/// A newly observed ingredient name awaiting human curation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateEntry {
    pub name: String,
    pub status: HalalStatus,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl CandidateEntry {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HalalStatus::Unknown,
            source: source.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_to_wire_names() {
        let json = serde_json::to_string(&[
            HalalStatus::Ok,
            HalalStatus::Caution,
            HalalStatus::Avoid,
            HalalStatus::Unknown,
        ])
        .unwrap();
        assert_eq!(json, r#"["OK","Caution","Avoid","Unknown"]"#);
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("ok".parse::<HalalStatus>().unwrap(), HalalStatus::Ok);
        assert_eq!(" AVOID ".parse::<HalalStatus>().unwrap(), HalalStatus::Avoid);
        assert!("haram".parse::<HalalStatus>().is_err());
    }

    #[test]
    fn test_verdict_uses_camel_case_overall_status() {
        let verdict = ProductVerdict {
            ingredients: vec![],
            overall_status: HalalStatus::Unknown,
        };
        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(value["overallStatus"], "Unknown");
    }
}
