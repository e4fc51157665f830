//! Curated keyword data driving the pipeline.
//!
//! The anchor token, stop tokens, generic-term exclusions, and the ordered
//! keyword rules all live in a [`Lexicon`] so they can be curated from the
//! `[pipeline.lexicon]` config section without a code change. The
//! [`Default`] impl carries the built-in lists.

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::models::HalalStatus;

/// One ordered keyword rule: if the lower-cased candidate contains any of
/// `keywords`, it gets `status` and `description`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub status: HalalStatus,
    pub description: String,
}

impl KeywordRule {
    fn new(keywords: &[&str], status: HalalStatus, description: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            status,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Token that opens the ingredients declaration.
    pub anchor: String,
    /// Tokens that close the ingredients declaration.
    pub stop_tokens: Vec<String>,
    /// Names too generic to be worth curating.
    pub generic_terms: Vec<String>,
    /// Rules checked in order; first match wins.
    pub rules: Vec<KeywordRule>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            anchor: "ingredients".to_string(),
            stop_tokens: [
                "phenylketonurics",
                "warning",
                "use by",
                "allergy",
                "contains",
                "store",
                "best before",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            generic_terms: [
                "vitamins",
                "minerals",
                "spices",
                "spice",
                "flavour",
                "flavor",
                "flavouring",
                "flavoring",
                "natural flavour",
                "natural flavor",
                "seasoning",
                "colour",
                "color",
                "emulsifier",
                "emulsifiers",
                "preservative",
                "preservatives",
                "stabiliser",
                "stabilizer",
                "thickener",
                "acidity regulator",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            rules: vec![
                KeywordRule::new(
                    &["pork", "bacon", "lard", "swine"],
                    HalalStatus::Avoid,
                    "Contains swine or swine-derived products.",
                ),
                KeywordRule::new(
                    &["alcohol", "wine", "rum", "beer"],
                    HalalStatus::Avoid,
                    "Contains intoxicants.",
                ),
                KeywordRule::new(
                    &["blood", "carrion", "dead meat"],
                    HalalStatus::Avoid,
                    "Contains blood or dead animals not slaughtered Islamically.",
                ),
                KeywordRule::new(
                    &["gelatin"],
                    HalalStatus::Caution,
                    "Gelatin may be derived from haram sources.",
                ),
                KeywordRule::new(
                    &["beef", "chicken", "meat", "duck", "lamb", "animal fat"],
                    HalalStatus::Caution,
                    "Contains meat; halal status depends on slaughter method.",
                ),
            ],
        }
    }
}

impl Lexicon {
    /// Lower-cases every list so matching can compare against lower-cased
    /// candidates directly.
    pub fn normalized(mut self) -> Self {
        self.anchor = self.anchor.trim().to_lowercase();
        for token in self.stop_tokens.iter_mut().chain(self.generic_terms.iter_mut()) {
            *token = token.trim().to_lowercase();
        }
        self.stop_tokens.retain(|t| !t.is_empty());
        self.generic_terms.retain(|t| !t.is_empty());
        for rule in &mut self.rules {
            for kw in &mut rule.keywords {
                *kw = kw.trim().to_lowercase();
            }
            rule.keywords.retain(|k| !k.is_empty());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.anchor.trim().is_empty() {
            bail!("pipeline.lexicon.anchor must not be empty");
        }
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                bail!("pipeline.lexicon.rules[{}] must have at least one keyword", i);
            }
            if rule.status == HalalStatus::Unknown {
                bail!(
                    "pipeline.lexicon.rules[{}] must assign OK, Caution, or Avoid",
                    i
                );
            }
        }
        Ok(())
    }

    pub fn is_generic(&self, name: &str) -> bool {
        self.generic_terms.iter().any(|t| t == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lexicon_is_valid() {
        Lexicon::default().validate().unwrap();
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let lex: Lexicon = serde_json::from_str(r#"{"anchor": "Zutaten"}"#).unwrap();
        let lex = lex.normalized();
        assert_eq!(lex.anchor, "zutaten");
        assert_eq!(lex.rules.len(), 5);
        assert!(lex.stop_tokens.contains(&"best before".to_string()));
    }

    #[test]
    fn test_unknown_rule_status_rejected() {
        let lex: Lexicon = serde_json::from_str(
            r#"{"rules": [{"keywords": ["x"], "status": "Unknown", "description": ""}]}"#,
        )
        .unwrap();
        assert!(lex.validate().is_err());
    }

    #[test]
    fn test_generic_terms_are_exact() {
        let lex = Lexicon::default();
        assert!(lex.is_generic("spices"));
        assert!(!lex.is_generic("mixed spices extract"));
        assert!(!lex.is_generic("sugar"));
    }
}
