//! Fallback keyword rule classifier.
//!
//! Used for candidates with no reference match. Rules are checked in
//! lexicon order and the first one with a keyword contained in the
//! lower-cased name decides. The default order is:
//!
//! 1. swine products → `Avoid`
//! 2. intoxicants → `Avoid`
//! 3. blood / carrion → `Avoid`
//! 4. gelatin → `Caution`
//! 5. meat → `Caution`
//!
//! Order matters: `"beef gelatin"` hits rule 4 before rule 5.

use crate::lexicon::Lexicon;
use crate::models::{ClassifiedIngredient, HalalStatus};

pub fn classify_by_rules(name: &str, lexicon: &Lexicon) -> ClassifiedIngredient {
    let lowered = name.to_lowercase();
    let hit = lexicon
        .rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw.as_str())));

    match hit {
        Some(rule) => ClassifiedIngredient {
            name: name.to_string(),
            status: rule.status,
            description: rule.description.clone(),
        },
        None => ClassifiedIngredient {
            name: name.to_string(),
            status: HalalStatus::Unknown,
            description: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> ClassifiedIngredient {
        classify_by_rules(name, &Lexicon::default())
    }

    #[test]
    fn test_swine_rule() {
        let c = classify("pork lard");
        assert_eq!(c.status, HalalStatus::Avoid);
        assert_eq!(c.description, "Contains swine or swine-derived products.");
    }

    #[test]
    fn test_intoxicant_rule() {
        let c = classify("red wine vinegar");
        assert_eq!(c.status, HalalStatus::Avoid);
        assert_eq!(c.description, "Contains intoxicants.");
    }

    #[test]
    fn test_blood_rule() {
        let c = classify("dried blood plasma");
        assert_eq!(c.status, HalalStatus::Avoid);
        assert_eq!(
            c.description,
            "Contains blood or dead animals not slaughtered Islamically."
        );
    }

    #[test]
    fn test_beef_gelatin_hits_gelatin_before_meat() {
        let c = classify("beef gelatin");
        assert_eq!(c.status, HalalStatus::Caution);
        assert_eq!(c.description, "Gelatin may be derived from haram sources.");
    }

    #[test]
    fn test_meat_rule() {
        let c = classify("chicken stock");
        assert_eq!(c.status, HalalStatus::Caution);
        assert_eq!(
            c.description,
            "Contains meat; halal status depends on slaughter method."
        );
    }

    #[test]
    fn test_swine_beats_meat() {
        assert_eq!(classify("pork meat").status, HalalStatus::Avoid);
    }

    #[test]
    fn test_no_rule_is_unknown_with_empty_description() {
        let c = classify("sugar");
        assert_eq!(c.status, HalalStatus::Unknown);
        assert!(c.description.is_empty());
        assert_eq!(c.name, "sugar");
    }
}
