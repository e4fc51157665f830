//! Product-level verdict aggregation.

use crate::models::{ClassifiedIngredient, HalalStatus};

/// Reduces per-ingredient statuses to one product status.
///
/// `Avoid` if any is `Avoid`, else `Caution` if any is `Caution`, else `OK`
/// if every one is `OK`, else `Unknown`. An empty list is `Unknown`: no
/// ingredients means no evidence either way.
pub fn overall_status(ingredients: &[ClassifiedIngredient]) -> HalalStatus {
    if ingredients.is_empty() {
        return HalalStatus::Unknown;
    }
    if ingredients.iter().any(|i| i.status == HalalStatus::Avoid) {
        HalalStatus::Avoid
    } else if ingredients.iter().any(|i| i.status == HalalStatus::Caution) {
        HalalStatus::Caution
    } else if ingredients.iter().all(|i| i.status == HalalStatus::Ok) {
        HalalStatus::Ok
    } else {
        HalalStatus::Unknown
    }
}
