use super::types::Part;
use tracing::debug;

/// Lay stored answers over the current catalog.
///
/// The catalog decides the shape: item order, types, `extra` and options.
/// A stored item is matched by `(part, name)` and only contributes its
/// `value` and `active` flag. Stored items that no longer exist in the
/// catalog are dropped; catalog items without a stored match stay unset.
pub fn reconcile(stored: &[Part], catalog: Vec<Part>) -> Vec<Part> {
    let mut dropped = 0usize;
    let mut matched = 0usize;

    let mut parts = catalog;
    for part in &mut parts {
        for item in &mut part.items {
            let found = stored
                .iter()
                .flat_map(|p| &p.items)
                .find(|s| s.part == item.part && s.name == item.name);
            if let Some(saved) = found {
                item.value = saved.value.clone();
                item.active = saved.active;
                matched += 1;
            }
        }
    }

    for saved in stored.iter().flat_map(|p| &p.items) {
        let known = parts
            .iter()
            .flat_map(|p| &p.items)
            .any(|c| c.part == saved.part && c.name == saved.name);
        if !known {
            dropped += 1;
        }
    }

    debug!(matched, dropped, "reconciled stored grade against catalog");
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_default_parts, ItemType, ItemValue};

    #[test]
    fn test_answers_carry_over() {
        let mut stored = create_default_parts();
        stored[1].items[0].value = Some(ItemValue::Mark("half".to_string()));
        stored[1].items[0].active = true;

        let merged = reconcile(&stored, create_default_parts());
        assert_eq!(merged[1].items[0].value, Some(ItemValue::Mark("half".to_string())));
        assert!(merged[1].items[0].active);
        assert!(merged[0].items[0].value.is_none());
    }

    #[test]
    fn test_catalog_shape_wins() {
        let mut stored = create_default_parts();
        // An older template stored this question as binary.
        stored[0].items[1].kind = ItemType::Binary;
        stored[0].items[1].value = Some(ItemValue::Mark("full".to_string()));
        stored[0].items[1].active = true;

        let merged = reconcile(&stored, create_default_parts());
        assert_eq!(merged[0].items[1].kind, ItemType::TrafficLight);
        assert_eq!(merged[0].items[1].value, Some(ItemValue::Mark("full".to_string())));
    }

    #[test]
    fn test_unknown_stored_items_dropped() {
        let mut stored = create_default_parts();
        let mut ghost = stored[2].items[0].clone();
        ghost.name = "Retired question".to_string();
        ghost.active = true;
        stored[2].items.push(ghost);

        let merged = reconcile(&stored, create_default_parts());
        assert_eq!(merged[2].items.len(), create_default_parts()[2].items.len());
        assert!(merged[2].items.iter().all(|i| i.name != "Retired question"));
    }

    #[test]
    fn test_empty_stored_gives_fresh_catalog() {
        let merged = reconcile(&[], create_default_parts());
        assert_eq!(merged, create_default_parts());
    }
}
