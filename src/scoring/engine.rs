use super::config::{EmptyExtraPolicy, ScoringConfig};
use crate::catalog::{ExtraEntry, Item, ItemType, ItemValue, Mark, Part, SubAnswer};

#[derive(Debug, Clone)]
pub struct PartScore {
    pub title: String,
    /// Weighted score, 0..=part_weight
    pub score: f64,
    /// Items that contributed to the average
    pub counted: usize,
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct GradeBreakdown {
    pub parts: Vec<PartScore>,
    pub subtotal: f64,
    pub duatz_count: u32,
    pub penalty: f64,
    pub final_grade: f64,
}

/// Score one binary or traffic-light token. Anything outside the domain of
/// `kind` scores zero.
pub fn score_mark(kind: ItemType, token: &str) -> f64 {
    match (kind, Mark::from_token(token)) {
        (ItemType::Unknown, _) => 0.0,
        (_, Some(Mark::Full)) => 1.0,
        (ItemType::TrafficLight, Some(Mark::Half)) => 0.5,
        _ => 0.0,
    }
}

/// Score one item on a 0..=1 scale. `None` means the item is left out of its
/// part's average.
pub fn score_of(item: &Item, policy: EmptyExtraPolicy) -> Option<f64> {
    if !item.active {
        return None;
    }

    if item.extra.is_some() {
        match &item.value {
            Some(ItemValue::SubAnswers(answers)) => {
                let scores = sub_scores(item, answers);
                if scores.is_empty() {
                    return empty_extra_score(policy);
                }
                return Some(scores.iter().sum::<f64>() / scores.len() as f64);
            }
            None => return empty_extra_score(policy),
            // Any other shape falls through to the plain type rule
            Some(_) => {}
        }
    }

    let score = match (item.kind, &item.value) {
        (ItemType::Binary | ItemType::TrafficLight, Some(ItemValue::Mark(token))) => {
            score_mark(item.kind, token)
        }
        (ItemType::MultipleChoice, Some(ItemValue::Mark(choice))) => {
            if item.correct.as_deref() == Some(choice.as_str()) {
                1.0
            } else {
                0.0
            }
        }
        (ItemType::MultipleChoice, Some(ItemValue::Choices(selected))) => match &item.correct {
            Some(correct) if selected.iter().any(|c| c == correct) => 1.0,
            _ => 0.0,
        },
        _ => 0.0,
    };
    Some(score)
}

fn empty_extra_score(policy: EmptyExtraPolicy) -> Option<f64> {
    match policy {
        EmptyExtraPolicy::Zero => Some(0.0),
        EmptyExtraPolicy::Exclude => None,
    }
}

/// Flatten recorded sub-answers into one score per answered sub-check.
fn sub_scores(item: &Item, answers: &std::collections::BTreeMap<String, SubAnswer>) -> Vec<f64> {
    let mut scores = Vec::new();
    for (key, answer) in answers {
        match (item.find_extra(key), answer) {
            (Some(ExtraEntry::Single(sub)), SubAnswer::Mark(token)) => {
                scores.push(score_mark(sub.kind, token));
            }
            (Some(ExtraEntry::Group(group)), SubAnswer::Group(members)) => {
                for (member, token) in members {
                    let score = group
                        .items
                        .iter()
                        .find(|s| &s.key == member)
                        .map(|s| score_mark(s.kind, token))
                        .unwrap_or(0.0);
                    scores.push(score);
                }
            }
            // Unknown key or mismatched shape
            _ => scores.push(0.0),
        }
    }
    scores
}

/// Weighted score of one part: mean of contributing items times the part
/// weight, or zero when nothing contributes.
pub fn score_of_part(part: &Part, config: &ScoringConfig) -> f64 {
    let policy = config.empty_extra();
    let scores: Vec<f64> = part
        .items
        .iter()
        .filter_map(|item| score_of(item, policy))
        .collect();

    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64 * config.part_weight()
}

/// Sum of part scores minus the flat duatz penalty. Not clamped: the result
/// may fall below zero.
pub fn final_grade(parts: &[Part], duatz_count: u32, config: &ScoringConfig) -> f64 {
    let subtotal: f64 = parts.iter().map(|p| score_of_part(p, config)).sum();
    subtotal - duatz_count as f64 * config.duatz_penalty()
}

pub fn grade_breakdown(parts: &[Part], duatz_count: u32, config: &ScoringConfig) -> GradeBreakdown {
    let policy = config.empty_extra();
    let part_scores: Vec<PartScore> = parts
        .iter()
        .map(|part| PartScore {
            title: part.title.clone(),
            score: score_of_part(part, config),
            counted: part
                .items
                .iter()
                .filter(|i| score_of(i, policy).is_some())
                .count(),
            answered: part.items.iter().filter(|i| i.is_answered()).count(),
            total: part.items.len(),
        })
        .collect();

    let subtotal: f64 = part_scores.iter().map(|p| p.score).sum();
    let penalty = duatz_count as f64 * config.duatz_penalty();

    GradeBreakdown {
        parts: part_scores,
        subtotal,
        duatz_count,
        penalty,
        final_grade: subtotal - penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_default_parts, Category, SubGroup, SubItem};
    use std::collections::BTreeMap;

    const EPS: f64 = 1e-6;

    fn sample_item(kind: ItemType, value: Option<&str>, active: bool) -> Item {
        Item {
            name: "Question".to_string(),
            kind,
            value: value.map(|v| ItemValue::Mark(v.to_string())),
            active,
            part: 1,
            category: Category::Static,
            extra: None,
            options: Vec::new(),
            correct: None,
        }
    }

    fn extra_item() -> Item {
        let mut item = sample_item(ItemType::MultipleChoice, None, true);
        item.extra = Some(vec![
            ExtraEntry::Single(SubItem {
                key: "a".to_string(),
                name: "A".to_string(),
                kind: ItemType::Binary,
                text: String::new(),
            }),
            ExtraEntry::Single(SubItem {
                key: "b".to_string(),
                name: "B".to_string(),
                kind: ItemType::TrafficLight,
                text: String::new(),
            }),
            ExtraEntry::Group(SubGroup {
                key: "g".to_string(),
                name: "G".to_string(),
                items: vec![
                    SubItem {
                        key: "g1".to_string(),
                        name: "G1".to_string(),
                        kind: ItemType::TrafficLight,
                        text: String::new(),
                    },
                    SubItem {
                        key: "g2".to_string(),
                        name: "G2".to_string(),
                        kind: ItemType::Binary,
                        text: String::new(),
                    },
                ],
            }),
        ]);
        item
    }

    fn part_of(items: Vec<Item>) -> Part {
        Part {
            title: "Part".to_string(),
            items,
        }
    }

    #[test]
    fn test_inactive_item_no_contribution() {
        let item = sample_item(ItemType::Binary, Some("full"), false);
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), None);
    }

    #[test]
    fn test_binary_rule() {
        let full = sample_item(ItemType::Binary, Some("full"), true);
        let none = sample_item(ItemType::Binary, Some("none"), true);
        let unset = sample_item(ItemType::Binary, None, true);
        let half = sample_item(ItemType::Binary, Some("half"), true);
        assert_eq!(score_of(&full, EmptyExtraPolicy::Zero), Some(1.0));
        assert_eq!(score_of(&none, EmptyExtraPolicy::Zero), Some(0.0));
        assert_eq!(score_of(&unset, EmptyExtraPolicy::Zero), Some(0.0));
        assert_eq!(score_of(&half, EmptyExtraPolicy::Zero), Some(0.0));
    }

    #[test]
    fn test_traffic_light_rule_is_monotonic() {
        let score = |v: Option<&str>| {
            score_of(&sample_item(ItemType::TrafficLight, v, true), EmptyExtraPolicy::Zero).unwrap()
        };
        assert_eq!(score(Some("full")), 1.0);
        assert_eq!(score(Some("half")), 0.5);
        assert_eq!(score(Some("none")), 0.0);
        assert_eq!(score(None), 0.0);
        assert!(score(Some("full")) >= score(Some("half")));
        assert!(score(Some("half")) >= score(Some("none")));
    }

    #[test]
    fn test_unrecognized_token_scores_zero() {
        let item = sample_item(ItemType::TrafficLight, Some("green"), true);
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(0.0));

        let mut odd = sample_item(ItemType::Binary, None, true);
        odd.value = Some(ItemValue::Other(serde_json::json!({"x": 1})));
        assert_eq!(score_of(&odd, EmptyExtraPolicy::Zero), Some(0.0));
    }

    #[test]
    fn test_unknown_type_scores_zero() {
        let item = sample_item(ItemType::Unknown, Some("full"), true);
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(0.0));
        assert_eq!(score_mark(ItemType::Unknown, "full"), 0.0);

        let inactive = sample_item(ItemType::Unknown, Some("full"), false);
        assert_eq!(score_of(&inactive, EmptyExtraPolicy::Zero), None);
    }

    #[test]
    fn test_multiple_choice_rule() {
        let mut item = sample_item(ItemType::MultipleChoice, None, true);
        item.correct = Some("right".to_string());
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(0.0));

        item.value = Some(ItemValue::Choices(vec!["wrong".to_string(), "right".to_string()]));
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(1.0));

        item.value = Some(ItemValue::Choices(vec!["wrong".to_string()]));
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(0.0));

        item.value = Some(ItemValue::Mark("right".to_string()));
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(1.0));
    }

    #[test]
    fn test_extra_mean_of_sub_scores() {
        let mut item = extra_item();
        let mut answers = BTreeMap::new();
        answers.insert("a".to_string(), SubAnswer::Mark("full".to_string()));
        answers.insert("b".to_string(), SubAnswer::Mark("half".to_string()));
        item.value = Some(ItemValue::SubAnswers(answers));
        assert!((score_of(&item, EmptyExtraPolicy::Zero).unwrap() - 0.75).abs() < EPS);
    }

    #[test]
    fn test_extra_group_members_each_count() {
        let mut item = extra_item();
        let mut members = BTreeMap::new();
        members.insert("g1".to_string(), "half".to_string());
        members.insert("g2".to_string(), "full".to_string());
        let mut answers = BTreeMap::new();
        answers.insert("a".to_string(), SubAnswer::Mark("none".to_string()));
        answers.insert("g".to_string(), SubAnswer::Group(members));
        item.value = Some(ItemValue::SubAnswers(answers));
        // (0 + 0.5 + 1) / 3
        assert!((score_of(&item, EmptyExtraPolicy::Zero).unwrap() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_extra_unknown_sub_answer_scores_zero() {
        let mut item = extra_item();
        let mut answers = BTreeMap::new();
        answers.insert("a".to_string(), SubAnswer::Mark("full".to_string()));
        answers.insert("missing".to_string(), SubAnswer::Mark("full".to_string()));
        answers.insert("b".to_string(), SubAnswer::Other(serde_json::json!(3)));
        item.value = Some(ItemValue::SubAnswers(answers));
        assert!((score_of(&item, EmptyExtraPolicy::Zero).unwrap() - 1.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_extra_empty_answers_policy() {
        let mut item = extra_item();
        item.value = Some(ItemValue::SubAnswers(BTreeMap::new()));
        assert_eq!(score_of(&item, EmptyExtraPolicy::Zero), Some(0.0));
        assert_eq!(score_of(&item, EmptyExtraPolicy::Exclude), None);
    }

    #[test]
    fn test_part_with_no_active_items_scores_zero() {
        let part = part_of(vec![
            sample_item(ItemType::Binary, Some("full"), false),
            sample_item(ItemType::TrafficLight, Some("half"), false),
        ]);
        assert_eq!(score_of_part(&part, &ScoringConfig::default()), 0.0);
        assert_eq!(score_of_part(&part_of(vec![]), &ScoringConfig::default()), 0.0);
    }

    #[test]
    fn test_part_all_full_scores_part_weight() {
        let part = part_of(vec![
            sample_item(ItemType::Binary, Some("full"), true),
            sample_item(ItemType::TrafficLight, Some("full"), true),
            sample_item(ItemType::Binary, Some("full"), true),
        ]);
        assert!((score_of_part(&part, &ScoringConfig::default()) - 33.33).abs() < EPS);
    }

    #[test]
    fn test_inactive_item_same_as_removed() {
        let with_inactive = part_of(vec![
            sample_item(ItemType::Binary, Some("full"), true),
            sample_item(ItemType::TrafficLight, Some("none"), false),
            sample_item(ItemType::TrafficLight, Some("half"), true),
        ]);
        let removed = part_of(vec![
            sample_item(ItemType::Binary, Some("full"), true),
            sample_item(ItemType::TrafficLight, Some("half"), true),
        ]);
        let config = ScoringConfig::default();
        assert!((score_of_part(&with_inactive, &config) - score_of_part(&removed, &config)).abs() < EPS);
    }

    #[test]
    fn test_part_weight_configurable() {
        let part = part_of(vec![sample_item(ItemType::TrafficLight, Some("half"), true)]);
        let config = ScoringConfig {
            part_weight: Some(50.0),
            ..ScoringConfig::default()
        };
        assert!((score_of_part(&part, &config) - 25.0).abs() < EPS);
    }

    #[test]
    fn test_duatz_deducts_five_each() {
        let parts = vec![part_of(vec![sample_item(ItemType::Binary, Some("full"), true)])];
        let config = ScoringConfig::default();
        for n in 0..10 {
            let a = final_grade(&parts, n, &config);
            let b = final_grade(&parts, n + 1, &config);
            assert!((a - b - 5.0).abs() < EPS);
        }
    }

    #[test]
    fn test_final_grade_not_clamped() {
        let parts = create_default_parts();
        let grade = final_grade(&parts, 3, &ScoringConfig::default());
        assert!((grade + 15.0).abs() < EPS);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let parts = vec![
            part_of(vec![
                sample_item(ItemType::Binary, Some("full"), true),
                sample_item(ItemType::Binary, Some("full"), true),
            ]),
            part_of(vec![sample_item(ItemType::TrafficLight, Some("half"), true)]),
            part_of(vec![sample_item(ItemType::Binary, None, false)]),
        ];
        let config = ScoringConfig::default();
        assert!((score_of_part(&parts[0], &config) - 33.33).abs() < EPS);
        assert!((score_of_part(&parts[1], &config) - 16.665).abs() < EPS);
        assert_eq!(score_of_part(&parts[2], &config), 0.0);
        assert!((final_grade(&parts, 1, &config) - 44.995).abs() < EPS);
    }

    #[test]
    fn test_breakdown_matches_final_grade() {
        let mut parts = create_default_parts();
        parts[0].items[0].value = Some(ItemValue::Mark("full".to_string()));
        parts[0].items[0].active = true;
        parts[1].items[0].value = Some(ItemValue::Mark("half".to_string()));
        parts[1].items[0].active = true;

        let config = ScoringConfig::default();
        let breakdown = grade_breakdown(&parts, 2, &config);
        assert_eq!(breakdown.parts.len(), 3);
        assert_eq!(breakdown.parts[0].counted, 1);
        assert_eq!(breakdown.parts[0].answered, 1);
        assert_eq!(breakdown.penalty, 10.0);
        assert!((breakdown.final_grade - final_grade(&parts, 2, &config)).abs() < EPS);
    }
}
