use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{Grade, ScoreData};
use crate::catalog::{
    create_default_parts, find_item, find_item_mut, reconcile, ExtraEntry, Item, ItemRef,
    ItemType, ItemValue, Mark, SubAnswer,
};
use crate::scoring::{final_grade, grade_breakdown, GradeBreakdown, ScoringConfig};

const STALE_EPSILON: f64 = 1e-9;

/// Editing state for one grade.
///
/// Changes to answers, active flags or the duatz count recompute the final
/// grade before they return. A resumed grade keeps its stored final grade
/// until one of those changes; `is_stale` tells whether it still matches the
/// answers under the current scoring.
#[derive(Debug, Clone)]
pub struct GradeSession {
    grade: Grade,
    config: ScoringConfig,
}

impl GradeSession {
    /// Start grading from a fresh catalog.
    pub fn new(name: impl Into<String>, config: ScoringConfig) -> Self {
        let mut session = Self {
            grade: Grade {
                name: name.into(),
                duatz_count: 0,
                score_data: ScoreData {
                    parts: create_default_parts(),
                    final_grade: 0.0,
                },
            },
            config,
        };
        session.recompute();
        session
    }

    /// Resume a stored grade on top of the current catalog. The stored final
    /// grade is kept as is.
    pub fn from_grade(grade: Grade, config: ScoringConfig) -> Self {
        let parts = reconcile(&grade.score_data.parts, create_default_parts());
        let session = Self {
            grade: Grade {
                score_data: ScoreData {
                    parts,
                    final_grade: grade.score_data.final_grade,
                },
                ..grade
            },
            config,
        };
        if session.is_stale() {
            debug!(
                stored = session.final_grade(),
                recomputed = session.recomputed_grade(),
                "stored final grade differs from its answers"
            );
        }
        session
    }

    pub fn grade(&self) -> &Grade {
        &self.grade
    }

    pub fn into_grade(self) -> Grade {
        self.grade
    }

    pub fn final_grade(&self) -> f64 {
        self.grade.score_data.final_grade
    }

    /// Final grade the current answers give under this session's scoring.
    pub fn recomputed_grade(&self) -> f64 {
        final_grade(
            &self.grade.score_data.parts,
            self.grade.duatz_count,
            &self.config,
        )
    }

    pub fn is_stale(&self) -> bool {
        (self.final_grade() - self.recomputed_grade()).abs() > STALE_EPSILON
    }

    pub fn breakdown(&self) -> GradeBreakdown {
        grade_breakdown(&self.grade.score_data.parts, self.grade.duatz_count, &self.config)
    }

    pub fn item(&self, at: ItemRef) -> Result<&Item> {
        find_item(&self.grade.score_data.parts, at)
            .with_context(|| format!("No item at {}", at))
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.grade.name = name.into();
    }

    /// Record an answer and mark the item as counted.
    pub fn set_value(&mut self, at: ItemRef, value: ItemValue) -> Result<()> {
        let item = self.item_mut(at)?;
        check_value(item, &value).with_context(|| format!("Invalid answer for {}", at))?;
        item.value = Some(value);
        item.active = true;
        debug!(item = %at, "answer recorded");
        self.recompute();
        Ok(())
    }

    /// Record one sub-check of an item with `extra`. `member` selects a
    /// sub-item inside a group entry.
    pub fn set_sub_answer(
        &mut self,
        at: ItemRef,
        key: &str,
        member: Option<&str>,
        mark: Mark,
    ) -> Result<()> {
        let item = self.item_mut(at)?;
        let entry = item
            .find_extra(key)
            .with_context(|| format!("Item {} has no sub-check '{}'", at, key))?;

        let kind = match (entry, member) {
            (ExtraEntry::Single(sub), None) => sub.kind,
            (ExtraEntry::Group(group), Some(member)) => group
                .items
                .iter()
                .find(|s| s.key == member)
                .map(|s| s.kind)
                .with_context(|| format!("Group '{}' has no member '{}'", key, member))?,
            (ExtraEntry::Single(_), Some(member)) => {
                bail!("'{}' is not a group, cannot select member '{}'", key, member)
            }
            (ExtraEntry::Group(_), None) => bail!("'{}' is a group, a member key is required", key),
        };
        if !mark.allowed_for(kind) {
            bail!("'{}' is not a valid {} answer", mark, kind);
        }

        let mut answers = match item.value.take() {
            Some(ItemValue::SubAnswers(answers)) => answers,
            _ => BTreeMap::new(),
        };
        match member {
            None => {
                answers.insert(key.to_string(), SubAnswer::Mark(mark.as_str().to_string()));
            }
            Some(member) => {
                let slot = answers
                    .entry(key.to_string())
                    .or_insert_with(|| SubAnswer::Group(BTreeMap::new()));
                if !matches!(slot, SubAnswer::Group(_)) {
                    *slot = SubAnswer::Group(BTreeMap::new());
                }
                if let SubAnswer::Group(members) = slot {
                    members.insert(member.to_string(), mark.as_str().to_string());
                }
            }
        }
        item.value = Some(ItemValue::SubAnswers(answers));
        item.active = true;
        debug!(item = %at, key, ?member, "sub-answer recorded");
        self.recompute();
        Ok(())
    }

    /// Clear the answer. The active flag is left as it is.
    pub fn reset_value(&mut self, at: ItemRef) -> Result<()> {
        self.item_mut(at)?.value = None;
        debug!(item = %at, "answer reset");
        self.recompute();
        Ok(())
    }

    pub fn set_active(&mut self, at: ItemRef, active: bool) -> Result<()> {
        self.item_mut(at)?.active = active;
        debug!(item = %at, active, "active flag set");
        self.recompute();
        Ok(())
    }

    /// Flip the active flag and return the new state.
    pub fn toggle_active(&mut self, at: ItemRef) -> Result<bool> {
        let item = self.item_mut(at)?;
        item.active = !item.active;
        let active = item.active;
        debug!(item = %at, active, "active flag toggled");
        self.recompute();
        Ok(active)
    }

    pub fn set_duatz_count(&mut self, count: u32) -> Result<()> {
        let max = self.config.max_duatz();
        if count > max {
            bail!("Duatz count must be between 0 and {}, got {}", max, count);
        }
        self.grade.duatz_count = count;
        debug!(count, "duatz count set");
        self.recompute();
        Ok(())
    }

    fn item_mut(&mut self, at: ItemRef) -> Result<&mut Item> {
        find_item_mut(&mut self.grade.score_data.parts, at)
            .with_context(|| format!("No item at {}", at))
    }

    fn recompute(&mut self) {
        self.grade.score_data.final_grade = self.recomputed_grade();
    }
}

/// Turn command-line input into an answer for `item`.
///
/// Binary and traffic-light items take a mark (`full`, `half`, `none`);
/// multiple-choice items take a comma-separated list of option ids.
pub fn parse_answer(item: &Item, input: &str) -> Result<ItemValue> {
    let input = input.trim();
    match item.kind {
        ItemType::Binary | ItemType::TrafficLight => {
            let mark = Mark::from_token(&input.to_lowercase())
                .with_context(|| format!("Unknown answer '{}', expected full/half/none", input))?;
            Ok(ItemValue::Mark(mark.as_str().to_string()))
        }
        ItemType::Unknown => bail!("'{}' has an unknown answer type", item.name),
        ItemType::MultipleChoice => {
            if item.extra.is_some() {
                bail!("'{}' is answered per sub-check", item.name);
            }
            let selected: Vec<String> = input
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            Ok(ItemValue::Choices(selected))
        }
    }
}

fn check_value(item: &Item, value: &ItemValue) -> Result<()> {
    match (item.kind, value) {
        (ItemType::Binary | ItemType::TrafficLight, ItemValue::Mark(token)) => {
            match Mark::from_token(token) {
                Some(mark) if mark.allowed_for(item.kind) => Ok(()),
                _ => bail!("'{}' is not a valid {} answer", token, item.kind),
            }
        }
        (ItemType::MultipleChoice, ItemValue::Choices(selected)) if item.extra.is_none() => {
            for id in selected {
                if !item.options.iter().any(|o| &o.id == id) {
                    bail!("Unknown option '{}'", id);
                }
            }
            Ok(())
        }
        (ItemType::MultipleChoice, ItemValue::Mark(id)) if item.extra.is_none() => {
            if item.options.iter().any(|o| &o.id == id) {
                Ok(())
            } else {
                bail!("Unknown option '{}'", id)
            }
        }
        (_, ItemValue::SubAnswers(answers)) if item.extra.is_some() => {
            for (key, answer) in answers {
                check_sub_answer(item, key, answer)?;
            }
            Ok(())
        }
        _ => bail!("Answer shape does not fit a {} item", item.kind),
    }
}

fn check_sub_answer(item: &Item, key: &str, answer: &SubAnswer) -> Result<()> {
    let entry = item
        .find_extra(key)
        .with_context(|| format!("Unknown sub-check '{}'", key))?;
    match (entry, answer) {
        (ExtraEntry::Single(sub), SubAnswer::Mark(token)) => match Mark::from_token(token) {
            Some(mark) if mark.allowed_for(sub.kind) => Ok(()),
            _ => bail!("'{}' is not a valid {} answer for '{}'", token, sub.kind, key),
        },
        (ExtraEntry::Group(group), SubAnswer::Group(members)) => {
            for (member, token) in members {
                let sub = group
                    .items
                    .iter()
                    .find(|s| &s.key == member)
                    .with_context(|| format!("Group '{}' has no member '{}'", key, member))?;
                match Mark::from_token(token) {
                    Some(mark) if mark.allowed_for(sub.kind) => {}
                    _ => bail!("'{}' is not a valid {} answer for '{}'", token, sub.kind, member),
                }
            }
            Ok(())
        }
        _ => bail!("Answer shape does not fit sub-check '{}'", key),
    }
}
