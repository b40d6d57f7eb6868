use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Answer domain of an item or sub-item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Binary,
    TrafficLight,
    MultipleChoice,
    /// Any type this catalog does not know. Never answerable, scores zero.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemType::Binary => "binary",
            ItemType::TrafficLight => "trafficLight",
            ItemType::MultipleChoice => "multipleChoice",
            ItemType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Presentation-only partition of items; never used in scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Chronologic,
    #[default]
    #[serde(other)]
    Static,
}

/// A recognized answer token for binary and traffic-light questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Full,
    Half,
    None,
}

impl Mark {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Full => "full",
            Mark::Half => "half",
            Mark::None => "none",
        }
    }

    /// Parse a stored token. Unknown tokens yield `None` rather than an error
    /// so that scoring can treat them as a zero contribution.
    pub fn from_token(s: &str) -> Option<Mark> {
        match s {
            "full" => Some(Mark::Full),
            "half" => Some(Mark::Half),
            "none" => Some(Mark::None),
            _ => None,
        }
    }

    /// Whether this mark belongs to the answer domain of `kind`.
    pub fn allowed_for(&self, kind: ItemType) -> bool {
        match kind {
            ItemType::Binary => matches!(self, Mark::Full | Mark::None),
            ItemType::TrafficLight => true,
            ItemType::MultipleChoice | ItemType::Unknown => false,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently scorable refinement of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubItem {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// Answer text shown next to the sub-check.
    #[serde(default)]
    pub text: String,
}

/// A named group of sub-items sharing one heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGroup {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<SubItem>,
}

/// An `extra` entry: either a leaf sub-item or a group of leaves.
///
/// Stored documents distinguish the two only by the presence of a `type`
/// field, which is exactly what the untagged representation checks first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraEntry {
    Single(SubItem),
    Group(SubGroup),
}

impl ExtraEntry {
    pub fn key(&self) -> &str {
        match self {
            ExtraEntry::Single(sub) => &sub.key,
            ExtraEntry::Group(group) => &group.key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ExtraEntry::Single(sub) => &sub.name,
            ExtraEntry::Group(group) => &group.name,
        }
    }
}

/// A recorded answer for one `extra` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubAnswer {
    Mark(String),
    Group(BTreeMap<String, String>),
    Other(Value),
}

/// A recorded item answer. The fallback variant keeps legacy or malformed
/// documents loadable; such values score zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Mark(String),
    Choices(Vec<String>),
    SubAnswers(BTreeMap<String, SubAnswer>),
    Other(Value),
}

/// A selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

/// One evaluable question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "unknown_type")]
    pub kind: ItemType,
    #[serde(default)]
    pub value: Option<ItemValue>,
    #[serde(default)]
    pub active: bool,
    /// 1-based part number; 0 when a stored item lacks it
    #[serde(default)]
    pub part: u8,
    #[serde(default)]
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Vec<ExtraEntry>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    /// Option id that scores full marks on a multiple-choice question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<String>,
}

fn unknown_type() -> ItemType {
    ItemType::Unknown
}

impl Item {
    pub fn find_extra(&self, key: &str) -> Option<&ExtraEntry> {
        self.extra.as_ref()?.iter().find(|e| e.key() == key)
    }

    /// Number of leaf sub-checks under `extra`.
    pub fn extra_leaf_count(&self) -> usize {
        self.extra
            .as_ref()
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| match e {
                        ExtraEntry::Single(_) => 1,
                        ExtraEntry::Group(g) => g.items.len(),
                    })
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn is_answered(&self) -> bool {
        match &self.value {
            None => false,
            Some(ItemValue::Choices(c)) => !c.is_empty(),
            Some(ItemValue::SubAnswers(m)) => !m.is_empty(),
            Some(_) => true,
        }
    }
}

/// A bucket of items weighted equally toward the final grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Position of an item in the catalog, 1-based on both axes ("2.5").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRef {
    pub part: usize,
    pub index: usize,
}

impl ItemRef {
    pub fn parse(s: &str) -> Result<Self> {
        let Some((part, index)) = s.trim().split_once('.') else {
            bail!("Item reference must look like <part>.<index>: {}", s);
        };
        let part: usize = part
            .trim()
            .parse()
            .with_context(|| format!("Invalid part number in '{}'", s))?;
        let index: usize = index
            .trim()
            .parse()
            .with_context(|| format!("Invalid item number in '{}'", s))?;
        if part == 0 || index == 0 {
            bail!("Item references are 1-based: {}", s);
        }
        Ok(ItemRef { part, index })
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.part, self.index)
    }
}

pub fn find_item(parts: &[Part], at: ItemRef) -> Option<&Item> {
    parts.get(at.part.checked_sub(1)?)?.items.get(at.index.checked_sub(1)?)
}

pub fn find_item_mut(parts: &mut [Part], at: ItemRef) -> Option<&mut Item> {
    parts
        .get_mut(at.part.checked_sub(1)?)?
        .items
        .get_mut(at.index.checked_sub(1)?)
}
