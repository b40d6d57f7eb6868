use super::types::{Category, ChoiceOption, ExtraEntry, Item, ItemType, Part, SubGroup, SubItem};

fn item(part: u8, category: Category, kind: ItemType, name: &str) -> Item {
    Item {
        name: name.to_string(),
        kind,
        value: None,
        active: false,
        part,
        category,
        extra: None,
        options: Vec::new(),
        correct: None,
    }
}

fn binary(part: u8, category: Category, name: &str) -> Item {
    item(part, category, ItemType::Binary, name)
}

fn traffic(part: u8, category: Category, name: &str) -> Item {
    item(part, category, ItemType::TrafficLight, name)
}

fn choice(part: u8, category: Category, name: &str, options: &[(&str, &str)], correct: &str) -> Item {
    let mut it = item(part, category, ItemType::MultipleChoice, name);
    it.options = options
        .iter()
        .map(|(id, label)| ChoiceOption {
            id: id.to_string(),
            label: label.to_string(),
        })
        .collect();
    it.correct = Some(correct.to_string());
    it
}

fn with_extra(part: u8, category: Category, name: &str, extra: Vec<ExtraEntry>) -> Item {
    let mut it = item(part, category, ItemType::MultipleChoice, name);
    it.extra = Some(extra);
    it
}

fn sub(key: &str, kind: ItemType, name: &str, text: &str) -> SubItem {
    SubItem {
        key: key.to_string(),
        name: name.to_string(),
        kind,
        text: text.to_string(),
    }
}

fn single(key: &str, kind: ItemType, name: &str, text: &str) -> ExtraEntry {
    ExtraEntry::Single(sub(key, kind, name, text))
}

fn group(key: &str, name: &str, items: Vec<SubItem>) -> ExtraEntry {
    ExtraEntry::Group(SubGroup {
        key: key.to_string(),
        name: name.to_string(),
        items,
    })
}

/// Build the canonical three-part evaluation catalog.
///
/// Every call returns a fresh tree; nothing is shared between calls, so two
/// grading sessions can never alias each other's answers. All items start
/// unanswered and inactive.
pub fn create_default_parts() -> Vec<Part> {
    use Category::{Chronologic, Static};
    use ItemType::{Binary, TrafficLight};

    let part1 = Part {
        title: "Planning and battle procedure".to_string(),
        items: vec![
            binary(1, Chronologic, "Warning order issued on time"),
            traffic(1, Chronologic, "Mission analysis and commander's intent"),
            with_extra(
                1,
                Chronologic,
                "Operation order briefing",
                vec![
                    single("situation", TrafficLight, "Situation", "Enemy and friendly forces presented"),
                    single("mission", Binary, "Mission statement", "Who, what, where, when, why"),
                    single("execution", TrafficLight, "Execution", "Phases, main effort, fire plan"),
                    group(
                        "support",
                        "Service support and command",
                        vec![
                            sub("logistics", TrafficLight, "Logistics", "Ammunition, water, casualty evacuation"),
                            sub("signals", Binary, "Signals", "Frequencies, call signs, code words"),
                        ],
                    ),
                ],
            ),
            traffic(1, Chronologic, "Rehearsal of key actions"),
            binary(1, Chronologic, "Back-brief by subordinate commanders"),
            choice(
                1,
                Static,
                "Route selection",
                &[
                    ("covered", "Covered approach with alternate route"),
                    ("direct", "Direct approach"),
                    ("unplanned", "No route planned"),
                ],
                "covered",
            ),
            binary(1, Static, "Map and terrain model prepared"),
            traffic(1, Static, "Risk assessment and safety brief"),
        ],
    };

    let part2 = Part {
        title: "Execution".to_string(),
        items: vec![
            traffic(2, Chronologic, "Movement to the line of departure"),
            binary(2, Chronologic, "Crossing the line of departure on time"),
            with_extra(
                2,
                Chronologic,
                "Fire and movement",
                vec![
                    single("cover", TrafficLight, "Use of cover", "Bounds between covered positions"),
                    single("suppression", TrafficLight, "Suppressive fire", "Continuous while elements move"),
                    single("spacing", Binary, "Spacing", "Dispersion kept under fire"),
                ],
            ),
            traffic(2, Chronologic, "Assault on the objective"),
            with_extra(
                2,
                Chronologic,
                "Consolidation and reorganization",
                vec![
                    group(
                        "security",
                        "Security",
                        vec![
                            sub("perimeter", TrafficLight, "Perimeter", "All-round defence established"),
                            sub("observation", Binary, "Observation posts", "Posted on likely approaches"),
                        ],
                    ),
                    single("ace", Binary, "Ammunition, casualty, equipment report", "Sent within the drill time"),
                ],
            ),
            traffic(2, Static, "Weapon handling and muzzle discipline"),
            binary(2, Static, "Fire control orders used"),
            choice(
                2,
                Static,
                "Casualty evacuation drill",
                &[
                    ("immediate", "Immediate treatment and evacuation"),
                    ("delayed", "Delayed evacuation"),
                    ("none", "Casualty not handled"),
                ],
                "immediate",
            ),
        ],
    };

    let part3 = Part {
        title: "Command and control".to_string(),
        items: vec![
            traffic(3, Static, "Commander's position and control of forces"),
            binary(3, Static, "Situation reports to higher command"),
            with_extra(
                3,
                Static,
                "Radio procedure",
                vec![
                    single("brevity", TrafficLight, "Brevity", "Short transmissions, prowords used"),
                    single("authentication", Binary, "Authentication", "Challenge answered correctly"),
                ],
            ),
            traffic(3, Static, "Adapting the plan to changes"),
            binary(3, Chronologic, "Debrief conducted after the exercise"),
            choice(
                3,
                Chronologic,
                "Lessons learned recorded",
                &[
                    ("written", "Written and distributed"),
                    ("verbal", "Verbal only"),
                    ("none", "Not recorded"),
                ],
                "written",
            ),
        ],
    };

    vec![part1, part2, part3]
}
