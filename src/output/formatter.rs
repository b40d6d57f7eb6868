use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::catalog::{ExtraEntry, Item, ItemType, ItemValue, Part, SubAnswer};
use crate::grade::GradeSlot;
use crate::report::{Report, Summary};
use crate::scoring::GradeBreakdown;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a grade with two decimals
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

fn paint_score(score: f64, width: usize, use_colors: bool) -> String {
    let text = format!("{:>width$}", format_score(score), width = width);
    if !use_colors {
        text
    } else if score >= 80.0 {
        text.green().to_string()
    } else if score >= 60.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

fn slot_cell(report: &Report, slot: GradeSlot, use_colors: bool) -> String {
    match report.final_grade(slot) {
        Some(score) => paint_score(score, 7, use_colors),
        None => format!("{:>7}", "-"),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format a grade breakdown: one line per part, then penalty and total.
pub fn format_breakdown(breakdown: &GradeBreakdown, use_colors: bool) -> String {
    let mut lines = Vec::new();
    for (i, part) in breakdown.parts.iter().enumerate() {
        lines.push(format!(
            "  Part {} {:<36} {:>7}  ({} counted, {}/{} answered)",
            i + 1,
            truncate_title(&part.title, 36),
            format_score(part.score),
            part.counted,
            part.answered,
            part.total
        ));
    }
    lines.push(format!(
        "  {:<43} {:>7}",
        format!("Duatz x{}", breakdown.duatz_count),
        format!("-{}", format_score(breakdown.penalty))
    ));
    let total = paint_score(breakdown.final_grade, 7, use_colors);
    let label = format!("{:<43}", "Final grade");
    if use_colors {
        lines.push(format!("  {} {}", label.bold(), total.bold()));
    } else {
        lines.push(format!("  {} {}", label, total));
    }
    lines.join("\n")
}

/// Note printed when a stored final grade no longer matches its answers,
/// e.g. after the part weight changed or for an imported grade.
pub fn format_stale_note(stored: f64, recomputed: f64) -> String {
    format!(
        "  Stored final grade {} (answers now give {}; changes to an answer, flag or duatz store the new value)",
        format_score(stored),
        format_score(recomputed)
    )
}

fn value_text(item: &Item) -> String {
    match &item.value {
        None => "-".to_string(),
        Some(ItemValue::Mark(token)) => token.clone(),
        Some(ItemValue::Choices(selected)) if selected.is_empty() => "-".to_string(),
        Some(ItemValue::Choices(selected)) => selected.join(","),
        Some(ItemValue::SubAnswers(answers)) => format!("{} sub-answers", answers.len()),
        Some(ItemValue::Other(_)) => "?".to_string(),
    }
}

fn type_tag(kind: ItemType) -> &'static str {
    match kind {
        ItemType::Binary => "bin",
        ItemType::TrafficLight => "light",
        ItemType::MultipleChoice => "choice",
        ItemType::Unknown => "?",
    }
}

fn sub_answer_text(item: &Item, key: &str, member: Option<&str>) -> String {
    let answers = match &item.value {
        Some(ItemValue::SubAnswers(answers)) => answers,
        _ => return "-".to_string(),
    };
    match (answers.get(key), member) {
        (Some(SubAnswer::Mark(token)), None) => token.clone(),
        (Some(SubAnswer::Group(members)), Some(member)) => {
            members.get(member).cloned().unwrap_or_else(|| "-".to_string())
        }
        _ => "-".to_string(),
    }
}

/// Format the answer sheet: every item with its reference, type, active
/// flag and current answer. Sub-checks and options are listed beneath.
pub fn format_items(parts: &[Part], use_colors: bool) -> String {
    let mut lines = Vec::new();
    for (p, part) in parts.iter().enumerate() {
        let heading = format!("Part {}: {}", p + 1, part.title);
        if use_colors {
            lines.push(heading.bold().to_string());
        } else {
            lines.push(heading);
        }

        for (i, item) in part.items.iter().enumerate() {
            let reference = format!("{}.{}", p + 1, i + 1);
            let flag = if item.active { "[x]" } else { "[ ]" };
            let answer = format!("{:<12}", value_text(item));
            if use_colors {
                lines.push(format!(
                    "  {:<5} {} {:<6} {} {}",
                    reference.dimmed(),
                    flag,
                    type_tag(item.kind),
                    answer.cyan(),
                    item.name
                ));
            } else {
                lines.push(format!(
                    "  {:<5} {} {:<6} {} {}",
                    reference,
                    flag,
                    type_tag(item.kind),
                    answer,
                    item.name
                ));
            }

            for option in &item.options {
                let marker = if item.correct.as_deref() == Some(option.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                lines.push(format!("          {} {:<12} {}", marker, option.id, option.label));
            }

            for entry in item.extra.iter().flatten() {
                match entry {
                    ExtraEntry::Single(sub) => lines.push(format!(
                        "          {:<22} {:<6} {:<6} {}",
                        sub.key,
                        type_tag(sub.kind),
                        sub_answer_text(item, &sub.key, None),
                        sub.name
                    )),
                    ExtraEntry::Group(group) => {
                        lines.push(format!("          {:<22} {}", group.key, group.name));
                        for sub in &group.items {
                            let key = format!("{}/{}", group.key, sub.key);
                            lines.push(format!(
                                "            {:<20} {:<6} {:<6} {}",
                                key,
                                type_tag(sub.kind),
                                sub_answer_text(item, &group.key, Some(sub.key.as_str())),
                                sub.name
                            ));
                        }
                    }
                }
            }
        }
    }
    lines.join("\n")
}

/// Format a report header: name, unit, location and date.
pub fn format_report_header(report: &Report, use_colors: bool) -> String {
    let title = format!("#{} {}", report.id, report.name);
    let title = if use_colors {
        title.bold().to_string()
    } else {
        title
    };
    let mut out = format!(
        "{}\n  Unit: {}\n  Location: {}\n  Date: {}",
        title,
        if report.unit.is_empty() { "-" } else { report.unit.as_str() },
        if report.location.is_empty() { "-" } else { report.location.as_str() },
        report.exercise_date
    );
    if !report.notes.is_empty() {
        out.push_str(&format!("\n  Notes: {}", report.notes));
    }
    out
}

/// Format reports as a table with columns: Id, Date, Grade1, Grade2, Name, Unit
pub fn format_report_table(reports: &[&Report], use_colors: bool) -> String {
    if reports.is_empty() {
        return "No reports found.".to_string();
    }

    let term_width = get_terminal_width();
    let separator = "  ";
    let id_width = 4;
    let date_width = 10;
    let grade_width = 7;

    reports
        .iter()
        .map(|report| {
            let id_str = format!("{:>width$}", format!("#{}", report.id), width = id_width);
            let unit = report.unit.as_str();
            let fixed_width = id_width
                + date_width
                + grade_width * 2
                + separator.len() * 5
                + unit.chars().count();

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_title(&report.name, width - fixed_width)
                }
                Some(_) => truncate_title(&report.name, 20),
                None => report.name.clone(),
            };

            let g1 = slot_cell(report, GradeSlot::First, use_colors);
            let g2 = slot_cell(report, GradeSlot::Second, use_colors);

            if use_colors {
                format!(
                    "{}{}{}{}{}{}{}{}{}{}{}",
                    id_str.dimmed(),
                    separator,
                    report.exercise_date,
                    separator,
                    g1,
                    separator,
                    g2,
                    separator,
                    name,
                    separator,
                    unit.cyan()
                )
            } else {
                format!(
                    "{}{}{}{}{}{}{}{}{}{}{}",
                    id_str,
                    separator,
                    report.exercise_date,
                    separator,
                    g1,
                    separator,
                    g2,
                    separator,
                    name,
                    separator,
                    unit
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format reports as tab-separated values for scripting
/// Columns: id, date, grade1, grade2, name, unit (no headers, no colors)
pub fn format_tsv(reports: &[&Report]) -> String {
    if reports.is_empty() {
        return String::new();
    }

    let cell = |v: Option<f64>| v.map(format_score).unwrap_or_default();
    reports
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                r.id,
                r.exercise_date,
                cell(r.final_grade(GradeSlot::First)),
                cell(r.final_grade(GradeSlot::Second)),
                r.name,
                r.unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format cross-report statistics and, when given, mean part scores of grade1.
pub fn format_summary(summary: &Summary, part_means: &[f64], use_colors: bool) -> String {
    let mut lines = vec![format!("Reports: {}", summary.reports)];

    for (label, stats) in [("Grade 1", &summary.grade1), ("Grade 2", &summary.grade2)] {
        match stats {
            Some(s) => lines.push(format!(
                "{}: {} graded, mean {}, min {}, max {}",
                label,
                s.count,
                paint_score(s.mean, 0, use_colors),
                format_score(s.min),
                format_score(s.max)
            )),
            None => lines.push(format!("{}: none graded", label)),
        }
    }

    match summary.mean_improvement {
        Some(delta) => lines.push(format!(
            "Improvement: {:+.2} on average over {} compared reports",
            delta, summary.compared
        )),
        None => lines.push("Improvement: no report has both grades".to_string()),
    }

    for (i, mean) in part_means.iter().enumerate() {
        lines.push(format!("  Part {} mean: {}", i + 1, format_score(*mean)));
    }

    lines.join("\n")
}
