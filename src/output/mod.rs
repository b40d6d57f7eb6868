pub mod formatter;

pub use formatter::{
    format_breakdown, format_items, format_report_header, format_report_table, format_score,
    format_stale_note, format_summary, format_tsv, should_use_colors,
};
