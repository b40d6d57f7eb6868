pub mod analytics;
pub mod filter;
pub mod storage;
pub mod types;

pub use analytics::{part_means, summarize, SlotStats, Summary};
pub use filter::{filter_reports, ReportFilter};
pub use storage::{get_reports_path, load_documents, load_store, save_store, update_grade};
pub use types::{NewReport, Report, ReportStore};
