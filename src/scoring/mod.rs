pub mod config;
pub mod engine;
pub mod parse;
pub mod validation;

pub use config::*;
pub use engine::{
    final_grade, grade_breakdown, score_mark, score_of, score_of_part, GradeBreakdown, PartScore,
};
pub use parse::{deserialize_grade, parse_float, parse_grade};
pub use validation::validate_scoring;
