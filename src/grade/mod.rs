pub mod session;
pub mod types;

pub use session::{parse_answer, GradeSession};
pub use types::{Grade, GradeSlot, ScoreData};
