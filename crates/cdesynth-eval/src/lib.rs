//! Frequency evaluation of generated datasets.

pub mod engine;
pub mod errors;
pub mod model;
pub mod report;

pub use engine::{count_csv, count_rows, frequencies, percent};
pub use errors::EvalError;
pub use model::{DatasetCounts, FieldSelector, FrequencyEntry, FrequencyReport};
pub use report::{render_markdown, render_report};
