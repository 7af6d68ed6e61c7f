//! Extraction engine: pure functions from results-page markup to facts.
//!
//! Nothing in here performs I/O or fails. Missing data degrades to zeros or
//! empty strings so one odd page never aborts a batch.

pub mod class_facts;
pub mod fields;
pub mod patterns;
pub mod rows;

pub use class_facts::{
    class_facts_in, class_strategies, extract_class_facts, ClassStrategy, TEXT_WINDOW_CHARS,
};
pub use fields::{
    date_in, event_info_in, extract_course_length, extract_date, extract_event_info,
    extract_position_facts, UNKNOWN_EVENT,
};
pub use rows::{extract_class_name_for_row, parse_rows_for_club};
