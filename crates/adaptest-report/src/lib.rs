//! adaptest-report — Exam report rendering.
//!
//! Turns a completed `ExamReport` into human-facing markdown or a
//! self-contained HTML page with the ability trajectory.

pub mod html;
pub mod markdown;

pub use html::{generate_html, save_html};
pub use markdown::to_markdown;
