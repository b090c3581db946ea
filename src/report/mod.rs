pub mod formatter;
pub mod table;

pub use formatter::{format_text_report, ReportInput};
pub use table::{display_width, render_table};
