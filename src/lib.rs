pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use report::{Report, ReportBuilder, ReportSender};
pub use runner::naming::{resolve_name, sanitize};
pub use runner::{run_reporter, Reporter};
