//! Process runtime: CLI, crawl driver and report export.

mod crawl;
mod data_io;
mod runtime;
mod types;

pub use crawl::{build_client, fetch_page, run_crawler, transport_status};
pub use data_io::{
    ReportFormat, default_output_path, detect_report_format, render_text, resolve_output,
    write_report,
};
pub use runtime::run;
pub use types::{Cli, CrawlEvent, CrawlState, LogFormatArg, ReportFormatArg};
