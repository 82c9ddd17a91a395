use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::analytics::AnalyticsReport;

use super::types::ReportFormatArg;

pub const DEFAULT_REPORT_STEM: &str = "crawl_analytics";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(value: ReportFormatArg) -> Self {
        match value {
            ReportFormatArg::Text => ReportFormat::Text,
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Csv => ReportFormat::Csv,
        }
    }
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

pub fn detect_report_format(path: &str, fallback: ReportFormat) -> ReportFormat {
    let ext = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => ReportFormat::Json,
        Some("csv") => ReportFormat::Csv,
        Some("txt") => ReportFormat::Text,
        _ => fallback,
    }
}

pub fn default_output_path(format: ReportFormat) -> String {
    format!("{DEFAULT_REPORT_STEM}.{}", format.extension())
}

/// Resolve the output path and format from optional CLI choices: an
/// explicit format wins, otherwise the output extension decides.
pub fn resolve_output(
    output: Option<&str>,
    format: Option<ReportFormatArg>,
) -> (String, ReportFormat) {
    match (output, format) {
        (Some(path), Some(format)) => (path.to_string(), format.into()),
        (Some(path), None) => (path.to_string(), detect_report_format(path, ReportFormat::Text)),
        (None, Some(format)) => {
            let format = format.into();
            (default_output_path(format), format)
        }
        (None, None) => (default_output_path(ReportFormat::Text), ReportFormat::Text),
    }
}

pub fn write_report(report: &AnalyticsReport, path: &str, format: ReportFormat) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match format {
        ReportFormat::Text => writer.write_all(render_text(report).as_bytes())?,
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n")?;
        }
        ReportFormat::Csv => write_csv(report, &mut writer)?,
    }
    writer.flush()
}

pub fn render_text(report: &AnalyticsReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Unique pages: {}\n", report.unique_pages));
    match &report.longest_page {
        Some(longest) => out.push_str(&format!(
            "Longest page ({} words):\n{}\n\n",
            longest.words, longest.url
        )),
        None => out.push_str("Longest page (0 words):\n\n\n"),
    }

    out.push_str(&format!("Top {} words:\n", report.top_words.len()));
    for (word, count) in &report.top_words {
        out.push_str(&format!("{word}, {count}\n"));
    }

    out.push_str(&format!("\nTop {} stopwords:\n", report.top_stopwords.len()));
    for (word, count) in &report.top_stopwords {
        out.push_str(&format!("{word}, {count}\n"));
    }

    out.push_str("\nSubdomains:\n");
    for (host, pages) in &report.subdomains {
        out.push_str(&format!("{host}, {pages}\n"));
    }

    out.push_str(&format!("\nGenerated: {}\n", report.generated_at));
    out
}

fn write_csv<W: Write>(report: &AnalyticsReport, writer: W) -> io::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["section", "key", "value"])?;
    write_row(&mut csv, "summary", "unique_pages", report.unique_pages)?;
    if let Some(longest) = &report.longest_page {
        write_row(&mut csv, "longest_page", longest.url.as_str(), longest.words)?;
    }
    for (word, count) in &report.top_words {
        write_row(&mut csv, "word", word, count)?;
    }
    for (word, count) in &report.top_stopwords {
        write_row(&mut csv, "stopword", word, count)?;
    }
    for (host, pages) in &report.subdomains {
        write_row(&mut csv, "subdomain", host, pages)?;
    }
    csv.flush()
}

fn write_row<W: Write>(
    csv: &mut csv::Writer<W>,
    section: &str,
    key: &str,
    value: impl ToString,
) -> io::Result<()> {
    csv.write_record([section, key, value.to_string().as_str()])?;
    Ok(())
}
