use chrono::{NaiveDate, Utc};
use clap::Args;
use csv::{QuoteStyle, WriterBuilder};
use sole_agent::config::AppConfig;
use sole_agent::error::AppError;
use sole_agent::workflows::lettings::ExportTables;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::infra::open_service;

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Destination file. Defaults to `<storage key>-<date>.csv` in the working directory.
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Write to stdout instead of a file.
    #[arg(long, conflicts_with = "output")]
    pub(crate) stdout: bool,
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config.storage)?;
    let tables = service.export_tables();

    if args.stdout {
        let stdout = io::stdout();
        write_tables(&tables, stdout.lock())?;
        return Ok(());
    }

    let path = args
        .output
        .unwrap_or_else(|| default_file_name(&config.storage.key, Utc::now().date_naive()));
    write_tables(&tables, File::create(&path)?)?;
    println!("Exported lettings data to {}", path.display());
    Ok(())
}

pub(crate) fn default_file_name(key: &str, date: NaiveDate) -> PathBuf {
    PathBuf::from(format!("{key}-{}.csv", date.format("%Y-%m-%d")))
}

/// Writes each section as a bare title line followed by fully quoted rows,
/// with a blank line between sections.
pub(crate) fn write_tables<W: Write>(tables: &ExportTables, mut sink: W) -> io::Result<()> {
    for (index, section) in tables.sections.iter().enumerate() {
        if index > 0 {
            sink.write_all(b"\n")?;
        }
        writeln!(sink, "{}", section.title)?;

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .flexible(true)
            .from_writer(&mut sink);
        writer.write_record(&section.headers)?;
        for row in &section.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }

    sink.flush()
}
