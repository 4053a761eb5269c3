//! Output formatting and persistence for reports and count tables.
//!
//! Supports JSON files (optionally gzipped) or stdout, and CSV tallies.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::tally::{CategoryCount, PercentageTally};

/// Destination name that means "write to standard output".
pub const STDOUT: &str = "stdout";

/// Writes `value` as pretty JSON to `dest`, or to stdout when `dest` is [`STDOUT`].
///
/// With `gzip` the file is compressed and `.gz` is appended to the name unless it is
/// already there. Stdout output is never compressed.
pub fn write_json<T: Serialize>(dest: &str, value: &T, gzip: bool) -> Result<()> {
    if dest == STDOUT {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, value)?;
        writeln!(handle)?;
        return Ok(());
    }

    let path = if gzip && !dest.ends_with(".gz") {
        format!("{}.gz", dest)
    } else {
        dest.to_string()
    };
    ensure_parent(Path::new(&path))?;

    let file = File::create(&path).with_context(|| format!("Failed to create {}", path))?;
    let writer = BufWriter::new(file);

    if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer_pretty(&mut encoder, value)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }

    info!(path = %path, gzip, "Report written");
    Ok(())
}

#[derive(Serialize)]
struct TallyRow<'a> {
    label: &'a str,
    count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent: Option<f64>,
}

/// Writes one `label,count[,percent]` row per category, in tally order.
pub fn write_tally_csv(
    dest: &str,
    counts: &CategoryCount,
    percentages: Option<&PercentageTally>,
) -> Result<()> {
    if dest == STDOUT {
        let stdout = std::io::stdout();
        return write_tally_rows(stdout.lock(), counts, percentages);
    }

    ensure_parent(Path::new(dest))?;
    let file = File::create(dest).with_context(|| format!("Failed to create {}", dest))?;
    write_tally_rows(file, counts, percentages)?;
    debug!(path = dest, rows = counts.len(), "Tally CSV written");
    Ok(())
}

fn write_tally_rows<W: Write>(
    out: W,
    counts: &CategoryCount,
    percentages: Option<&PercentageTally>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for entry in &counts.entries {
        writer.serialize(TallyRow {
            label: &entry.label,
            count: entry.count,
            percent: percentages.and_then(|p| p.get(&entry.label)),
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
