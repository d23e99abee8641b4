//! Output rendering for query results and cluster listings

use chrono::{DateTime, Local};
use serde_json::Value as JsonValue;
use std::io::{self, Write};

use crate::client::{QuerySeries, Record, ShardSpace};

/// Display switches that affect select tables
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    /// Render `time` as a local datetime instead of epoch milliseconds
    pub date_time: bool,
    /// Skip the `## name` and header lines
    pub records_only: bool,
}

#[derive(Debug, Clone, Copy)]
enum ColumnKind {
    Time,
    SequenceNumber,
    Value,
    Other,
}

impl ColumnKind {
    fn of(column: &str) -> Self {
        match column {
            "time" => Self::Time,
            "sequence_number" => Self::SequenceNumber,
            "value" => Self::Value,
            _ => Self::Other,
        }
    }

    fn header(self, column: &str, options: TableOptions) -> String {
        match self {
            Self::Time if options.date_time => format!("{column:>33}"),
            Self::SequenceNumber => format!("{column:>16}"),
            _ => format!("{column:>20}"),
        }
    }

    fn cell(self, value: &JsonValue, options: TableOptions) -> String {
        match (self, value.as_f64()) {
            (Self::Time, Some(ms)) if options.date_time => format!("{:>33}", format_timestamp(ms)),
            (Self::Time, _) if options.date_time => format!("{:>33}", plain(value)),
            (Self::Time | Self::Value, Some(f)) => format!("{f:>20.6}"),
            (Self::SequenceNumber, Some(f)) => format!("      {f:>10.6}"),
            (Self::SequenceNumber, None) => format!("      {:>10}", plain(value)),
            _ => format!("{:>20}", plain(value)),
        }
    }
}

/// Epoch milliseconds as a local datetime
pub fn format_timestamp(ms: f64) -> String {
    match DateTime::from_timestamp_millis(ms as i64) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S%.3f %z")
            .to_string(),
        None => ms.to_string(),
    }
}

/// JSON value without quotes around strings
fn plain(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render select results, one table per series
pub fn write_series_tables(
    out: &mut dyn Write,
    series: &[QuerySeries],
    options: TableOptions,
) -> io::Result<()> {
    for serie in series {
        let kinds: Vec<ColumnKind> = serie.columns.iter().map(|c| ColumnKind::of(c)).collect();

        if !options.records_only {
            writeln!(out, "## {}", serie.name)?;
            for (column, kind) in serie.columns.iter().zip(&kinds) {
                write!(out, "{}", kind.header(column, options))?;
            }
            writeln!(out)?;
        }

        for point in &serie.points {
            for (i, kind) in kinds.iter().enumerate() {
                let value = point.get(i).unwrap_or(&JsonValue::Null);
                write!(out, "{}", kind.cell(value, options))?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Render `list series` output: the series name column of every point
pub fn write_series_names(out: &mut dyn Write, series: &[QuerySeries]) -> io::Result<()> {
    for serie in series {
        for point in &serie.points {
            if let Some(name) = point.get(1) {
                writeln!(out, "{}", plain(name))?;
            }
        }
    }
    Ok(())
}

pub fn write_admins(out: &mut dyn Write, admins: &[Record]) -> io::Result<()> {
    for (i, admin) in admins.iter().enumerate() {
        writeln!(out, "## {i}")?;
        for (key, value) in admin {
            writeln!(out, "{key:>25} {}", plain(value))?;
        }
    }
    Ok(())
}

pub fn write_servers(out: &mut dyn Write, servers: &[Record]) -> io::Result<()> {
    for server in servers {
        let id = server.get("id").map(plain).unwrap_or_default();
        writeln!(out, "## id {id}")?;
        for (key, value) in server.iter().filter(|(k, _)| k.as_str() != "id") {
            writeln!(out, "{key:>25} {}", plain(value))?;
        }
    }
    Ok(())
}

/// Shard spaces as a table sized to the widest entry per column
pub fn write_shard_spaces(out: &mut dyn Write, spaces: &[ShardSpace]) -> io::Result<()> {
    fn width(spaces: &[ShardSpace], header: &str, field: fn(&ShardSpace) -> &str) -> usize {
        spaces
            .iter()
            .map(|s| field(s).len())
            .fold(header.len(), usize::max)
    }

    let db = width(spaces, "Database", |s| &s.database);
    let name = width(spaces, "Name", |s| &s.name);
    let regex = width(spaces, "Regex", |s| &s.regex);
    let retention = width(spaces, "Retention", |s| &s.retention_policy);
    let duration = width(spaces, "Duration", |s| &s.shard_duration);

    writeln!(
        out,
        "{:>db$} {:>name$} {:>regex$} {:>retention$} {:>duration$} {:>2} {:>5}",
        "Database", "Name", "Regex", "Retention", "Duration", "RF", "Split"
    )?;
    for s in spaces {
        writeln!(
            out,
            "{:>db$} {:>name$} {:>regex$} {:>retention$} {:>duration$} {:>2} {:>5}",
            s.database,
            s.name,
            s.regex,
            s.retention_policy,
            s.shard_duration,
            s.replication_factor,
            s.split
        )?;
    }
    Ok(())
}
