// Sources:
// - https://github.com/libyal/libscca/blob/main/documentation/Windows%20Prefetch%20File%20(PF)%20format.asciidoc
//
// Windows XP / Server 2003 prefetch files (format version 17).

use chrono::{DateTime, Utc};
use log::{debug, warn};
use prettytable::{Table, row};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::filetime::filetime_to_datetime;
use crate::header::Header;
use crate::offset::{clamp, non_negative};
use crate::records::{FileMetric, FixedRecord, Records, TraceChain};
use crate::section::SectionTable;
use crate::strings::decode_filename_table;
use crate::volume::{Volume, decode_volumes};

pub const VERSION: u32 = 17;

/// A fully decoded prefetch file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TraceArtifact {
    pub header: Header,
    pub sections: SectionTable,
    pub last_run_times: Vec<DateTime<Utc>>,
    pub run_count: i32,
    pub file_metrics: Vec<FileMetric>,
    pub trace_chains: Vec<TraceChain>,
    pub filenames: Vec<String>,
    pub volumes: Vec<Volume>,
}

/// Decode a version 17 prefetch file held entirely in `raw`.
pub fn decode(raw: &[u8]) -> Result<TraceArtifact> {
    let header = Header::from_bytes(raw)?;
    let sections = SectionTable::from_bytes(raw)?;

    // Every section offset must land inside the buffer before anything is decoded.
    let metrics_at = sections.file_metrics().resolve(raw.len(), "file metrics")?;
    let chains_at = sections.trace_chains().resolve(raw.len(), "trace chains")?;
    let names_at = sections.filenames().resolve(raw.len(), "filename strings")?;
    let volumes_at = sections.volumes().resolve(raw.len(), "volume information")?;
    debug!(
        "Sections: metrics=0x{:X} chains=0x{:X} names=0x{:X} volumes=0x{:X}",
        metrics_at, chains_at, names_at, volumes_at
    );

    let metrics_count = non_negative("file metrics", sections.file_metrics_count);
    let file_metrics = fixed_section::<FileMetric>(raw, metrics_at, metrics_count, "file metrics");

    let chains_count = non_negative("trace chains", sections.trace_chains_count);
    let trace_chains = fixed_section::<TraceChain>(raw, chains_at, chains_count, "trace chains");

    let names_size = non_negative("filename strings size", sections.filenames_size);
    let filenames = decode_filename_table(clamp(raw, names_at, names_size), names_at)?;

    let volume_count = non_negative("volumes", sections.volume_count);
    let volumes_size = non_negative("volume information size", sections.volumes_size);
    let volumes = decode_volumes(raw, volumes_at, volumes_size, volume_count)?;

    let last_run_times = filetime_to_datetime(sections.last_run_time)
        .into_iter()
        .collect();

    Ok(TraceArtifact {
        header,
        sections,
        last_run_times,
        run_count: sections.run_count,
        file_metrics,
        trace_chains,
        filenames,
        volumes,
    })
}

fn fixed_section<R: FixedRecord>(raw: &[u8], at: usize, count: usize, what: &str) -> Vec<R> {
    let region = clamp(raw, at, count.saturating_mul(R::WIDTH));
    let records: Vec<R> = Records::<R>::new(region, count).collect();
    if records.len() < count {
        warn!(
            "{} at 0x{:X}: {} declared, {} present.",
            what,
            at,
            count,
            records.len()
        );
    }
    records
}

impl TraceArtifact {
    pub fn executable_name(&self) -> &str {
        &self.header.executable_name
    }

    /// Directories referenced on every volume, in volume order.
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.volumes
            .iter()
            .flat_map(|v| v.directory_names.iter().map(String::as_str))
    }

    pub fn to_string(&self) -> String {
        let mut out = String::new();

        let mut hdr = Table::new();
        hdr.add_row(row!["Prefetch (version 17)"]);
        hdr.add_row(row![b -> "Executable", self.header.executable_name]);
        hdr.add_row(row![b -> "Hash", self.header.hash_hex()]);
        hdr.add_row(row![b -> "File Size", self.header.file_size]);
        hdr.add_row(row![b -> "Run Count", self.run_count]);
        for t in &self.last_run_times {
            hdr.add_row(row![b -> "Last Run", t.to_rfc3339()]);
        }
        hdr.add_row(row![b -> "File Metrics", self.file_metrics.len()]);
        hdr.add_row(row![b -> "Trace Chains", self.trace_chains.len()]);
        hdr.add_row(row![b -> "Volumes", self.volumes.len()]);
        out.push_str(&hdr.to_string());

        for v in &self.volumes {
            out.push('\n');
            out.push_str(&v.to_string());
        }

        out.push('\n');
        out.push_str(&self.filenames_table());
        out
    }

    pub fn filenames_table(&self) -> String {
        let mut t = Table::new();
        t.add_row(row!["#", "Referenced File"]);
        for (i, name) in self.filenames.iter().enumerate() {
            t.add_row(row![i, name]);
        }
        t.to_string()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "header": self.header.to_json(),
            "sections": &self.sections,
            "run_count": self.run_count,
            "last_run_times": self.last_run_times,
            "file_metrics": self.file_metrics.iter().map(|m| m.to_json()).collect::<Vec<_>>(),
            "trace_chains": self.trace_chains.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            "filenames": self.filenames,
            "volumes": self.volumes.iter().map(|v| v.to_json()).collect::<Vec<_>>(),
        })
    }
}
