//! Reader for the semicolon-delimited TrainPlayer reports.

use std::fmt;

use tracing::{info, warn};

use crate::{
    error::PipelineError,
    store::{Folder, ReportStore},
};

/// The three reports TrainPlayer exports for a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// `TrainPlayer Report - Locations.txt`.
    Locations,
    /// `TrainPlayer Report - Industries.txt`.
    Industries,
    /// `TrainPlayer Report - Inventory.txt`.
    Inventory,
}

impl ReportKind {
    /// File name TrainPlayer gives the report.
    pub fn file_name(self) -> &'static str {
        match self {
            ReportKind::Locations => "TrainPlayer Report - Locations.txt",
            ReportKind::Industries => "TrainPlayer Report - Industries.txt",
            ReportKind::Inventory => "TrainPlayer Report - Inventory.txt",
        }
    }

    /// Short label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Locations => "locations",
            ReportKind::Industries => "industries",
            ReportKind::Inventory => "inventory",
        }
    }

    /// Lines preceding the first record. Every report opens with the export date and
    /// closes its header with a key line; the locations report also carries the
    /// railroad name and description in between.
    pub fn header_lines(self) -> usize {
        match self {
            ReportKind::Locations => 4,
            ReportKind::Industries | ReportKind::Inventory => 2,
        }
    }

    /// Minimum number of fields a record must carry.
    pub fn field_count(self) -> usize {
        match self {
            ReportKind::Locations => 6,
            ReportKind::Industries => 9,
            ReportKind::Inventory => 7,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One report line split on `;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    kind: ReportKind,
    line: usize,
    fields: Vec<String>,
}

impl RawRecord {
    /// Split a report line into trimmed fields.
    pub fn parse(kind: ReportKind, line: usize, text: &str) -> Self {
        Self {
            kind,
            line,
            fields: text.split(';').map(|field| field.trim().to_string()).collect(),
        }
    }

    /// 1-based line number in the source report.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Fields in line order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Borrow the fields, failing if the line is shorter than its format requires.
    pub fn checked_fields(&self) -> Result<&[String], PipelineError> {
        let expected = self.kind.field_count();
        if self.fields.len() < expected {
            return Err(PipelineError::MalformedRecord {
                report: self.kind.label(),
                line: self.line,
                expected,
                found: self.fields.len(),
            });
        }
        Ok(&self.fields)
    }
}

/// A parsed report: header lines plus the records that follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatReport {
    /// Which report this is.
    pub kind: ReportKind,
    /// Header lines, trimmed.
    pub header: Vec<String>,
    /// Body lines in file order.
    pub records: Vec<RawRecord>,
}

impl FlatReport {
    /// Split report text into header and records. Blank lines are dropped.
    pub fn parse(kind: ReportKind, contents: &str) -> Self {
        let mut header = Vec::with_capacity(kind.header_lines());
        let mut records = Vec::new();

        let contents = contents.trim_start_matches('\u{feff}');
        for (index, line) in contents.lines().enumerate() {
            let line_text = line.trim_end_matches('\r');
            if header.len() < kind.header_lines() {
                header.push(line_text.trim().to_string());
                continue;
            }
            if line_text.trim().is_empty() {
                continue;
            }
            records.push(RawRecord::parse(kind, index + 1, line_text));
        }

        Self {
            /// Which report this is.
            kind,
            /// Header lines, trimmed.
            header,
            /// Body lines in file order.
            records,
        }
    }

    /// A report with no header and no records, used in place of a missing file.
    pub fn empty(kind: ReportKind) -> Self {
        Self {
            /// Which report this is.
            kind,
            header: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Export date from the first header line.
    pub fn export_date(&self) -> &str {
        self.header_line(0)
    }

    /// Railroad name; only the locations report carries it.
    pub fn railroad_name(&self) -> &str {
        match self.kind {
            ReportKind::Locations => self.header_line(1),
            _ => "",
        }
    }

    /// Railroad description; only the locations report carries it.
    pub fn railroad_description(&self) -> &str {
        match self.kind {
            ReportKind::Locations => self.header_line(2),
            _ => "",
        }
    }

    fn header_line(&self, index: usize) -> &str {
        self.header.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Read and parse one report from the import folder.
pub fn read_report<S: ReportStore>(store: &S, kind: ReportKind) -> Result<FlatReport, PipelineError> {
    match store.read_text(Folder::Import, kind.file_name())? {
        Some(contents) => Ok(FlatReport::parse(kind, &contents)),
        None => Err(PipelineError::SourceNotFound(kind.file_name().to_string())),
    }
}

/// The three reports for one import run.
#[derive(Debug, Clone)]
pub struct ReportSet {
    /// Locations report.
    pub locations: FlatReport,
    /// Industries report.
    pub industries: FlatReport,
    /// Rolling stock report.
    pub inventory: FlatReport,
    /// How many of the three reports produced at least one record.
    pub files_read: usize,
}

impl ReportSet {
    /// Read every report, substituting an empty report for each missing file. Only reports
    /// with records count towards `files_read`.
    pub fn read<S: ReportStore>(store: &S) -> Result<Self, PipelineError> {
        let mut files_read = 0;
        let mut read_or_empty = |kind: ReportKind| match read_report(store, kind) {
            Ok(report) if report.records.is_empty() => {
                warn!(report = %kind, "TrainPlayer report has no records");
                Ok(report)
            }
            Ok(report) => {
                info!(report = %kind, records = report.records.len(), "TrainPlayer report OK");
                files_read += 1;
                Ok(report)
            }
            Err(err) if err.is_recoverable() => {
                warn!(report = %kind, "{err}");
                Ok(FlatReport::empty(kind))
            }
            Err(err) => Err(err),
        };

        let locations = read_or_empty(ReportKind::Locations)?;
        let industries = read_or_empty(ReportKind::Industries)?;
        let inventory = read_or_empty(ReportKind::Inventory)?;

        Ok(Self {
            /// Locations report.
            locations,
            /// Industries report.
            industries,
            /// Rolling stock report.
            inventory,
            files_read,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATIONS: &str = "03/01/2022\r\nPacific Lines\r\nA small switching layout\r\nTP-ID;Location;Track;Label;Type;Spaces\r\n1;Yard1;T1;Label;class yard;10\r\n\r\n2;Mill Town;Mill;Flour Mill;industry;5\r\n";

    #[test]
    fn strips_fixed_header_lines() {
        let report = FlatReport::parse(ReportKind::Locations, LOCATIONS);
        assert_eq!(report.export_date(), "03/01/2022");
        assert_eq!(report.railroad_name(), "Pacific Lines");
        assert_eq!(report.railroad_description(), "A small switching layout");
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].fields()[1], "Yard1");
        assert_eq!(report.records[0].line(), 5);
        assert_eq!(report.records[1].line(), 7);
    }

    #[test]
    fn two_line_header_for_inventory() {
        let report = FlatReport::parse(
            ReportKind::Inventory,
            "03/01/2022\nCarID;Model;Type;A;B;C;Kernel\nSP1234;Boxcar;XM;;;;\n",
        );
        assert_eq!(report.header.len(), 2);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.railroad_name(), "");
    }

    #[test]
    fn trims_fields() {
        let record = RawRecord::parse(ReportKind::Locations, 1, " 1; Yard1 ;T1; L ;class yard; 10");
        assert_eq!(record.fields()[1], "Yard1");
        assert_eq!(record.fields()[4], "class yard");
    }

    #[test]
    fn short_record_is_malformed() {
        let record = RawRecord::parse(ReportKind::Industries, 9, "1;Mill Town;Mill");
        match record.checked_fields() {
            Err(PipelineError::MalformedRecord {
                report,
                line,
                expected,
                found,
            }) => {
                assert_eq!(report, "industries");
                assert_eq!(line, 9);
                assert_eq!(expected, 9);
                assert_eq!(found, 3);
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn header_only_report_is_not_counted() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let reports = dir.path().join("reports");
        std::fs::create_dir_all(&reports)?;
        std::fs::write(reports.join(ReportKind::Locations.file_name()), LOCATIONS)?;
        std::fs::write(reports.join(ReportKind::Industries.file_name()), "03/01/2022\nkey\n")?;

        let set = ReportSet::read(&crate::store::test_store(dir.path()))?;
        assert_eq!(set.files_read, 1);
        assert!(set.industries.records.is_empty());
        assert_eq!(set.industries.export_date(), "03/01/2022");
        assert!(set.inventory.header.is_empty());
        Ok(())
    }

    #[test]
    fn truncated_file_keeps_partial_header() {
        let report = FlatReport::parse(ReportKind::Locations, "03/01/2022\nPacific Lines\n");
        assert_eq!(report.header.len(), 2);
        assert!(report.records.is_empty());
        assert_eq!(report.railroad_description(), "");
    }
}
