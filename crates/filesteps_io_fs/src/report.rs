//! Run reports and the reporting sink handed to every operation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use crate::spec::EnumFsOperation;

////////////////////////////////////////////////////////////////////////////////
// #region Reporter

/// Write-only sink for human-readable progress and result messages.
///
/// Passed explicitly into each operation; the core never reaches for a global
/// logger on its own behalf.
pub trait Reporter {
    /// Progress or confirmation message.
    fn info(&self, message: &str);
    /// Failure diagnosis.
    fn error(&self, message: &str);
}

/// Forwards messages to `tracing` at `INFO` / `ERROR`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        tracing::info!(target: "filesteps", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "filesteps", "{message}");
    }
}

/// Severity of a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumReportLevel {
    Info,
    Error,
}

/// Keeps every message in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: Mutex<Vec<(EnumReportLevel, String)>>,
}

impl MemoryReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded messages.
    pub fn entries(&self) -> Vec<(EnumReportLevel, String)> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Recorded messages of one level.
    pub fn messages(&self, level: EnumReportLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: EnumReportLevel, message: &str) {
        let mut guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, message.to_string()));
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(EnumReportLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(EnumReportLevel::Error, message);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Aggregate counters for one successful operation.
#[derive(Debug, Clone)]
pub struct ReportFsOp {
    /// Operation that produced this report.
    pub operation: EnumFsOperation,
    /// Total source entries visited.
    pub cnt_scanned: u64,
    /// Files, directories and links written under destination.
    pub cnt_copied: u64,
    /// Entries removed from source.
    pub cnt_removed: u64,
    /// Entries left alone (e.g. destination directory already present).
    pub cnt_skipped: u64,
    /// Non-fatal notes collected during the run.
    pub warnings: Vec<String>,
}

impl ReportFsOp {
    /// Fixed confirmation message for the operation.
    pub fn message(&self) -> &'static str {
        self.operation.success_message()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_removed".to_string(), self.cnt_removed);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} scanned={} copied={} removed={} skipped={} warnings={}",
            self.cnt_scanned,
            self.cnt_copied,
            self.cnt_removed,
            self.cnt_skipped,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportFsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(self.operation.prefix()))
    }
}

/// Mutable accumulator for operation statistics.
#[derive(Debug, Clone)]
pub struct ReportFsOpBuilder {
    operation: EnumFsOperation,
    cnt_scanned: u64,
    cnt_copied: u64,
    cnt_removed: u64,
    cnt_skipped: u64,
    warnings: Vec<String>,
}

impl ReportFsOpBuilder {
    /// Create a builder with all counters at zero.
    pub fn new(operation: EnumFsOperation) -> Self {
        Self {
            operation,
            cnt_scanned: 0,
            cnt_copied: 0,
            cnt_removed: 0,
            cnt_skipped: 0,
            warnings: Vec::new(),
        }
    }

    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    /// Increment removed count by one.
    pub fn add_removed(&mut self) {
        self.cnt_removed += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!(operation = self.operation.as_str(), "{warning}");
        self.warnings.push(warning);
    }

    /// Fold counters of a nested run (the copy half of a move) into this one.
    pub fn absorb(&mut self, report: ReportFsOp) {
        self.cnt_scanned += report.cnt_scanned;
        self.cnt_copied += report.cnt_copied;
        self.cnt_removed += report.cnt_removed;
        self.cnt_skipped += report.cnt_skipped;
        self.warnings.extend(report.warnings);
    }

    /// Take only the removals of a cleanup run; its entries were already
    /// scanned by the copy half.
    pub fn absorb_removed(&mut self, report: &ReportFsOp) {
        self.cnt_removed += report.cnt_removed;
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportFsOp {
        ReportFsOp {
            operation: self.operation,
            cnt_scanned: self.cnt_scanned,
            cnt_copied: self.cnt_copied,
            cnt_removed: self.cnt_removed,
            cnt_skipped: self.cnt_skipped,
            warnings: self.warnings,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_to_dict_and_format() {
        let mut builder = ReportFsOpBuilder::new(EnumFsOperation::Move);
        builder.add_scanned();
        builder.add_scanned();
        builder.add_copied();
        builder.add_removed();
        builder.add_skipped();
        builder.add_warning("w".to_string());
        let report = builder.build();

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_scanned"], 2);
        assert_eq!(dict_counts["cnt_copied"], 1);
        assert_eq!(dict_counts["cnt_removed"], 1);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        assert_eq!(
            report.to_string(),
            "[MOVE] scanned=2 copied=1 removed=1 skipped=1 warnings=1"
        );
        assert_eq!(report.message(), "Moving successful");
    }

    #[test]
    fn absorb_merges_nested_counts() {
        let mut inner = ReportFsOpBuilder::new(EnumFsOperation::Copy);
        inner.add_scanned();
        inner.add_copied();
        inner.add_warning("nested".to_string());

        let mut outer = ReportFsOpBuilder::new(EnumFsOperation::Move);
        outer.absorb(inner.build());
        outer.add_removed();
        let report = outer.build();

        assert_eq!(report.operation, EnumFsOperation::Move);
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.cnt_removed, 1);
        assert_eq!(report.warnings, vec!["nested".to_string()]);
    }

    #[test]
    fn memory_reporter_keeps_order_and_levels() {
        let reporter = MemoryReporter::new();
        reporter.info("one");
        reporter.error("two");
        reporter.info("three");

        assert_eq!(
            reporter.messages(EnumReportLevel::Info),
            vec!["one".to_string(), "three".to_string()]
        );
        assert_eq!(reporter.messages(EnumReportLevel::Error), vec!["two".to_string()]);
        assert_eq!(reporter.entries()[1], (EnumReportLevel::Error, "two".to_string()));
    }
}
