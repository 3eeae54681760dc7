//! `filesteps_io_fs` v1:
//! Validated copy / move / delete steps.
//!
//! Every operation runs its precondition checks first and only then touches
//! the filesystem. Modules:
//! - `check`    : source / destination preconditions
//! - `copy`     : copy a file or a directory's contents into a directory
//! - `relocate` : move (rename when possible, copy-then-delete otherwise)
//! - `delete`   : bottom-up removal of a file or subtree
//! - `report`   : reporter sink and run-time report model
//! - `spec`     : enums/options/requests/errors
//! - `util`     : shared helper functions

pub mod check;
pub mod copy;
pub mod delete;
pub mod relocate;
pub mod report;
pub mod spec;
mod util;

pub use check::{check_destination, check_source, check_transfer};
pub use copy::copy;
pub use delete::delete;
pub use relocate::move_into;
pub use report::{
    EnumReportLevel, MemoryReporter, ReportFsOp, ReportFsOpBuilder, Reporter, TracingReporter,
};
pub use spec::{
    EnumFsErrorKind, EnumFsOperation, EnumMovePhase, EnumMoveStrategy, EnumSourceAccess,
    EnumSymlinkStrategy, FsOpError, FsOpResult, SpecDeleteRequest, SpecTransferOptions,
    SpecTransferRequest,
};

/// One operation request, ready to run.
#[derive(Debug, Clone)]
pub enum SpecFsRequest {
    Copy(SpecTransferRequest),
    Move(SpecTransferRequest),
    Delete(SpecDeleteRequest),
}

impl SpecFsRequest {
    /// Operation this request runs.
    pub fn operation(&self) -> EnumFsOperation {
        match self {
            Self::Copy(_) => EnumFsOperation::Copy,
            Self::Move(_) => EnumFsOperation::Move,
            Self::Delete(_) => EnumFsOperation::Delete,
        }
    }

    /// Check, then execute.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns.
    pub fn execute(&self, reporter: &dyn Reporter) -> FsOpResult<ReportFsOp> {
        match self {
            Self::Copy(request) => copy(request, reporter),
            Self::Move(request) => move_into(request, reporter),
            Self::Delete(request) => delete(request, reporter),
        }
    }
}
