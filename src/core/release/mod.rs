mod gates;
mod pipeline;
mod types;

pub use gates::{
    check_clean, check_drift, check_unprotected, resolve_drift_reference,
    resolve_protected_branches,
};
pub use pipeline::Pipeline;
pub use types::{
    Gate, GateRecord, PairStatus, PlannedCommand, ProtectedBranches, ReleaseOptions, ReleaseRun,
    RepositoryReport, RepositoryRole, RepositoryStatus, Stage,
};
