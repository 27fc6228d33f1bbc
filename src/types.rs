use serde::{Deserialize, Serialize};

use crate::master::MasterError;

/// Classified result of one read attempt against one candidate.
///
/// The driver inspects the tag instead of catching errors, so a failed
/// candidate can never abort the enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Normalized register values, one `u16` per register or bit.
    Values(Vec<u16>),
    /// No response within the configured window.
    Timeout(String),
    /// Anything else: refused connection, transport error, exception reply.
    Error(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Values(_))
    }
}

impl From<MasterError> for ProbeOutcome {
    fn from(err: MasterError) -> Self {
        match err {
            MasterError::Timeout => ProbeOutcome::Timeout(err.to_string()),
            other => ProbeOutcome::Error(other.to_string()),
        }
    }
}

/// One successful probe, kept in the final report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeHit {
    /// Candidate identity: a unit address, register offset, or host.
    pub candidate: String,
    pub values: Vec<u16>,
    pub timestamp: String,
}

/// Aggregate results of one scan run. Failed candidates are reported as
/// they happen and not retained here.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanReport {
    pub attempts: u64,
    pub hit_count: u64,
    pub any_success: bool,
    pub hits: Vec<ProbeHit>,
}
