//! Per-artifact report lines produced by the promotion and upgrade engines.

use std::fmt;

/// One line of a move or upgrade report.
///
/// `changed` means "transferred" for a move and "upgraded" for an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    /// 1-based position in the enumeration order of the run.
    pub ordinal: usize,
    pub artifact_id: String,
    pub version: String,
    pub package_id: String,
    pub changed: bool,
    pub deployed: bool,
}

/// Ordered outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub lines: Vec<ArtifactOutcome>,
}

impl RunReport {
    pub fn changed(&self) -> usize {
        self.lines.iter().filter(|l| l.changed).count()
    }

    pub fn deployed(&self) -> usize {
        self.lines.iter().filter(|l| l.deployed).count()
    }
}

/// Remote step of a per-artifact transport sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStep {
    Read,
    Delete,
    Download,
    Upload,
    Configure,
    Deploy,
}

impl fmt::Display for TransportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportStep::Read => "read",
            TransportStep::Delete => "delete",
            TransportStep::Download => "download",
            TransportStep::Upload => "upload",
            TransportStep::Configure => "configuration update",
            TransportStep::Deploy => "deploy",
        };
        f.write_str(s)
    }
}
