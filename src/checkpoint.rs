//! Picking which trained artifact a stage loads.
//!
//! Two rankings exist and they are deliberately kept apart:
//!
//! * [`SelectionPolicy::Ordinal`] ranks by the training step encoded at the
//!   end of the directory name (`checkpoint-250`). It finds the most
//!   *advanced* artifact.
//! * [`SelectionPolicy::Recency`] ranks by filesystem modification time. It
//!   finds the most *recently written* artifact.
//!
//! The two disagree as soon as checkpoints are copied or regenerated out of
//! training order, so every caller names the policy it wants.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CheckpointError;

/// Directory-name prefix used by training runs.
pub const DEFAULT_PREFIX: &str = "checkpoint-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Highest trailing step number wins.
    Ordinal,
    /// Latest modification time wins.
    Recency,
}

/// A candidate artifact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointCandidate {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl CheckpointCandidate {
    pub fn new(path: impl Into<PathBuf>, modified: Option<SystemTime>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            modified,
        }
    }

    /// Step number after the last `-` of the name; 0 when there is none.
    pub fn ordinal(&self) -> u64 {
        parse_ordinal(&self.name)
    }
}

/// Parse the trailing numeric token of a checkpoint name.
///
/// Malformed names rank as 0 rather than being rejected.
pub fn parse_ordinal(name: &str) -> u64 {
    name.rsplit('-')
        .next()
        .and_then(|token| token.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Pick one candidate according to `policy`.
///
/// Ties go to the candidate listed first.
pub fn resolve<'a>(
    candidates: &'a [CheckpointCandidate],
    policy: SelectionPolicy,
) -> Option<&'a CheckpointCandidate> {
    let mut best: Option<&CheckpointCandidate> = None;
    for candidate in candidates {
        let better = match best {
            None => true,
            Some(current) => match policy {
                SelectionPolicy::Ordinal => candidate.ordinal() > current.ordinal(),
                SelectionPolicy::Recency => {
                    candidate.modified.unwrap_or(SystemTime::UNIX_EPOCH)
                        > current.modified.unwrap_or(SystemTime::UNIX_EPOCH)
                }
            },
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// List the sub-directories of `dir` whose names start with `prefix`.
///
/// Entries are returned sorted by name so that tie-breaking does not depend
/// on the platform's directory order.
pub fn discover(dir: &Path, prefix: &str) -> Result<Vec<CheckpointCandidate>, CheckpointError> {
    let io_err = |source| CheckpointError::Io {
        dir: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let metadata = entry.metadata().map_err(io_err)?;
        if !metadata.is_dir() {
            continue;
        }
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        candidates.push(CheckpointCandidate::new(
            entry.path(),
            metadata.modified().ok(),
        ));
    }

    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(dir = %dir.display(), count = candidates.len(), "discovered checkpoints");
    Ok(candidates)
}

/// Discover and resolve in one step.
pub fn resolve_in(
    dir: &Path,
    prefix: &str,
    policy: SelectionPolicy,
) -> Result<CheckpointCandidate, CheckpointError> {
    let candidates = discover(dir, prefix)?;
    let chosen = resolve(&candidates, policy)
        .cloned()
        .ok_or_else(|| CheckpointError::NoCheckpointFound {
            dir: dir.to_path_buf(),
        })?;
    info!(checkpoint = %chosen.name, ?policy, "selected checkpoint");
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_parsing() {
        assert_eq!(parse_ordinal("checkpoint-250"), 250);
        assert_eq!(parse_ordinal("checkpoint-x"), 0);
        assert_eq!(parse_ordinal("checkpoint"), 0);
        assert_eq!(parse_ordinal("run-3-checkpoint-10350"), 10350);
    }
}
