//! Dry-run migration plan
//!
//! Describes which levels a call would run and how many documents each level
//! would hand to its updater. Building a plan never invokes an updater.

use std::fmt;

use serde::Serialize;

use super::revision::Updater;

/// One level a migration would run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelPlan {
    /// Chain position of the revision
    pub level: usize,
    /// `per_document` or `batch`
    pub updater: &'static str,
    /// Documents the revision would receive
    pub documents: usize,
}

/// Deterministic description of a migration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub target_version: u64,
    /// Documents in the input
    pub documents: usize,
    /// Documents already at the target version
    pub current: usize,
    /// Documents above the target version; migrating them fails
    pub ahead: usize,
    /// Levels that would process at least one document, in execution order
    pub levels: Vec<LevelPlan>,
}

impl MigrationPlan {
    /// Plan a call over documents at the given versions
    pub(crate) fn build(versions: &[u64], chain: &[Updater]) -> Self {
        let target_version = chain.len() as u64;

        let levels = chain
            .iter()
            .enumerate()
            .filter_map(|(level, updater)| {
                // A document at version v passes through every level k with v <= k
                let documents = versions.iter().filter(|&&v| v <= level as u64).count();
                (documents > 0).then(|| LevelPlan {
                    level,
                    updater: updater.kind(),
                    documents,
                })
            })
            .collect();

        Self {
            target_version,
            documents: versions.len(),
            current: versions.iter().filter(|&&v| v == target_version).count(),
            ahead: versions.iter().filter(|&&v| v > target_version).count(),
            levels,
        }
    }

    /// Returns true if no revision would run
    pub fn is_noop(&self) -> bool {
        self.levels.is_empty()
    }

    /// Total updater invocations the call would make
    ///
    /// A batch level counts as one invocation.
    pub fn updater_calls(&self) -> usize {
        self.levels
            .iter()
            .map(|level| if level.updater == "batch" { 1 } else { level.documents })
            .sum()
    }
}

impl fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "MIGRATE {} document(s) to version {}",
            self.documents, self.target_version
        )?;
        if self.levels.is_empty() {
            writeln!(f, "  (nothing to do)")?;
        }
        for level in &self.levels {
            writeln!(
                f,
                "  level {} [{}]: {} document(s)",
                level.level, level.updater, level.documents
            )?;
        }
        if self.ahead > 0 {
            writeln!(f, "  {} document(s) ahead of target", self.ahead)?;
        }
        Ok(())
    }
}
