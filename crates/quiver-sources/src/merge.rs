//! Skill index rebuild after a sync run.

use std::collections::HashSet;

use quiver_catalog::ResourceManifest;

use crate::scan::ScannedSkill;

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub manifest: ResourceManifest,
    /// Manual entries replaced by a scanned skill of the same name.
    pub overwritten: Vec<String>,
    /// Entries dropped because their source is no longer configured.
    pub pruned: Vec<String>,
}

/// Rebuild the skill index from `existing` and this run's findings.
///
/// - Manual entries (no `source`) survive unless a scanned skill has the same name.
/// - Entries of a source scanned in this run are replaced by its findings.
/// - Entries of configured sources not scanned in this run survive.
/// - Entries of sources absent from `configured` are pruned.
///
/// Surviving entries keep their order; scanned skills are appended in scan order.
#[must_use]
pub fn merge_index(
    existing: &ResourceManifest,
    scanned: &[ScannedSkill],
    scanned_sources: &HashSet<String>,
    configured: &HashSet<String>,
) -> MergeOutcome {
    let scanned_names: HashSet<&str> = scanned.iter().map(|s| s.name.as_str()).collect();
    let mut outcome = MergeOutcome {
        manifest: ResourceManifest {
            version: existing.version.clone(),
            resources: Vec::with_capacity(existing.resources.len() + scanned.len()),
        },
        ..MergeOutcome::default()
    };

    for entry in &existing.resources {
        match entry.source.as_deref() {
            None if scanned_names.contains(entry.name.as_str()) => {
                outcome.overwritten.push(entry.name.clone());
            }
            None => outcome.manifest.resources.push(entry.clone()),
            Some(source) if !configured.contains(source) => {
                outcome.pruned.push(entry.name.clone());
            }
            Some(source) if scanned_sources.contains(source) => {}
            Some(_) if scanned_names.contains(entry.name.as_str()) => {}
            Some(_) => outcome.manifest.resources.push(entry.clone()),
        }
    }

    outcome
        .manifest
        .resources
        .extend(scanned.iter().map(ScannedSkill::to_entry));
    outcome
}
