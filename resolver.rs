//! Effective guard set for a mint, given an optional group selection.

use log::debug;

use crate::{
    config::{GuardGroup, GuardSet},
    types::CandyGuardError,
};

/// Merge the default guards with the selected group.
///
/// Without groups the defaults apply as-is and any label is ignored. With
/// groups a label is required; every guard enabled in the selected group
/// replaces the default of the same name, the rest keep their default.
pub fn resolve_guards<T: Clone>(
    guards: &GuardSet<T>,
    groups: &[GuardGroup<T>],
    label: Option<&str>,
) -> Result<GuardSet<T>, CandyGuardError> {
    if groups.is_empty() {
        if let Some(label) = label {
            debug!("Ignoring group `{}`: the candy guard has no groups", label);
        }
        return Ok(guards.clone());
    }

    let available = || groups.iter().map(|group| group.label.clone()).collect::<Vec<_>>();

    let label = label.ok_or_else(|| CandyGuardError::GroupRequired(available()))?;
    let group = groups
        .iter()
        .find(|group| group.label == label)
        .ok_or_else(|| CandyGuardError::UnknownGroup {
            label: label.to_string(),
            available: available(),
        })?;

    let mut resolved = guards.clone();
    for (name, settings) in group.guards.iter() {
        resolved.set(name, Some(settings.clone()));
    }
    Ok(resolved)
}
