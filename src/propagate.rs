//! The constraint propagator: expands a root patch set transitively along
//! pointer references, building the static (freespace-independent) gamut
//! for every patch that must be placed (§4.5).

use std::collections::{HashMap, HashSet};

use crate::error::PatchFitError;
use crate::patch::Patch;
use crate::range::Gamut;

pub type PatchMap = HashMap<String, Patch>;
pub type GamutMap = HashMap<String, Gamut>;

/// Computes the transitive closure of patches reachable from `roots`, along
/// with each one's gamut (the intersection of every pointer gamut that
/// targets it). A referent that isn't a key of `patch_map` is reported as
/// [`PatchFitError::MissingReferent`] the moment it's discovered, before any
/// solving is attempted.
pub fn make_gamut_map(patch_map: &PatchMap, roots: &[String]) -> Result<GamutMap, PatchFitError> {
    let mut processed: HashSet<String> = HashSet::new();
    let mut to_process: Vec<String> = roots.to_vec();
    let mut gamut_map: GamutMap = roots
        .iter()
        .map(|r| (r.clone(), Gamut::Unconstrained))
        .collect();

    // `to_process` is treated as a stack; patch graphs may contain cycles,
    // but each name is added to `processed` at most once, so this
    // terminates without needing to walk the graph recursively.
    while let Some(name) = to_process.pop() {
        let patch = patch_map
            .get(&name)
            .ok_or_else(|| PatchFitError::MissingReferent(name.clone()))?;
        patch.constrain(&mut gamut_map, &processed, &mut to_process);
        processed.insert(name);
    }

    gamut_map.retain(|name, _| processed.contains(name));
    Ok(gamut_map)
}
