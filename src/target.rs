//! `Target`: the file being patched, bundled with the bookkeeping needed to
//! drive a single patching run — its growable byte buffer and its current
//! [`Freespace`]. Grounded in `original_source/src/json_bpatch/target.py`.

use std::collections::HashMap;

use log::{debug, info};

use crate::error::PatchFitError;
use crate::fitter::make_fit_map;
use crate::freespace::Freespace;
use crate::propagate::{make_gamut_map, PatchMap};

/// Owns the bytes being patched and the freespace available for placement
/// across one run of load → fit → write → save.
pub struct Target {
    data: Vec<u8>,
    free: Freespace,
}

impl Target {
    pub fn new(data: Vec<u8>, free: Freespace) -> Self {
        Target { data, free }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn freespace(&self) -> &Freespace {
        &self.free
    }

    /// Appends `size` bytes of virtual freespace starting at the current
    /// end of the buffer, for the `--limit` CLI option.
    pub fn extend_limit(&mut self, size: u64) {
        let end = self.data.len() as u64;
        if size > end {
            self.free.add(end, size - end);
        }
    }

    /// Runs propagate → fit → write over `patch_map`, given the roots that
    /// must be included. Returns the name → address fit map on success.
    pub fn write_patch(
        &mut self,
        patch_map: &PatchMap,
        roots: &[String],
    ) -> Result<HashMap<String, i128>, PatchFitError> {
        info!("propagating constraints from {} root(s)", roots.len());
        let gamut_map = make_gamut_map(patch_map, roots)?;

        info!("fitting {} patch(es) into freespace", gamut_map.len());
        let fit_map = make_fit_map(patch_map, &gamut_map, &self.free).ok_or(PatchFitError::FittingFailed)?;

        // Ascending address order keeps the buffer monotone while growing,
        // per §4.7.
        let mut ordered: Vec<&String> = fit_map.keys().collect();
        ordered.sort_by_key(|name| fit_map[*name]);

        info!("writing {} patch(es)", ordered.len());
        for name in ordered {
            let address = fit_map[name];
            let patch = &patch_map[name];
            debug!("placing {name:?} at {address} ({} bytes)", patch.len());
            patch.write_into(&mut self.data, address as u64, &fit_map)?;
            self.free.remove(address as u64, patch.len() as u64);
        }

        Ok(fit_map)
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
