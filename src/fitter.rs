//! The fitter: recursive, most-constrained-variable backtracking search
//! that assigns every patch in the gamut map an address (§4.6).

use std::collections::HashMap;

use crate::freespace::Freespace;
use crate::propagate::{GamutMap, PatchMap};
use crate::range::Int;

/// The final assignment of patch name to address, once a fit succeeds.
pub type FitMap = HashMap<String, Int>;

/// Runs the backtracking search described in §4.6 over every name in
/// `gamut_map`. Returns `None` if the search is exhausted without placing
/// every patch (§7's "fitting failure", distinct from a malformed input).
pub fn make_fit_map(patch_map: &PatchMap, gamut_map: &GamutMap, freespace: &Freespace) -> Option<FitMap> {
    let unfitted: Vec<String> = {
        let mut names: Vec<String> = gamut_map.keys().cloned().collect();
        names.sort();
        names
    };
    let mut fits = FitMap::new();
    if solve(patch_map, gamut_map, freespace, &unfitted, &mut fits) {
        Some(fits)
    } else {
        None
    }
}

fn solve(
    patch_map: &PatchMap,
    gamut_map: &GamutMap,
    freespace: &Freespace,
    unfitted: &[String],
    fits: &mut FitMap,
) -> bool {
    if unfitted.is_empty() {
        return true;
    }

    // Recompute candidates for every unfitted name, and pick the most
    // constrained (fewest candidates first, ties broken by name) — forward
    // checking, redone at every level since freespace shrinks on descent.
    let mut best: Option<(u128, &str)> = None;
    for name in unfitted {
        let patch = &patch_map[name];
        let candidates = freespace.candidates(patch.len(), &gamut_map[name]);
        let key = (candidates.len(), name.as_str());
        if best.map_or(true, |b| key < b) {
            best = Some(key);
        }
    }
    let chosen = best.expect("unfitted is non-empty").1.to_string();

    let patch = &patch_map[&chosen];
    let candidates = freespace.candidates(patch.len(), &gamut_map[&chosen]);
    let rest: Vec<String> = unfitted.iter().filter(|n| **n != chosen).cloned().collect();

    for candidate in candidates.iter() {
        let address = candidate as u64;
        let next_freespace = freespace.excluding(address, patch.len() as u64);
        fits.insert(chosen.clone(), candidate);
        if solve(patch_map, gamut_map, &next_freespace, &rest, fits) {
            return true;
        }
        fits.remove(&chosen);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{Component, Datum, Patch};
    use crate::pointer::Pointer;
    use crate::propagate::make_gamut_map;

    #[test]
    fn s5_simple_fit() {
        let mut patch_map = PatchMap::new();
        patch_map.insert(
            "_A".to_string(),
            Patch::new(vec![
                Component::Datum(Datum(vec![1, 2])),
                Component::Pointer(Pointer::new("B", 0, 1, 1, 1, false, false).unwrap()),
            ]),
        );
        patch_map.insert("B".to_string(), Patch::new(vec![Component::Datum(Datum(vec![9, 9, 9]))]));

        let gamut_map = make_gamut_map(&patch_map, &["_A".to_string()]).unwrap();
        let mut freespace = Freespace::new();
        freespace.add(0, 10);

        let fits = make_fit_map(&patch_map, &gamut_map, &freespace).expect("should fit");
        let a = fits["_A"];
        let b = fits["B"];
        assert!((0..10).contains(&a));
        assert!((0..10).contains(&b));
        // No overlap.
        let (a_lo, a_hi) = (a, a + 3);
        let (b_lo, b_hi) = (b, b + 3);
        assert!(a_hi <= b_lo || b_hi <= a_lo);
        // The pointer byte, once encoded, equals B's address.
        let pointer = Pointer::new("B", 0, 1, 1, 1, false, false).unwrap();
        assert_eq!(pointer.encode(b).unwrap(), vec![b as u8]);
    }

    #[test]
    fn s6_infeasible_returns_none() {
        let mut patch_map = PatchMap::new();
        patch_map.insert(
            "_x".to_string(),
            Patch::new(vec![Component::Datum(Datum(vec![0; 4]))]),
        );
        patch_map.insert(
            "_y".to_string(),
            Patch::new(vec![Component::Datum(Datum(vec![0; 4]))]),
        );
        let gamut_map = make_gamut_map(&patch_map, &["_x".to_string(), "_y".to_string()]).unwrap();
        let mut freespace = Freespace::new();
        freespace.add(0, 6);

        assert!(make_fit_map(&patch_map, &gamut_map, &freespace).is_none());
    }

    #[test]
    fn s7_zero_size_label_abuts_neighbor() {
        let mut patch_map = PatchMap::new();
        patch_map.insert(
            "_label".to_string(),
            Patch::new(vec![Component::Datum(Datum(Vec::new()))]),
        );
        patch_map.insert(
            "_data".to_string(),
            Patch::new(vec![Component::Datum(Datum(vec![1, 2, 3, 4]))]),
        );
        let gamut_map =
            make_gamut_map(&patch_map, &["_label".to_string(), "_data".to_string()]).unwrap();
        // A freespace interval wider than `_data` alone, so that after the
        // more-constrained zero-size label claims its placeholder address
        // (a no-op exclusion) there is still room left for `_data`.
        let mut freespace = Freespace::new();
        freespace.add(0, 8);

        let fits = make_fit_map(&patch_map, &gamut_map, &freespace).expect("should fit");
        assert!(fits.contains_key("_label"));
        assert_eq!(fits["_data"], 0);
    }

    #[test]
    fn determinism_across_runs() {
        let mut patch_map = PatchMap::new();
        for name in ["_a", "_b", "_c"] {
            patch_map.insert(name.to_string(), Patch::new(vec![Component::Datum(Datum(vec![0; 3]))]));
        }
        let roots: Vec<String> = ["_a", "_b", "_c"].iter().map(|s| s.to_string()).collect();
        let gamut_map = make_gamut_map(&patch_map, &roots).unwrap();
        let mut freespace = Freespace::new();
        freespace.add(0, 9);

        let first = make_fit_map(&patch_map, &gamut_map, &freespace);
        let second = make_fit_map(&patch_map, &gamut_map, &freespace);
        assert_eq!(first, second);
    }
}
