//! Patches: ordered sequences of [`Datum`] and [`Pointer`] components that
//! form one contiguous write unit (§4.3).

use std::collections::HashMap;

use crate::error::PatchFitError;
use crate::pointer::Pointer;
use crate::range::{Gamut, Int};

/// A fixed byte sequence embedded in a patch. Contributes length and fixed
/// bytes; imposes no placement constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datum(pub Vec<u8>);

impl Datum {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One element of a [`Patch`]: either a literal [`Datum`] or a [`Pointer`]
/// whose encoded value depends on where some other patch ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Datum(Datum),
    Pointer(Pointer),
}

impl Component {
    pub fn len(&self) -> usize {
        match self {
            Component::Datum(d) => d.len(),
            Component::Pointer(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computes the bytes this component contributes, given the final
    /// placement of every patch. Only a [`Component::Pointer`] can fail,
    /// and only if its referent is missing from `fit_map`.
    fn data(&self, fit_map: &HashMap<String, Int>) -> Result<Vec<u8>, PatchFitError> {
        match self {
            Component::Datum(d) => Ok(d.0.clone()),
            Component::Pointer(p) => {
                let address = *fit_map
                    .get(p.referent())
                    .ok_or_else(|| PatchFitError::MissingReferent(p.referent().to_string()))?;
                p.encode(address)
            }
        }
    }
}

/// A named, ordered sequence of components forming one contiguous write
/// unit. `len(Patch) = Σ len(component)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    components: Vec<Component>,
}

impl Patch {
    pub fn new(components: Vec<Component>) -> Self {
        Patch { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.iter().map(Component::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies every Pointer component's constraint to `gamut_map`, missing
    /// entries defaulting to &#8868;, and enqueues any referent not already
    /// `processed` or already queued in `to_process`.
    pub fn constrain(
        &self,
        gamut_map: &mut HashMap<String, Gamut>,
        processed: &std::collections::HashSet<String>,
        to_process: &mut Vec<String>,
    ) {
        for component in &self.components {
            if let Component::Pointer(p) = component {
                p.propagate(gamut_map);
                if !processed.contains(p.referent()) && !to_process.iter().any(|n| n == p.referent())
                {
                    to_process.push(p.referent().to_string());
                }
            }
        }
    }

    /// Writes this patch's bytes into `buffer` starting at `base_address`,
    /// zero-extending the buffer if `base_address` is past its current end.
    pub fn write_into(
        &self,
        buffer: &mut Vec<u8>,
        base_address: u64,
        fit_map: &HashMap<String, Int>,
    ) -> Result<(), PatchFitError> {
        let base_address = base_address as usize;
        if base_address > buffer.len() {
            buffer.resize(base_address, 0);
        }
        let mut cursor = base_address;
        for component in &self.components {
            let data = component.data(fit_map)?;
            let end = cursor + data.len();
            if end > buffer.len() {
                buffer.resize(end, 0);
            }
            buffer[cursor..end].copy_from_slice(&data);
            cursor = end;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(referent: &str) -> Pointer {
        Pointer::new(referent, 0, 1, 1, 1, false, false).unwrap()
    }

    #[test]
    fn length_sums_components() {
        let patch = Patch::new(vec![
            Component::Datum(Datum(vec![1, 2, 3])),
            Component::Pointer(ptr("b")),
        ]);
        assert_eq!(patch.len(), 4);
    }

    #[test]
    fn write_into_zero_fills_and_places_bytes() {
        let patch = Patch::new(vec![Component::Datum(Datum(vec![0xAA, 0xBB]))]);
        let mut buffer = Vec::new();
        let fit_map = HashMap::new();
        patch.write_into(&mut buffer, 4, &fit_map).unwrap();
        assert_eq!(buffer, vec![0, 0, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn write_into_encodes_pointer_from_fit_map() {
        let patch = Patch::new(vec![
            Component::Datum(Datum(vec![0xFF])),
            Component::Pointer(ptr("target")),
        ]);
        let mut buffer = Vec::new();
        let mut fit_map = HashMap::new();
        fit_map.insert("target".to_string(), 200i128);
        patch.write_into(&mut buffer, 0, &fit_map).unwrap();
        assert_eq!(buffer, vec![0xFF, 200]);
    }

    #[test]
    fn write_into_fails_on_missing_referent() {
        let patch = Patch::new(vec![Component::Pointer(ptr("ghost"))]);
        let mut buffer = Vec::new();
        let fit_map = HashMap::new();
        assert!(matches!(
            patch.write_into(&mut buffer, 0, &fit_map),
            Err(PatchFitError::MissingReferent(name)) if name == "ghost"
        ));
    }

    #[test]
    fn s7_zero_size_datum_consumes_no_space() {
        let label = Patch::new(vec![Component::Datum(Datum(Vec::new()))]);
        assert_eq!(label.len(), 0);
        assert!(label.is_empty());
    }

    #[test]
    fn constrain_enqueues_new_referents_once() {
        let patch = Patch::new(vec![
            Component::Pointer(ptr("a")),
            Component::Pointer(ptr("a")),
        ]);
        let mut gamut_map = HashMap::new();
        let processed = std::collections::HashSet::new();
        let mut to_process = Vec::new();
        patch.constrain(&mut gamut_map, &processed, &mut to_process);
        assert_eq!(to_process, vec!["a".to_string()]);
        assert!(gamut_map.contains_key("a"));
    }
}
