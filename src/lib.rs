//! Fits and writes declaratively-specified binary patches into a target
//! file: an arithmetic-progression range algebra, pointer addressability
//! gamuts, constraint propagation, and a most-constrained-variable
//! backtracking solver, wrapped in a JSON-driven CLI.

pub mod error;
pub mod filesize;
pub mod fitter;
pub mod freespace;
pub mod loader;
pub mod patch;
pub mod pointer;
pub mod propagate;
pub mod range;
pub mod target;

#[cfg(feature = "cli")]
pub mod cli;

/// Re-exports of the crate's core public types, for callers embedding the
/// fitter rather than driving it through the CLI.
pub mod prelude {
    pub use crate::error::PatchFitError;
    pub use crate::filesize::parse_filesize;
    pub use crate::fitter::{make_fit_map, FitMap};
    pub use crate::freespace::Freespace;
    pub use crate::patch::{Component, Datum, Patch};
    pub use crate::pointer::Pointer;
    pub use crate::propagate::{make_gamut_map, GamutMap, PatchMap};
    pub use crate::range::{Gamut, Int, Range};
    pub use crate::target::Target;
}
