//! The crate's typed error enum, covering THE CORE's own fallible
//! operations. I/O and JSON-decode failures at the CLI boundary are wrapped
//! in `anyhow::Context` instead (see `src/cli`), matching the teacher's
//! split between a library-level typed error and a binary-level
//! `anyhow::Result`.

use crate::range::Int;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchFitError {
    /// A field in a patch, defaults, or freespace file had the wrong shape
    /// or type.
    #[error("invalid value for `{field}`: {message}")]
    Schema { field: String, message: String },

    /// A Datum string used an encoding prefix other than `@`, `=`, or plain
    /// hex.
    #[error("unrecognized datum encoding in {0:?}")]
    UnknownDatumPrefix(String),

    /// A Pointer's `size` field was negative.
    #[error("pointer size cannot be negative")]
    NegativeSize,

    /// A Pointer's `align` field was not a power of two.
    #[error("align must be a power of two, got {0}")]
    AlignNotPowerOfTwo(i64),

    /// `referent` was supplied in a defaults file, where it is forbidden.
    #[error("default value for `referent` may not be specified")]
    ReferentInDefaults,

    /// A pointer's referent does not name any patch in the patch map.
    #[error("patch {0:?} is referenced but not defined")]
    MissingReferent(String),

    /// An address was outside a pointer's gamut bounds.
    #[error("address {address} for {name:?} is out of bounds")]
    AddressOutOfGamut { name: String, address: Int },

    /// An address was within a pointer's gamut bounds but not on a valid
    /// step (alignment/stride violation).
    #[error("address {address} for {name:?} is improperly aligned")]
    MisalignedAddress { name: String, address: Int },

    /// The solver exhausted its search without placing every patch.
    #[error("fitting failed: no placement satisfies every constraint")]
    FittingFailed,

    /// A `--limit`/filesize-suffix string could not be parsed.
    #[error("invalid filesize specification {0:?}")]
    InvalidFilesize(String),
}
