//! Serialization surfaces for learned weights.
//!
//! A versioned, checksummed container for n-tuple network weights, plus a
//! reader/writer for the legacy checksum-free layout. Both share the same
//! per-table record encoding (`write_record` / `read_record`).

mod weights;

pub use weights::{
    WeightFileError,
    write_record,
    read_record,
    encode_weights,
    decode_weights,
    encode_legacy_weights,
    decode_legacy_weights,
    write_weights_to_path,
    read_weights_from_path,
    write_legacy_weights_to_path,
    read_legacy_weights_from_path,
};
