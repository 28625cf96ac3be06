//! Shared helpers consumed by `flowc-compiler` and `flowc-controller`.
//!
//! Kept deliberately small and dependency-light: no registry access, no
//! async runtime. Everything here is a pure function or a small trait with
//! a default and a deterministic test double.

pub mod id;
pub mod output_path;
pub mod yield_to;

pub use id::{IdGenerator, SequentialIdGenerator, TimeSortableIdGenerator};
pub use output_path::{make_output_path, merge_to_dir};
pub use yield_to::yield_to;
