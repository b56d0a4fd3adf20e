//! Typed GFA 1 records and an editable assembly graph.
//!
//! Lines are parsed into the records of [`gfa`], with their tags kept
//! in [`optfields`]. A [`graph::Graph`] owns segments, links,
//! containments and paths, storing every link in a single canonical
//! orientation, and supports the usual edits: deleting and renaming
//! segments, removing links, and multiplying segments.

pub mod cigar;
pub mod gfa;
pub mod graph;
pub mod optfields;
pub mod parser;
pub mod writer;

pub use crate::graph::{CopyNames, Graph, GraphConfig};
pub use crate::parser::{GFAError, GFAResult};
