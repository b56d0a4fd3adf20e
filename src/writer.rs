//! Serialization of a whole graph back to GFA text.
//!
//! Single records already implement `Display`; this module writes
//! the graph with one line per record, in the order header, segments,
//! links, containments, paths. Virtual segments and links have no
//! line of their own and are skipped.

use std::fmt::{self, Write};

use crate::graph::Graph;

fn write_line<T: fmt::Display, W: Write>(line: &T, stream: &mut W) -> fmt::Result {
    writeln!(stream, "{}", line)
}

/// Write every line of the graph to the stream.
pub fn write_gfa<W: Write>(graph: &Graph, stream: &mut W) -> fmt::Result {
    if !graph.header().optional.is_empty() {
        write_line(graph.header(), stream)?;
    }
    for (_, slot) in graph.segment_slots() {
        if !slot.is_virtual {
            write_line(&slot.segment, stream)?;
        }
    }
    for (id, slot) in graph.link_slots() {
        if !slot.is_virtual {
            let link = graph.link_line(id).map_err(|_| fmt::Error)?;
            write_line(&link, stream)?;
        }
    }
    for id in graph.containment_ids() {
        let containment = graph.containment_line(id).map_err(|_| fmt::Error)?;
        write_line(&containment, stream)?;
    }
    for path in graph.paths() {
        write_line(path, stream)?;
    }
    Ok(())
}

pub fn gfa_string(graph: &Graph) -> String {
    let mut result = String::new();
    // writing to a String can't fail
    let _ = write_gfa(graph, &mut result);
    result
}
