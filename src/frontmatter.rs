//! Splits a source file into its YAML header block and its markdown body.
//!
//! The header block is optional and untyped at this layer: whatever maps out
//! of the YAML is handed to [`crate::metadata`] as a [`Mapping`]. A header
//! that is malformed never fails the file; it is logged and treated as empty.

use serde_yaml::{Mapping, Value};
use tracing::warn;

const FENCE: &str = "---";

/// A source file split into header and body.
#[derive(Debug, PartialEq)]
pub struct Document<'a> {
    /// The parsed header block. Empty when the file has no header or the
    /// header isn't a YAML mapping.
    pub header: Mapping,

    /// The markdown following the closing fence (or the whole input when
    /// there is no header).
    pub body: &'a str,
}

/// Splits `input` into a [`Document`]. `source` names the file in log output.
pub fn split<'a>(source: &str, input: &'a str) -> Document<'a> {
    match fence_indices(input) {
        None => Document {
            header: Mapping::new(),
            body: input,
        },
        Some((yaml_start, yaml_stop, body_start)) => Document {
            header: parse_header(source, &input[yaml_start..yaml_stop]),
            body: &input[body_start..],
        },
    }
}

// Returns (yaml_start, yaml_stop, body_start) when `input` opens with a fence
// line and a matching closing fence line exists.
fn fence_indices(input: &str) -> Option<(usize, usize, usize)> {
    let mut lines = lines_with_offsets(input);
    match lines.next() {
        Some((_, line)) if is_fence(line) => {}
        _ => return None,
    }

    let yaml_start = input.find('\n')? + 1;
    for (offset, line) in lines {
        if is_fence(line) {
            let body_start = match input[offset..].find('\n') {
                Some(i) => offset + i + 1,
                None => input.len(),
            };
            return Some((yaml_start, offset, body_start));
        }
    }
    None
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

fn lines_with_offsets(input: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    input.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (start, line)
    })
}

fn parse_header(source: &str, yaml: &str) -> Mapping {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mapping)) => mapping,
        Ok(Value::Null) => Mapping::new(),
        Ok(_) => {
            warn!("{}: header is not a key-value block, ignoring it", source);
            Mapping::new()
        }
        Err(err) => {
            warn!("{}: malformed header: {}", source, err);
            Mapping::new()
        }
    }
}
