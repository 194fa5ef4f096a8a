//! Reading JSONL stream frames from a file or stdin.

use guide_protocol::{parse_frame, ErrorInfo, StreamFrame};
use std::io::{self, Read};
use std::path::Path;

pub fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => fs_err::read_to_string(path).map_err(|e| e.to_string()),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(input)
        }
    }
}

/// A frame or the parse error for its line, tagged with the 1-based line number.
pub fn frames(input: &str) -> impl Iterator<Item = (usize, Result<StreamFrame, ErrorInfo>)> + '_ {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, parse_frame(line)))
}
