use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{FilterError, Result};

/// Split a reader into lines, replacing invalid UTF-8 with U+FFFD
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn lossy_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').flat_map(|chunk| {
        let lines: Vec<io::Result<String>> = match chunk {
            Ok(mut bytes) => {
                if bytes.last() == Some(&b'\r') {
                    bytes.pop();
                }
                bytes
                    .split(|&b| b == b'\r')
                    .map(|line| Ok(String::from_utf8_lossy(line).into_owned()))
                    .collect()
            }
            Err(e) => vec![Err(e)],
        };
        lines
    })
}

/// Open a file for line-by-line reading
pub fn open_lines(path: &Path) -> Result<impl Iterator<Item = io::Result<String>> + use<>> {
    let file = File::open(path).map_err(|source| FilterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(lossy_lines(BufReader::new(file)))
}
