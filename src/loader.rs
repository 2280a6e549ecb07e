use miette::Result;

use crate::error;
use crate::runtime::MEMORY_MAX;

/// Parse textual LS-8 source into the bytes it describes.
///
/// Each line carries at most one instruction or operand byte, written as a
/// binary literal. A `#` starts a comment running to the end of the line,
/// and blank lines are skipped.
pub fn load_source(src: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(64);

    for line in src.lines() {
        let code = match line.split_once('#') {
            Some((code, _comment)) => code,
            None => line,
        };
        let token = code.trim();
        if token.is_empty() {
            continue;
        }

        // Token is a subslice of `src`, so pointer arithmetic recovers its
        // offset for diagnostics
        let offs = token.as_ptr() as usize - src.as_ptr() as usize;
        let span = offs..offs + token.len();

        let byte = u8::from_str_radix(token, 2)
            .map_err(|e| error::load_bad_lit(span.clone(), src, e))?;
        if bytes.len() == MEMORY_MAX {
            return Err(error::load_too_long(span, src));
        }
        bytes.push(byte);
    }

    Ok(bytes)
}
