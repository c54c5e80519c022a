//! Shared frame for the line-oriented instance format.
//!
//! Outside a map block, blank lines and lines starting with `#` are
//! skipped, and unknown directives warn and are ignored. Map rows are taken
//! verbatim (leading spaces are floor), exactly `H` of them.

use crate::error::{Result, SolveError};

/// Default upper bound on either grid dimension.
pub const MAX_DIM: usize = 33;

/// Cursor over instance text with directive/map-row access.
pub struct InstanceReader<'a> {
    lines: std::str::Lines<'a>,
    line_no: usize,
}

/// A directive line split into its keyword and argument tail.
pub struct DirectiveLine<'a> {
    /// 1-based source line number, for diagnostics.
    pub line_no: usize,
    /// First whitespace-delimited word.
    pub keyword: &'a str,
    /// Remainder of the line, trimmed.
    pub rest: &'a str,
}

impl<'a> InstanceReader<'a> {
    /// Wraps the full instance text.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
        }
    }

    /// Next directive line, skipping blanks and `#` comments.
    pub fn next_directive(&mut self) -> Option<DirectiveLine<'a>> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
                Some((k, r)) => (k, r.trim()),
                None => (trimmed, ""),
            };
            return Some(DirectiveLine {
                line_no: self.line_no,
                keyword,
                rest,
            });
        }
    }

    /// Takes the next `h` lines verbatim as map rows, each at most `w`
    /// characters; shorter rows are implicitly space-padded by the caller.
    pub fn take_map_rows(&mut self, w: usize, h: usize) -> Result<Vec<&'a str>> {
        let mut rows = Vec::with_capacity(h);
        for _ in 0..h {
            let line = self.lines.next().ok_or_else(|| SolveError::Parse {
                line: self.line_no + 1,
                msg: format!("map block ended after {} of {h} rows", rows.len()),
            })?;
            self.line_no += 1;
            if line.chars().count() > w {
                return Err(SolveError::Parse {
                    line: self.line_no,
                    msg: format!("map row longer than declared width {w}"),
                });
            }
            rows.push(line);
        }
        Ok(rows)
    }

    /// Line number of the most recently consumed line.
    #[inline]
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

/// Parses `size W H` arguments and enforces the dimension limit.
pub fn parse_size(d: &DirectiveLine<'_>) -> Result<(usize, usize)> {
    let (w, h) = parse_pair(d)?;
    if w == 0 || h == 0 || w > MAX_DIM || h > MAX_DIM {
        return Err(SolveError::Parse {
            line: d.line_no,
            msg: format!("size {w} {h} outside 1..={MAX_DIM}"),
        });
    }
    Ok((w, h))
}

/// Parses two whitespace-separated unsigned integers.
pub fn parse_pair(d: &DirectiveLine<'_>) -> Result<(usize, usize)> {
    let mut it = d.rest.split_whitespace();
    let parse = |tok: Option<&str>| -> Result<usize> {
        tok.and_then(|t| t.parse().ok()).ok_or_else(|| SolveError::Parse {
            line: d.line_no,
            msg: format!("`{}` expects two integer arguments", d.keyword),
        })
    };
    let a = parse(it.next())?;
    let b = parse(it.next())?;
    Ok((a, b))
}

/// Standard rejection for a directive that appears before `size`.
pub fn missing_size(d: &DirectiveLine<'_>) -> SolveError {
    SolveError::Parse {
        line: d.line_no,
        msg: format!("`{}` before `size`", d.keyword),
    }
}

/// Standard warn-and-skip for unknown directives.
pub fn warn_unknown(d: &DirectiveLine<'_>) {
    tracing::warn!(
        line = d.line_no,
        keyword = d.keyword,
        "unknown directive skipped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let text = "# header\n\nsize 5 3\nmap\n#####\n#@$.#\n#####\n";
        let mut r = InstanceReader::new(text);
        let d = r.next_directive().unwrap();
        assert_eq!(d.keyword, "size");
        assert_eq!(parse_size(&d).unwrap(), (5, 3));
        let d = r.next_directive().unwrap();
        assert_eq!(d.keyword, "map");
        let rows = r.take_map_rows(5, 3).unwrap();
        assert_eq!(rows, vec!["#####", "#@$.#", "#####"]);
    }

    #[test]
    fn map_rows_are_verbatim() {
        let text = "size 4 1\nmap\n  #\n";
        let mut r = InstanceReader::new(text);
        r.next_directive();
        r.next_directive();
        let rows = r.take_map_rows(4, 1).unwrap();
        assert_eq!(rows, vec!["  #"]);
    }

    #[test]
    fn truncated_map_is_an_error() {
        let text = "size 3 2\nmap\n###\n";
        let mut r = InstanceReader::new(text);
        r.next_directive();
        r.next_directive();
        assert!(r.take_map_rows(3, 2).is_err());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let text = "size 40 2\n";
        let mut r = InstanceReader::new(text);
        let d = r.next_directive().unwrap();
        assert!(parse_size(&d).is_err());
    }
}
