//! Content search - line-wise regex filtering of decoded text
//!
//! Lines split on `\n` (a trailing `\r` is dropped, no trailing empty line).
//! A bare `\r` is not a line break; it stays inside the line.
//! A line matches if the pattern is found anywhere in it.

use std::ops::Range;

use regex::Regex;

use crate::error::Result;

/// Compiled search pattern; an empty pattern matches every line
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    regex: Option<Regex>,
}

impl Matcher {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            regex: Some(Regex::new(pattern)?),
        })
    }

    /// True when no pattern is active
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.as_ref().map_or(true, |re| re.is_match(line))
    }

    /// Byte ranges of every match in `line`, for highlighting
    pub fn spans(&self, line: &str) -> Vec<Range<usize>> {
        match &self.regex {
            Some(re) => re
                .find_iter(line)
                .filter(|m| !m.is_empty())
                .map(|m| m.range())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Lines that passed a filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMatches<'a> {
    pub lines: Vec<&'a str>,
}

impl<'a> LineMatches<'a> {
    pub fn count(&self) -> usize {
        self.lines.len()
    }
}

/// Filter `text` to the lines matching `pattern`
pub fn filter_lines<'a>(text: &'a str, pattern: &str) -> Result<LineMatches<'a>> {
    let matcher = Matcher::new(pattern)?;
    Ok(LineMatches {
        lines: text.lines().filter(|line| matcher.is_match(line)).collect(),
    })
}

/// Byte ranges of each line in `text`, using the same splitting rules as
/// [`str::lines`]
pub fn line_bounds(text: &str) -> Vec<Range<usize>> {
    let mut bounds = Vec::new();
    let mut start = 0;
    for chunk in text.split_inclusive('\n') {
        let mut line = chunk.strip_suffix('\n').unwrap_or(chunk);
        line = line.strip_suffix('\r').unwrap_or(line);
        bounds.push(start..start + line.len());
        start += chunk.len();
    }
    bounds
}

/// Indices into `bounds` of the lines matching `matcher`
pub fn matching_lines(text: &str, bounds: &[Range<usize>], matcher: &Matcher) -> Vec<usize> {
    bounds
        .iter()
        .enumerate()
        .filter(|(_, range)| matcher.is_match(&text[(*range).clone()]))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrowseError;

    const SAMPLE: &str = "ok\nError: x\n警告: y\ndone\n";

    #[test]
    fn test_alternation_with_multibyte() {
        let result = filter_lines(SAMPLE, "Error|警告").unwrap();
        assert_eq!(result.lines, vec!["Error: x", "警告: y"]);
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn test_bare_carriage_return_stays_in_line() {
        let result = filter_lines("a\rb\r\nc\n", "").unwrap();
        assert_eq!(result.lines, vec!["a\rb", "c"]);
        assert_eq!(line_bounds("a\rb\r\nc\n").len(), 2);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = filter_lines(SAMPLE, "(").unwrap_err();
        assert!(matches!(err, BrowseError::Pattern(_)));
    }

    #[test]
    fn test_empty_pattern_returns_everything() {
        let result = filter_lines(SAMPLE, "").unwrap();
        assert_eq!(result.count(), 4);
        assert_eq!(result.lines, vec!["ok", "Error: x", "警告: y", "done"]);
    }

    #[test]
    fn test_unanchored_and_tab_escape() {
        let text = "a\tABC\nABC\nxABCx";
        let result = filter_lines(text, r"\tABC").unwrap();
        assert_eq!(result.lines, vec!["a\tABC"]);

        let result = filter_lines(text, "BC").unwrap();
        assert_eq!(result.count(), 3);
    }

    #[test]
    fn test_line_bounds_match_lines() {
        for text in ["", "a", "a\n", "a\r\nb", "a\n\nb\n", "\n", "x\r\n\r\n"] {
            let bounds = line_bounds(text);
            let from_bounds: Vec<&str> = bounds.iter().map(|r| &text[r.clone()]).collect();
            let expected: Vec<&str> = text.lines().collect();
            assert_eq!(from_bounds, expected, "text {:?}", text);
        }
    }

    #[test]
    fn test_matching_lines_indices() {
        let bounds = line_bounds(SAMPLE);
        let matcher = Matcher::new("o").unwrap();
        assert_eq!(matching_lines(SAMPLE, &bounds, &matcher), vec![0, 1, 3]);

        let all = matching_lines(SAMPLE, &bounds, &Matcher::default());
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_spans() {
        let matcher = Matcher::new("ab").unwrap();
        assert_eq!(matcher.spans("xabyab"), vec![1..3, 4..6]);
        // Empty matches are not highlighted
        let matcher = Matcher::new("z*").unwrap();
        assert!(matcher.spans("abc").is_empty());
        assert!(Matcher::default().spans("abc").is_empty());
    }
}
