//! Log view state - filtered lines of the decoded document
//!
//! The text itself lives in the session; this keeps line boundaries, the
//! compiled pattern, the matching line indices and the scroll position.

use std::ops::Range;

use crate::search::{self, Matcher};

#[derive(Debug, Default)]
pub struct LogView {
    bounds: Vec<Range<usize>>,
    matcher: Option<Matcher>,
    matched: Vec<usize>,
    loaded: bool,
    /// Current pattern text
    pub pattern: String,
    /// Compile error for `pattern`
    pub error: Option<String>,
    /// First matched line shown
    pub scroll: usize,
    /// Horizontal offset in columns
    pub hscroll: u16,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the lines of a newly decoded document
    pub fn load(&mut self, text: &str) {
        self.bounds = search::line_bounds(text);
        self.loaded = true;
        self.scroll = 0;
        self.hscroll = 0;
        self.refilter(text);
    }

    /// Forget the document; the pattern is kept for the next one
    pub fn clear(&mut self) {
        self.bounds.clear();
        self.matched.clear();
        self.loaded = false;
        self.scroll = 0;
        self.hscroll = 0;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Replace the pattern and re-run the filter over `text`
    pub fn set_pattern(&mut self, pattern: &str, text: Option<&str>) {
        self.pattern = pattern.to_string();
        self.scroll = 0;
        match text {
            Some(text) if self.loaded => self.refilter(text),
            _ => self.compile(),
        }
    }

    fn compile(&mut self) {
        match Matcher::new(&self.pattern) {
            Ok(matcher) => {
                self.matcher = Some(matcher);
                self.error = None;
            }
            Err(e) => {
                self.matcher = None;
                self.error = Some(e.to_string());
            }
        }
    }

    fn refilter(&mut self, text: &str) {
        self.compile();
        self.matched = match &self.matcher {
            Some(matcher) => search::matching_lines(text, &self.bounds, matcher),
            None => Vec::new(),
        };
    }

    pub fn total_lines(&self) -> usize {
        self.bounds.len()
    }

    pub fn match_count(&self) -> usize {
        self.matched.len()
    }

    /// Active matcher, absent while the pattern is invalid
    pub fn matcher(&self) -> Option<&Matcher> {
        self.matcher.as_ref()
    }

    /// Matched lines from the scroll position, at most `height` of them
    ///
    /// Each item is the 1-based line number and the line text.
    pub fn window<'a>(&self, text: &'a str, height: usize) -> Vec<(usize, &'a str)> {
        self.matched
            .iter()
            .skip(self.scroll)
            .take(height)
            .filter_map(|&idx| {
                let range = self.bounds.get(idx)?.clone();
                text.get(range).map(|line| (idx + 1, line))
            })
            .collect()
    }

    pub fn scroll_down(&mut self, n: usize) {
        let max = self.matched.len().saturating_sub(1);
        self.scroll = (self.scroll + n).min(max);
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }

    pub fn scroll_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.scroll = self.matched.len().saturating_sub(1);
    }

    pub fn scroll_right(&mut self, n: u16) {
        self.hscroll = self.hscroll.saturating_add(n);
    }

    pub fn scroll_left(&mut self, n: u16) {
        self.hscroll = self.hscroll.saturating_sub(n);
    }
}
