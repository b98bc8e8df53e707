//! Page range parsing.
//!
//! User text such as `"1, 3-5, 8"` becomes a [`PageSet`]: ascending, de-duplicated page
//! numbers, clamped to the document when its page count is known. Parsing never fails;
//! tokens that are neither a number nor an `a-b` range are skipped.

use std::collections::BTreeSet;
use std::fmt;

/// Upper bound for range expansion when the document's page count is unknown.
pub const MAX_PAGE: u32 = 100_000;

/// Ascending set of 1-based page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet {
    pages: BTreeSet<u32>,
}

impl PageSet {
    pub fn parse(spec: &str, total_pages: Option<u32>) -> Self {
        let last = total_pages.unwrap_or(MAX_PAGE);
        let mut pages = BTreeSet::new();
        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match parse_token(token) {
                Some(Token::Single(page)) => {
                    pages.insert(page);
                }
                Some(Token::Range(start, end)) => {
                    // Clamp before expanding so "1-4000000000" stays cheap.
                    pages.extend(start..=end.min(last));
                }
                None => tracing::trace!(token, "Skipping malformed page range token"),
            }
        }
        pages.remove(&0);
        if let Some(total) = total_pages {
            pages.retain(|&p| p <= total);
        }
        Self { pages }
    }

    /// `{1, 3, 5, ...}` up to `total`.
    pub fn odd(total: u32) -> Self {
        Self {
            pages: (1..=total).step_by(2).collect(),
        }
    }

    /// `{2, 4, 6, ...}` up to `total`.
    pub fn even(total: u32) -> Self {
        Self {
            pages: (2..=total).step_by(2).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for PageSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut pages: BTreeSet<u32> = iter.into_iter().collect();
        pages.remove(&0);
        Self { pages }
    }
}

/// Comma-joined ascending page numbers, the form the print queue accepts.
impl fmt::Display for PageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for page in &self.pages {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{page}")?;
            first = false;
        }
        Ok(())
    }
}

/// What a caller asked for: every page, or an explicit subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Pages(PageSet),
}

impl PageSelection {
    /// Absent or blank text selects every page; anything else is parsed, even when
    /// nothing survives.
    pub fn from_spec(spec: Option<&str>, total_pages: Option<u32>) -> Self {
        match spec.map(str::trim).filter(|s| !s.is_empty()) {
            None => PageSelection::All,
            Some(spec) => PageSelection::Pages(PageSet::parse(spec, total_pages)),
        }
    }
}

enum Token {
    Single(u32),
    Range(u32, u32),
}

fn parse_token(token: &str) -> Option<Token> {
    if let Ok(page) = token.parse::<u32>() {
        return Some(Token::Single(page));
    }
    let (start, end) = token.split_once('-')?;
    let start = start.trim().parse::<u32>().ok()?;
    let end = end.trim().parse::<u32>().ok()?;
    (start <= end).then_some(Token::Range(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &str, total: Option<u32>) -> Vec<u32> {
        PageSet::parse(spec, total).to_vec()
    }

    #[test]
    fn test_mixed_singles_and_ranges() {
        assert_eq!(parse("1, 3-5, 8", None), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_inverted_range_is_dropped() {
        assert_eq!(parse("5-3", None), Vec::<u32>::new());
        assert_eq!(parse("5-3, 7", None), vec![7]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(parse("2,2,2", None), vec![2]);
        assert_eq!(parse("1-3,2-4", None), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_order_tokens_come_out_ascending() {
        assert_eq!(parse("8,1,3-5", None), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_out_of_bounds_dropped_when_total_known() {
        assert_eq!(parse("1,3,99", Some(10)), vec![1, 3]);
        assert_eq!(parse("8-12", Some(10)), vec![8, 9, 10]);
    }

    #[test]
    fn test_malformed_tokens_are_skipped() {
        assert_eq!(parse("abc, 2, 4-x, -3, 1-, 6", None), vec![2, 6]);
        assert_eq!(parse(",,, ", None), Vec::<u32>::new());
        assert_eq!(parse("0, 0-2", None), vec![1, 2]);
        assert_eq!(parse(" 3 - 4 ", None), vec![3, 4]);
    }

    #[test]
    fn test_huge_range_with_total_is_clamped() {
        assert_eq!(parse("2-4000000000", Some(3)), vec![2, 3]);
    }

    #[test]
    fn test_unknown_total_caps_range_expansion_at_max_page() {
        let set = PageSet::parse("99999-4000000000", None);
        assert_eq!(set.to_vec(), vec![99_999, 100_000]);
    }

    #[test]
    fn test_unknown_total_keeps_large_single_pages() {
        assert_eq!(parse("150000", None), vec![150_000]);
        assert_eq!(parse("3, 150000, 1-2", None), vec![1, 2, 3, 150_000]);
        assert_eq!(parse("150000", Some(10)), Vec::<u32>::new());
    }

    #[test]
    fn test_display_is_comma_joined() {
        assert_eq!(PageSet::parse("5,1-3", None).to_string(), "1,2,3,5");
        assert_eq!(PageSet::default().to_string(), "");
    }

    #[test]
    fn test_odd_even_partition() {
        for n in 0..=25u32 {
            let odd = PageSet::odd(n);
            let even = PageSet::even(n);
            assert_eq!(odd.len(), n.div_ceil(2) as usize, "odd count for {n}");
            assert!(odd.iter().all(|p| p % 2 == 1));
            assert!(even.iter().all(|p| p % 2 == 0));
            let mut union: Vec<u32> = odd.iter().chain(even.iter()).collect();
            union.sort_unstable();
            assert_eq!(union, (1..=n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_selection_distinguishes_absent_from_empty() {
        assert_eq!(PageSelection::from_spec(None, Some(4)), PageSelection::All);
        assert_eq!(PageSelection::from_spec(Some("  "), Some(4)), PageSelection::All);
        let empty = PageSelection::from_spec(Some("9"), Some(4));
        assert_eq!(empty, PageSelection::Pages(PageSet::default()));
    }
}
