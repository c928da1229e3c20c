//! Page range parsing.
//!
//! Converts human-written, 1-indexed expressions such as `"1-3,5"` into a
//! zero-indexed [`PageSet`]. The parser knows nothing about any document:
//! whether an index actually exists is checked later, against the real page
//! count, by the executor.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Largest number of pages a single `start-end` segment may span.
pub const MAX_RANGE_SPAN: i64 = 100_000;

/// Errors produced while parsing a page range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRangeError {
    /// Segment is not an integer or a well-formed `start-end` pair
    MalformedSegment { segment: String },

    /// Range start is greater than its end
    InvertedRange {
        segment: String,
        start: i64,
        end: i64,
    },

    /// Range spans more pages than [`MAX_RANGE_SPAN`]
    RangeTooLarge { segment: String },
}

impl PageRangeError {
    /// The offending segment text, exactly as trimmed from the input.
    pub fn segment(&self) -> &str {
        match self {
            Self::MalformedSegment { segment }
            | Self::InvertedRange { segment, .. }
            | Self::RangeTooLarge { segment } => segment,
        }
    }
}

impl fmt::Display for PageRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSegment { segment } => {
                write!(f, "invalid page segment '{}'", segment)
            }
            Self::InvertedRange {
                segment,
                start,
                end,
            } => write!(
                f,
                "invalid range segment '{}': start {} is greater than end {}",
                segment, start, end
            ),
            Self::RangeTooLarge { segment } => write!(
                f,
                "invalid range segment '{}': spans more than {} pages",
                segment, MAX_RANGE_SPAN
            ),
        }
    }
}

impl std::error::Error for PageRangeError {}

/// Ascending, duplicate-free set of zero-indexed page numbers.
///
/// An empty set is the "all pages" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet(BTreeSet<i64>);

impl PageSet {
    /// The unrestricted set (process every page).
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns true when no restriction applies.
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `page` should be processed under this filter.
    pub fn includes(&self, page: usize) -> bool {
        self.is_all() || i64::try_from(page).is_ok_and(|p| self.0.contains(&p))
    }

    /// Number of explicit members (zero for the "all pages" sentinel).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<i64> {
        self.iter().collect()
    }
}

impl FromIterator<i64> for PageSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for PageSet {
    type Err = PageRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(Some(s))
    }
}

/// Parses a page range expression into a [`PageSet`].
///
/// `None`, `""` and whitespace-only input yield the empty set.
///
/// ```
/// use pdfredact::domain::page_range;
///
/// let pages = page_range::parse(Some("1-3,5")).unwrap();
/// assert_eq!(pages.to_vec(), vec![0, 1, 2, 4]);
/// ```
pub fn parse(expr: Option<&str>) -> Result<PageSet, PageRangeError> {
    let mut pages = BTreeSet::new();

    let Some(expr) = expr else {
        return Ok(PageSet(pages));
    };

    for segment in expr.split(',').map(str::trim) {
        if segment.is_empty() {
            continue;
        }

        if segment.contains('-') {
            let (start, end) = parse_span(segment)?;
            pages.extend((start - 1)..end);
        } else {
            let page = parse_number(segment, segment)?;
            pages.insert(page - 1);
        }
    }

    Ok(PageSet(pages))
}

fn parse_span(segment: &str) -> Result<(i64, i64), PageRangeError> {
    let mut bounds = segment.split('-');
    let (Some(start), Some(end), None) = (bounds.next(), bounds.next(), bounds.next()) else {
        return Err(PageRangeError::MalformedSegment {
            segment: segment.to_string(),
        });
    };

    let start = parse_number(start, segment)?;
    let end = parse_number(end, segment)?;

    if start > end {
        return Err(PageRangeError::InvertedRange {
            segment: segment.to_string(),
            start,
            end,
        });
    }
    if end - start >= MAX_RANGE_SPAN {
        return Err(PageRangeError::RangeTooLarge {
            segment: segment.to_string(),
        });
    }

    Ok((start, end))
}

fn parse_number(text: &str, segment: &str) -> Result<i64, PageRangeError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| PageRangeError::MalformedSegment {
            segment: segment.to_string(),
        })
}
