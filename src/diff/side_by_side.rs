//! Side-by-side diff line interpretation
//!
//! `diff --side-by-side --width=W` places the relationship marker of every
//! changed line at a fixed byte column, `W/2 - 1`. Nothing else in the
//! output is structured, so a character there only counts as a marker when
//! it is whitespace-flanked; the same character inside content is ignored.
//!
//! Columns are byte offsets. Output containing multi-byte characters before
//! the separator can shift the marker; such lines are treated as context.

use crate::config::SideBySideLayout;
use crate::report::html_escape;

/// Relationship between the left and right columns of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `|`: the line differs on both sides
    Changed,
    /// `<`: the line exists only on the left (base)
    LeftOnly,
    /// `>`: the line exists only on the right (head)
    RightOnly,
}

impl Marker {
    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'|' => Some(Self::Changed),
            b'<' => Some(Self::LeftOnly),
            b'>' => Some(Self::RightOnly),
            _ => None,
        }
    }

    /// The marker character as printed by diff
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Changed => '|',
            Self::LeftOnly => '<',
            Self::RightOnly => '>',
        }
    }
}

/// A line split at a confirmed marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedLine<'a> {
    /// Text before the marker column
    pub left: &'a str,
    /// The marker found at the column
    pub marker: Marker,
    /// Text after the marker column
    pub right: &'a str,
    /// Byte index of the marker
    pub column: usize,
}

const fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Locate a true marker in `line`, if there is one.
#[must_use]
pub fn find_marker<'a>(line: &'a str, layout: &SideBySideLayout) -> Option<MarkedLine<'a>> {
    let bytes = line.as_bytes();
    let column = layout.marker_column();
    if column == 0 || column >= bytes.len() {
        return None;
    }

    let marker = Marker::from_byte(bytes[column])?;
    if !is_blank(bytes[column - 1]) {
        return None;
    }
    match bytes.get(column + 1) {
        Some(&next) if is_blank(next) => {}
        None if marker != Marker::Changed => {}
        _ => return None,
    }

    // The marker byte is ASCII, so both slice points are char boundaries.
    Some(MarkedLine {
        left: &line[..column],
        marker,
        right: &line[column + 1..],
        column,
    })
}

/// Keep only the lines carrying a true marker, preserving their order.
#[must_use]
pub fn suppress_unchanged(text: &str, layout: &SideBySideLayout) -> String {
    text.split('\n')
        .filter(|line| find_marker(line, layout).is_some())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one line as HTML, coloring the sides around a true marker.
///
/// Lines without a marker (headers, context) are escaped unchanged.
#[must_use]
pub fn line_to_html(line: &str, layout: &SideBySideLayout) -> String {
    let Some(marked) = find_marker(line, layout) else {
        return html_escape(line);
    };

    let column = marked.column;
    match marked.marker {
        Marker::Changed => format!(
            "<span class=\"left\">{}</span><span class=\"sep\">|</span><span class=\"right\">{}</span>",
            html_escape(marked.left),
            html_escape(marked.right)
        ),
        Marker::LeftOnly => format!(
            "<span class=\"left\">{}</span>{}",
            html_escape(&line[..=column]),
            html_escape(marked.right)
        ),
        Marker::RightOnly => format!(
            "{}<span class=\"right\">{}</span>",
            html_escape(marked.left),
            html_escape(&line[column..])
        ),
    }
}

/// Render a whole side-by-side diff as HTML lines.
#[must_use]
pub fn to_html(text: &str, layout: &SideBySideLayout) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.split('\n')
        .map(|line| line_to_html(line, layout))
        .collect::<Vec<_>>()
        .join("\n")
}
