//! Tile naming convention.
//!
//! Catalog tiles are named by their grid position, e.g. the BD ORTHO dalle
//! `33-2021-0410-6425-LA93-0M50` carries line `0410` at byte offset 8 and
//! row `6425` at byte offset 13. Neighbour names are synthesized from this
//! layout rather than looked up, so the codec must reproduce the catalog's
//! exact formatting:
//!
//! ```text
//! name   := prefix line infix row suffix      (ASCII)
//! line   := number of exactly `line.width` bytes at `line.offset`
//! row    := number of exactly `row.width` bytes at `row.offset`
//! number := ["-"] digit+, zero-padded to the field width
//! ```
//!
//! Every character outside the two fields is copied verbatim from a
//! template name when formatting.

use std::fmt::Write;

use crate::error::TileError;

/// Line/row multipliers of the 8 neighbours (W, E, N, S, NW, SW, NE, SE)
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, -1),
    (1, 1),
    (1, -1),
];

/// Byte range of one numeric field inside a tile name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub offset: usize,
    pub width: usize,
}

impl FieldSpan {
    pub const fn new(offset: usize, width: usize) -> Self {
        Self { offset, width }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.width
    }

    fn overlaps(&self, other: &FieldSpan) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Positional naming convention of a tile catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingConvention {
    line: FieldSpan,
    row: FieldSpan,
    step: i64,
}

impl Default for NamingConvention {
    /// BD ORTHO dalles: `DD-YYYY-LLLL-RRRR-...`, 5 km tiles indexed in km.
    fn default() -> Self {
        Self {
            line: FieldSpan::new(8, 4),
            row: FieldSpan::new(13, 4),
            step: 5,
        }
    }
}

impl NamingConvention {
    pub fn new(line: FieldSpan, row: FieldSpan, step: i64) -> Result<Self, TileError> {
        if line.width == 0 || row.width == 0 {
            return Err(TileError::InvalidConvention(
                "field widths must be positive".to_string(),
            ));
        }
        if line.overlaps(&row) {
            return Err(TileError::InvalidConvention(format!(
                "line field {}..{} overlaps row field {}..{}",
                line.offset,
                line.end(),
                row.offset,
                row.end()
            )));
        }
        if step <= 0 {
            return Err(TileError::InvalidConvention(format!(
                "step must be positive, got {}",
                step
            )));
        }

        Ok(Self { line, row, step })
    }

    pub fn line(&self) -> FieldSpan {
        self.line
    }

    pub fn row(&self) -> FieldSpan {
        self.row
    }

    /// Index distance between two adjacent tiles
    pub fn step(&self) -> i64 {
        self.step
    }

    /// Extract `(line, row)` from a tile name
    pub fn parse(&self, name: &str) -> Result<(i64, i64), TileError> {
        if !name.is_ascii() {
            return Err(TileError::malformed(name, "not ASCII"));
        }

        let line = parse_field(name, self.line, "line")?;
        let row = parse_field(name, self.row, "row")?;
        Ok((line, row))
    }

    /// Build the name of tile `(line, row)` using `template` for every
    /// non-numeric character.
    pub fn format(&self, line: i64, row: i64, template: &str) -> Result<String, TileError> {
        self.parse(template)?;

        let mut fields = [(self.line, line), (self.row, row)];
        fields.sort_by_key(|(span, _)| span.offset);

        let mut name = String::with_capacity(template.len());
        let mut cursor = 0;
        for (span, value) in fields {
            name.push_str(&template[cursor..span.offset]);
            // Writing into a String never fails
            let _ = write!(name, "{:0width$}", value, width = span.width);
            cursor = span.end();
        }
        name.push_str(&template[cursor..]);

        Ok(name)
    }

    /// Names of the 8 tiles surrounding `name`
    ///
    /// Positions whose index would overflow are skipped.
    pub fn neighbors(&self, name: &str) -> Result<Vec<String>, TileError> {
        let (line, row) = self.parse(name)?;

        let mut names = Vec::with_capacity(NEIGHBOR_OFFSETS.len());
        for (dl, dr) in NEIGHBOR_OFFSETS {
            let position = self
                .step
                .checked_mul(dl)
                .and_then(|d| line.checked_add(d))
                .zip(self.step.checked_mul(dr).and_then(|d| row.checked_add(d)));

            if let Some((l, r)) = position {
                names.push(self.format(l, r, name)?);
            }
        }

        Ok(names)
    }
}

fn parse_field(name: &str, span: FieldSpan, label: &str) -> Result<i64, TileError> {
    let text = name.get(span.offset..span.end()).ok_or_else(|| {
        TileError::malformed(
            name,
            format!("too short for {} field at {}..{}", label, span.offset, span.end()),
        )
    })?;

    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TileError::malformed(
            name,
            format!("{} field {:?} is not a number", label, text),
        ));
    }

    let value: i64 = text
        .parse()
        .map_err(|_| TileError::malformed(name, format!("{} field {:?} out of range", label, text)))?;

    // Reject spellings the formatter would not reproduce (e.g. "-000")
    if format!("{:0width$}", value, width = span.width) != text {
        return Err(TileError::malformed(
            name,
            format!("{} field {:?} is not canonically padded", label, text),
        ));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> NamingConvention {
        NamingConvention::new(FieldSpan::new(5, 4), FieldSpan::new(10, 4), 5).unwrap()
    }

    #[test]
    fn test_parse_default_convention() {
        let codec = NamingConvention::default();
        let (line, row) = codec.parse("33-2021-0410-6425-LA93-0M50").unwrap();
        assert_eq!((line, row), (410, 6425));
    }

    #[test]
    fn test_round_trip() {
        let codec = NamingConvention::default();
        for name in [
            "33-2021-0410-6425-LA93-0M50",
            "33-2021-0415-6420-LA93-0M50",
            "33-2021-1000-6400-LA93-0M50",
        ] {
            let (line, row) = codec.parse(name).unwrap();
            assert_eq!(codec.format(line, row, name).unwrap(), name);
        }
    }

    #[test]
    fn test_round_trip_negative() {
        let codec = grid();
        let name = "GRID_-010-0020";
        let (line, row) = codec.parse(name).unwrap();
        assert_eq!((line, row), (-10, 20));
        assert_eq!(codec.format(line, row, name).unwrap(), name);
    }

    #[test]
    fn test_format_pads_to_width() {
        let codec = grid();
        assert_eq!(codec.format(5, 25, "GRID_0010-0020").unwrap(), "GRID_0005-0025");
        // Too wide for the field: natural width, simply won't exist
        assert_eq!(codec.format(12345, 20, "GRID_0010-0020").unwrap(), "GRID_12345-0020");
    }

    #[test]
    fn test_format_keeps_suffix() {
        let codec = NamingConvention::default();
        let name = codec.format(415, 6420, "33-2021-0410-6425-LA93-0M50").unwrap();
        assert_eq!(name, "33-2021-0415-6420-LA93-0M50");
    }

    #[test]
    fn test_malformed_names() {
        let codec = grid();
        assert!(codec.parse("GRID_0010").is_err());
        assert!(codec.parse("GRID_00A0-0020").is_err());
        assert!(codec.parse("GRID_-000-0020").is_err());
        assert!(codec.parse("GRID_+010-0020").is_err());
        assert!(codec.parse("GRÏD_0010-0020").is_err());
        assert!(matches!(
            codec.format(1, 1, "bad"),
            Err(TileError::MalformedName { .. })
        ));
    }

    #[test]
    fn test_neighbors() {
        let codec = grid();
        let names = codec.neighbors("GRID_0010-0020").unwrap();
        assert_eq!(
            names,
            vec![
                "GRID_0005-0020",
                "GRID_0015-0020",
                "GRID_0010-0025",
                "GRID_0010-0015",
                "GRID_0005-0025",
                "GRID_0005-0015",
                "GRID_0015-0025",
                "GRID_0015-0015",
            ]
        );
    }

    #[test]
    fn test_invalid_conventions() {
        assert!(NamingConvention::new(FieldSpan::new(0, 4), FieldSpan::new(2, 4), 5).is_err());
        assert!(NamingConvention::new(FieldSpan::new(0, 0), FieldSpan::new(5, 4), 5).is_err());
        assert!(NamingConvention::new(FieldSpan::new(0, 4), FieldSpan::new(5, 4), 0).is_err());
    }

    #[test]
    fn test_row_before_line() {
        let codec =
            NamingConvention::new(FieldSpan::new(10, 4), FieldSpan::new(5, 4), 5).unwrap();
        assert_eq!(codec.parse("GRID_0020-0010").unwrap(), (10, 20));
        assert_eq!(codec.format(15, 20, "GRID_0020-0010").unwrap(), "GRID_0020-0015");
    }
}
