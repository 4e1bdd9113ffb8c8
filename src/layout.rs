//! Atlas layout serialization
//!
//! Text, line-oriented, fixed field order:
//!
//! ```text
//! line 0: page count
//! line 1: glyph count
//! then:   <char> <page> <x> <y> <w> <h> <yOffset> [<suppressColouring>]
//! ```
//!
//! The trailing boolean is optional and defaults to false, so old files
//! load unchanged and old readers ignore the extra field. Any malformed
//! line aborts the whole load; there is no partial recovery. File order is
//! the canonical character sequence. Pixel pages are a separate artifact
//! matched by filename convention and are not part of this format.

use crate::error::AtlasError;
use crate::geom::Rect;
use crate::glyph::Glyph;

/// Parsed layout file: page count plus glyphs in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutData {
    pub page_count: usize,
    pub glyphs: Vec<Glyph>,
}

/// Serialize a glyph layout to the line format.
pub fn serialize(page_count: usize, glyphs: &[Glyph]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", page_count));
    out.push_str(&format!("{}\n", glyphs.len()));
    for g in glyphs {
        out.push_str(&format!(
            "{} {} {} {} {} {} {}",
            g.character, g.page, g.rect.x, g.rect.y, g.rect.w, g.rect.h, g.y_offset
        ));
        if g.suppress_colouring {
            out.push_str(" true");
        }
        out.push('\n');
    }
    out
}

fn malformed(line_no: usize, line: &str) -> AtlasError {
    AtlasError::Layout {
        line: line_no + 1,
        text: line.to_string(),
    }
}

fn parse_count(lines: &[&str], idx: usize) -> Result<usize, AtlasError> {
    let line = lines.get(idx).copied().unwrap_or("");
    line.trim().parse().map_err(|_| malformed(idx, line))
}

/// Parse the line format back into a layout.
///
/// The glyph character is the first char of the line (so the space glyph
/// round-trips); the remaining fields are whitespace-split. Duplicate
/// characters and truncated files are rejected.
pub fn deserialize(text: &str) -> Result<LayoutData, AtlasError> {
    let lines: Vec<&str> = text.lines().collect();

    let page_count = parse_count(&lines, 0)?;
    let glyph_count = parse_count(&lines, 1)?;

    let mut glyphs: Vec<Glyph> = Vec::with_capacity(glyph_count);
    for i in 0..glyph_count {
        let idx = 2 + i;
        let line = *lines.get(idx).ok_or_else(|| malformed(idx, "<end of file>"))?;
        let err = || malformed(idx, line);

        let mut chars = line.chars();
        let character = chars.next().ok_or_else(err)?;
        let rest = chars.as_str();

        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 6 || fields.len() > 7 {
            return Err(err());
        }
        let num = |s: &str| s.parse::<i32>().map_err(|_| err());

        let page = fields[0].parse::<usize>().map_err(|_| err())?;
        let rect = Rect::new(num(fields[1])?, num(fields[2])?, num(fields[3])?, num(fields[4])?);
        let y_offset = num(fields[5])?;
        let suppress_colouring = match fields.get(6) {
            None => false,
            Some(&"true") | Some(&"1") => true,
            Some(&"false") | Some(&"0") => false,
            Some(_) => return Err(err()),
        };

        if glyphs.iter().any(|g| g.character == character) {
            return Err(err());
        }
        glyphs.push(Glyph {
            character,
            page,
            rect,
            y_offset,
            suppress_colouring,
        });
    }

    Ok(LayoutData { page_count, glyphs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_documented_line() {
        let data = deserialize("1\n1\nA 0 10 20 8 12 3\n").unwrap();
        assert_eq!(data.page_count, 1);
        let g = &data.glyphs[0];
        assert_eq!(g.character, 'A');
        assert_eq!(g.page, 0);
        assert_eq!(g.rect, Rect::new(10, 20, 8, 12));
        assert_eq!(g.y_offset, 3);
        assert!(!g.suppress_colouring);
    }

    #[test]
    fn test_trailing_boolean_optional() {
        let data = deserialize("1\n2\nA 0 0 0 1 1 0 true\nB 0 4 0 1 1 0\n").unwrap();
        assert!(data.glyphs[0].suppress_colouring);
        assert!(!data.glyphs[1].suppress_colouring);
    }

    #[test]
    fn test_space_glyph_round_trips() {
        let glyphs = vec![
            Glyph::new(' ', 0, Rect::new(2, 2, 1, 12), 5),
            Glyph::new('!', 0, Rect::new(7, 2, 3, 12), 1),
        ];
        let text = serialize(1, &glyphs);
        let data = deserialize(&text).unwrap();
        assert_eq!(data.glyphs, glyphs);
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let mut a = Glyph::new('a', 1, Rect::new(10, 20, 8, 12), 3);
        a.suppress_colouring = true;
        let glyphs = vec![a, Glyph::new('b', 0, Rect::new(0, 0, 4, 4), 0)];

        let text = serialize(2, &glyphs);
        let data = deserialize(&text).unwrap();
        assert_eq!(data.page_count, 2);
        assert_eq!(data.glyphs, glyphs);
        // Serializing again reproduces the same text.
        assert_eq!(serialize(data.page_count, &data.glyphs), text);
    }

    #[test]
    fn test_malformed_line_reports_context() {
        let err = deserialize("1\n1\nA 0 ten 20 8 12 3\n").unwrap_err();
        match err {
            AtlasError::Layout { line, text } => {
                assert_eq!(line, 3);
                assert!(text.contains("ten"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_truncated_file_rejected() {
        let err = deserialize("1\n3\nA 0 0 0 1 1 0\n").unwrap_err();
        match err {
            AtlasError::Layout { line, text } => {
                assert_eq!(line, 4);
                assert_eq!(text, "<end of file>");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(deserialize("").is_err());
        assert!(deserialize("not-a-number\n0\n").is_err());
    }

    #[test]
    fn test_duplicate_character_rejected() {
        assert!(deserialize("1\n2\nA 0 0 0 1 1 0\nA 0 4 0 1 1 0\n").is_err());
    }
}
