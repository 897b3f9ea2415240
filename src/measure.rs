// Text measurement for the built-in Helvetica face.
//
// Every layout decision (wrapping, row heights, split boundaries) rests on
// this module, so all of it is pure arithmetic: identical inputs always give
// identical results. Advance widths come from the standard Helvetica AFM
// table (units per 1000 em) for the printable ASCII range; characters outside
// it use the lowercase average, which is close enough for wrapping.

pub const PT_TO_MM: f32 = 0.352_778;

const FIRST_CHAR: usize = 0x20;
const DEFAULT_WIDTH: u16 = 556;

/// Helvetica advance widths for 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

fn char_width_units(c: char) -> u16 {
    let i = c as usize;
    if (FIRST_CHAR..FIRST_CHAR + HELVETICA_WIDTHS.len()).contains(&i) {
        HELVETICA_WIDTHS[i - FIRST_CHAR]
    } else {
        DEFAULT_WIDTH
    }
}

/// Line height in mm: font size plus inter-line gap.
pub fn line_height_mm(font_size_pt: f32, line_gap_pt: f32) -> f32 {
    (font_size_pt + line_gap_pt) * PT_TO_MM
}

/// Advance width of a string at the given size, in mm.
pub fn string_width_mm(text: &str, font_size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width_units(c) as u32).sum();
    units as f32 / 1000.0 * font_size_pt * PT_TO_MM
}

/// Greedy word wrap against a column width. A single word wider than the
/// column is broken at character boundaries so every line fits.
pub fn wrap(text: &str, width_mm: f32, font_size_pt: f32) -> Vec<String> {
    let space_w = string_width_mm(" ", font_size_pt);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_w = 0.0f32;

    for word in text.split_whitespace() {
        for piece in break_word(word, width_mm, font_size_pt) {
            let piece_w = string_width_mm(&piece, font_size_pt);
            if current.is_empty() {
                current = piece;
                current_w = piece_w;
            } else if current_w + space_w + piece_w <= width_mm {
                current.push(' ');
                current.push_str(&piece);
                current_w += space_w + piece_w;
            } else {
                lines.push(std::mem::take(&mut current));
                current = piece;
                current_w = piece_w;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, width_mm: f32, font_size_pt: f32) -> Vec<String> {
    if string_width_mm(word, font_size_pt) <= width_mm {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut piece_w = 0.0f32;
    for c in word.chars() {
        let c_w = string_width_mm(&c.to_string(), font_size_pt);
        if !piece.is_empty() && piece_w + c_w > width_mm {
            pieces.push(std::mem::take(&mut piece));
            piece_w = 0.0;
        }
        piece.push(c);
        piece_w += c_w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Wrapped height of a text block in mm. Empty text measures one line, never
/// zero.
pub fn measure_height_mm(text: &str, width_mm: f32, font_size_pt: f32, line_gap_pt: f32) -> f32 {
    let lines = wrap(text, width_mm, font_size_pt).len().max(1);
    lines as f32 * line_height_mm(font_size_pt, line_gap_pt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_is_deterministic() {
        let text = "Hydraulic leak observed on no. 2 crane slewing motor during routine inspection";
        let a = wrap(text, 40.0, 9.0);
        let b = wrap(text, 40.0, 9.0);
        assert_eq!(a, b);
        assert!(a.len() > 1);
    }

    #[test]
    fn every_wrapped_line_fits_the_width() {
        let text = "The quick brown fox jumps over the lazy dog again and again and again";
        for line in wrap(text, 30.0, 9.0) {
            assert!(string_width_mm(&line, 9.0) <= 30.0 + 1e-3, "line too wide: {line}");
        }
    }

    #[test]
    fn empty_text_measures_one_line() {
        let h = measure_height_mm("", 40.0, 9.0, 2.0);
        assert!((h - line_height_mm(9.0, 2.0)).abs() < 1e-6);
    }

    #[test]
    fn oversized_word_is_broken_at_characters() {
        let lines = wrap("unbreakablylongidentifierwithoutspaces", 10.0, 9.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(string_width_mm(line, 9.0) <= 10.0 + 1e-3);
        }
    }

    #[test]
    fn wider_column_needs_fewer_lines() {
        let text = "Port side mooring winch brake rendering below rated holding load";
        let narrow = wrap(text, 25.0, 9.0).len();
        let wide = wrap(text, 80.0, 9.0).len();
        assert!(wide < narrow);
    }

    #[test]
    fn whitespace_only_text_measures_one_line() {
        let h = measure_height_mm("   \t  ", 40.0, 9.0, 2.0);
        assert!((h - line_height_mm(9.0, 2.0)).abs() < 1e-6);
    }
}
