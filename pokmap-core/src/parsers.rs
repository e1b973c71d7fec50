//! Parser for EverQuest map text files.
//!
//! A file may mix two record kinds:
//! ```text
//! P x,y,z, r,g,b, size, Label_Text
//! L x1,y1,z1, x2,y2,z2, r,g,b
//! ```
//! The reader is lenient: malformed lines are skipped, never reported.

use crate::error::Result;
use crate::file_utils::read_map_text_file;
use crate::models::{MapPoint, ParsedMap, Rgb, Segment};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"-?\d+\.?\d*").unwrap();
    static ref LABEL_SUFFIX_RES: [Regex; 3] = [
        // 123` 178` 015
        Regex::new(r"\s*\(?\s*[-+]?\d+[`']\s*[-+]?\d+[`']\s*[-+]?\d+\s*\)?\s*$").unwrap(),
        // (123, 178, 15)
        Regex::new(r"\s*\(?\s*[-+]?\d+\s*,\s*[-+]?\d+\s*,\s*[-+]?\d+\s*\)?\s*$").unwrap(),
        // 123 178 15
        Regex::new(r"\s*[-+]?\d+\s+[-+]?\d+\s+[-+]?\d+\s*$").unwrap(),
    ];
}

const POINT_FIELDS: usize = 7;
const SEGMENT_FIELDS: usize = 9;

/// Extract every optionally-signed, optionally-fractional number in `line`.
///
/// Leading-dot fractions are not recognised: `.5` yields `5`.
pub fn parse_numbers(line: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(line)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Strip a trailing coordinate triplet from a label.
pub fn clean_label(label: &str) -> String {
    let mut s = label.trim().to_string();
    for re in LABEL_SUFFIX_RES.iter() {
        s = re.replace(&s, "").into_owned();
    }
    s.trim().to_string()
}

/// Parse one `P` line. `None` when it carries fewer than seven numbers.
fn parse_point_line(line: &str) -> Option<MapPoint> {
    let nums = parse_numbers(line);
    if nums.len() < POINT_FIELDS {
        return None;
    }
    let [x, y, z, r, g, b, size] = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5], nums[6]];

    // Everything after the seventh comma, commas included
    let raw_label = line.splitn(POINT_FIELDS + 1, ',').nth(POINT_FIELDS).unwrap_or("");
    let label = clean_label(&raw_label.trim().replace('_', " "));

    Some(MapPoint {
        x,
        y,
        z,
        rgb: Rgb::from_floats(r, g, b),
        size: size as i32,
        label,
        value: None,
    })
}

/// Parse one `L` line. `None` when it carries fewer than nine numbers.
fn parse_segment_line(line: &str) -> Option<Segment> {
    let nums = parse_numbers(line);
    if nums.len() < SEGMENT_FIELDS {
        return None;
    }
    Some(Segment {
        x1: nums[0],
        y1: nums[1],
        x2: nums[3],
        y2: nums[4],
        rgb: Rgb::from_floats(nums[6], nums[7], nums[8]),
    })
}

/// Parse map text already in memory.
pub fn parse_map_text(text: &str) -> ParsedMap {
    let mut parsed = ParsedMap::default();

    for raw in text.lines() {
        let line = raw.trim();
        let Some(tag) = line.chars().next() else {
            continue;
        };
        match tag.to_ascii_uppercase() {
            'P' => {
                if let Some(point) = parse_point_line(line) {
                    parsed.points.push(point);
                }
            }
            'L' => {
                if let Some(segment) = parse_segment_line(line) {
                    parsed.segments.push(segment);
                }
            }
            // '#' and ';' comments fall through here with everything else
            _ => {}
        }
    }

    parsed
}

/// Parse a map file from disk. Read errors propagate; bad lines do not.
pub fn parse_map_file(path: &Path) -> Result<ParsedMap> {
    let text = read_map_text_file(path)?;
    Ok(parse_map_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_tokenization() {
        assert_eq!(parse_numbers("L 1.5,-2,3."), vec![1.5, -2.0, 3.0]);
        assert_eq!(parse_numbers("P .5, +7"), vec![5.0, 7.0]);
        assert_eq!(parse_numbers("1.2.3"), vec![1.2, 3.0]);
        assert_eq!(parse_numbers("-0012"), vec![-12.0]);
        assert!(parse_numbers("no digits here").is_empty());
    }

    #[test]
    fn test_parse_numbers_includes_label_digits() {
        let nums = parse_numbers("P 5,5,0,255,0,0,3,Test_Point 1,2,3");
        assert_eq!(nums, vec![5.0, 5.0, 0.0, 255.0, 0.0, 0.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_clean_label_backtick_triplet() {
        assert_eq!(clean_label("Bank 123` 178` 015"), "Bank");
        assert_eq!(clean_label("Guard (12' -40' 3)"), "Guard");
    }

    #[test]
    fn test_clean_label_comma_triplet() {
        assert_eq!(clean_label("Merchant (123, 178, 15)"), "Merchant");
        assert_eq!(clean_label("Merchant 1,2,3"), "Merchant");
    }

    #[test]
    fn test_clean_label_space_triplet() {
        assert_eq!(clean_label("  Zone Line -10 20 +30  "), "Zone Line");
    }

    #[test]
    fn test_clean_label_keeps_plain_text() {
        assert_eq!(clean_label("To Qeynos Hills"), "To Qeynos Hills");
        assert_eq!(clean_label("Room 12"), "Room 12");
    }

    #[test]
    fn test_parse_point_line() {
        let parsed = parse_map_text("P -120.5, 44, 3.25, 240, 0, 0, 2, Priest_of_Discord");
        assert_eq!(parsed.points.len(), 1);
        let p = &parsed.points[0];
        assert_eq!((p.x, p.y, p.z), (-120.5, 44.0, 3.25));
        assert_eq!(p.rgb, Rgb(240, 0, 0));
        assert_eq!(p.size, 2);
        assert_eq!(p.label, "Priest of Discord");
        assert_eq!(p.value, None);
    }

    #[test]
    fn test_parse_point_without_label() {
        let parsed = parse_map_text("P 1,2,3,4,5,6,7");
        assert_eq!(parsed.points.len(), 1);
        assert_eq!(parsed.points[0].label, "");
    }

    #[test]
    fn test_parse_segment_line() {
        let parsed = parse_map_text("L 1, 2, 3, 4, 5, 6, 7, 8, 9");
        assert_eq!(
            parsed.segments,
            vec![Segment { x1: 1.0, y1: 2.0, x2: 4.0, y2: 5.0, rgb: Rgb(7, 8, 9) }]
        );
    }

    #[test]
    fn test_lowercase_tags_are_accepted() {
        let parsed = parse_map_text("l 0,0,0,1,1,0,0,0,0\np 1,1,0,0,0,0,1,x");
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.points.len(), 1);
    }

    #[test]
    fn test_malformed_and_foreign_lines_are_skipped() {
        let text = "\
# comment P 1,2,3,4,5,6,7
; another L 1,2,3,4,5,6,7,8,9

P 1,2,3,4,5,6
L 1,2,3,4,5,6,7,8
X 1,2,3,4,5,6,7,8,9
Points 1,2
";
        let parsed = parse_map_text(text);
        assert!(parsed.points.is_empty());
        assert!(parsed.segments.is_empty());
    }

    #[test]
    fn test_three_line_fixture() {
        let text = "P 5,5,0,255,0,0,3,Test_Point 1,2,3\nL 0,0,0,10,10,0,0,0,255\n# note\n";
        let parsed = parse_map_text(text);
        assert_eq!(parsed.points.len(), 1);
        assert_eq!(parsed.points[0].label, "Test Point");
        assert_eq!(parsed.points[0].rgb, Rgb(255, 0, 0));
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].rgb, Rgb(0, 0, 255));
        assert_eq!((parsed.segments[0].x2, parsed.segments[0].y2), (10.0, 10.0));
    }

    #[test]
    fn test_parse_map_file_missing() {
        assert!(parse_map_file(Path::new("/nonexistent/pokmap/zone.txt")).is_err());
    }
}
