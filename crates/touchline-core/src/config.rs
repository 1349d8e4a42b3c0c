//! Plant limits-file parsing and key lookup.
//!
//! The limits file is a line-oriented plant format, not INI and not TOML:
//! whitespace is insignificant everywhere, any line containing `#` is
//! dropped in full, a key/value declaration splits at the LAST `=` on the
//! line, and a line without `=` continues the value of the key above it.
//! Values are comma-separated integers, decimal unless the element contains
//! the substring `0x` (then the text after the first `0x` is parsed as hex).
//!
//! The loose hex rule is a plant-file compatibility contract: `10x5` parses
//! as hex `5`. Do not tighten it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use touchline_hal::DeviceGeometry;

use crate::error::{ConfigError, Result};

/// Mandatory key naming the device row count.
pub const ROW_COUNT_KEY: &str = "NUM_OF_ROW";
/// Mandatory key naming the device column count.
pub const COL_COUNT_KEY: &str = "NUM_OF_COL";

/// Parsed limits document: ordered key/value-blob pairs plus a
/// first-match-wins index built once at parse time.
///
/// Immutable after load. Lookups parse blobs on demand so that "key found
/// but unparsable" and "key absent" both surface as the same empty list the
/// plant tooling expects.
#[derive(Debug, Clone)]
pub struct LimitsDoc {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl LimitsDoc {
    /// Load and validate a limits file against the device geometry.
    pub fn load(path: impl AsRef<Path>, geometry: DeviceGeometry) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, geometry)
    }

    /// Parse limits text and validate the mandatory geometry keys.
    pub fn parse(text: &str, geometry: DeviceGeometry) -> Result<Self> {
        let entries = tokenize(text);
        let mut index = HashMap::new();
        for (pos, (key, _)) in entries.iter().enumerate() {
            // First declaration of a key wins; later ones are shadowed.
            index.entry(key.clone()).or_insert(pos);
        }
        let doc = Self { entries, index };
        doc.require_geometry(ROW_COUNT_KEY, geometry.rows)?;
        doc.require_geometry(COL_COUNT_KEY, geometry.cols)?;
        Ok(doc)
    }

    /// Raw value blob for a key (exact, case-sensitive match).
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.entries[pos].1.as_str())
    }

    /// Numeric list for a key.
    ///
    /// Returns an empty list when the key is absent OR when any element of
    /// the blob fails to parse (the whole blob is rejected, never a prefix).
    pub fn values(&self, key: &str) -> Vec<i32> {
        let Some(blob) = self.raw(key) else {
            return Vec::new();
        };
        match parse_numeric_list(blob) {
            Some(values) => values,
            None => {
                warn!(key, blob, "rejecting unparsable value blob");
                Vec::new()
            }
        }
    }

    /// Single-element convenience lookup. `None` unless the key resolves to
    /// exactly one integer.
    pub fn scalar(&self, key: &str) -> Option<i32> {
        let values = self.values(key);
        match values.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// Number of key/value pairs in declaration order.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require_geometry(&self, key: &'static str, device_value: usize) -> Result<()> {
        let values = self.values(key);
        let [file_value] = values.as_slice() else {
            return Err(ConfigError::MissingGeometryKey { key });
        };
        if *file_value < 0 || *file_value as usize != device_value {
            return Err(ConfigError::GeometryMismatch {
                key,
                file_value: *file_value,
                device_value,
            });
        }
        Ok(())
    }
}

/// Tokenize limits text into ordered key/value-blob pairs.
///
/// Per line: strip ALL whitespace; drop the line entirely if it contains
/// `#` anywhere or its stripped length is <= 1; split at the last `=` into
/// key and value tail, flushing the previously accumulating pair; a line
/// with no `=` extends the current value blob.
fn tokenize(text: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut current: Option<(String, String)> = None;

    for raw_line in text.lines() {
        let line: String = raw_line.chars().filter(|c| !c.is_whitespace()).collect();
        if line.contains('#') || line.len() <= 1 {
            continue;
        }
        match line.rfind('=') {
            Some(pos) => {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                let key = line[..pos].to_string();
                let tail = line[pos + 1..].to_string();
                current = Some((key, tail));
            }
            None => match current.as_mut() {
                Some((_, blob)) => {
                    if !blob.is_empty() && !blob.ends_with(',') {
                        blob.push(',');
                    }
                    blob.push_str(&line);
                }
                None => {
                    warn!(line, "continuation line before any key; dropped");
                }
            },
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }
    entries
}

/// Parse one comma-separated blob. `None` if any element is invalid.
///
/// Trailing empty segments (a dangling comma) are tolerated; an empty
/// segment in the middle invalidates the blob.
fn parse_numeric_list(blob: &str) -> Option<Vec<i32>> {
    let mut segments: Vec<&str> = blob.split(',').collect();
    while segments.last() == Some(&"") {
        segments.pop();
    }
    segments.into_iter().map(parse_element).collect()
}

/// Parse one element: hex when it contains `0x` anywhere, decimal otherwise.
fn parse_element(segment: &str) -> Option<i32> {
    if let Some(pos) = segment.find("0x") {
        i32::from_str_radix(&segment[pos + 2..], 16).ok()
    } else {
        segment.parse::<i32>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> DeviceGeometry {
        DeviceGeometry::new(2, 3)
    }

    fn doc(body: &str) -> LimitsDoc {
        let text = format!("NUM_OF_ROW = 2\nNUM_OF_COL = 3\n{body}");
        LimitsDoc::parse(&text, geometry()).expect("parse")
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        let spaced = doc(" KEY  = 1 , 2 , 3 \n");
        let tight = doc("KEY=1,2,3\n");
        assert_eq!(spaced.values("KEY"), tight.values("KEY"));
        assert_eq!(spaced.values("KEY"), vec![1, 2, 3]);
    }

    #[test]
    fn test_comment_line_dropped_entirely() {
        let parsed = doc("KEY=1,2\n3,4 # trailing values\nOTHER=9\n");
        // The commented line is gone, not merged into KEY's blob.
        assert_eq!(parsed.values("KEY"), vec![1, 2]);
        assert_eq!(parsed.values("OTHER"), vec![9]);
    }

    #[test]
    fn test_short_lines_dropped() {
        let parsed = doc("A\n5\nKEY=7\n");
        assert_eq!(parsed.values("KEY"), vec![7]);
        assert_eq!(parsed.len(), 3); // the two geometry keys + KEY
    }

    #[test]
    fn test_multi_line_value_accumulates() {
        let parsed = doc("KEY=1,2\n3,4\n");
        assert_eq!(parsed.values("KEY"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_multi_line_value_with_dangling_comma() {
        let parsed = doc("KEY=1,2,\n3,4\n");
        assert_eq!(parsed.values("KEY"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_split_at_last_equals() {
        let parsed = doc("A=B=5\n");
        assert_eq!(parsed.values("A=B"), vec![5]);
        assert!(parsed.raw("A").is_none());
    }

    #[test]
    fn test_hex_and_decimal_mix() {
        let parsed = doc("KEY=1,0x0A,3\n");
        assert_eq!(parsed.values("KEY"), vec![1, 10, 3]);
    }

    #[test]
    fn test_loose_hex_detection_quirk() {
        // "10x5" contains "0x"; the text after it parses as hex 5.
        let parsed = doc("KEY=10x5\n");
        assert_eq!(parsed.values("KEY"), vec![5]);
    }

    #[test]
    fn test_unparsable_element_rejects_whole_blob() {
        let parsed = doc("KEY=1,two,3\n");
        assert!(parsed.values("KEY").is_empty());

        let parsed = doc("KEY=1.5,2\n");
        assert!(parsed.values("KEY").is_empty());
    }

    #[test]
    fn test_missing_key_is_empty() {
        let parsed = doc("KEY=1\n");
        assert!(parsed.values("ABSENT").is_empty());
    }

    #[test]
    fn test_key_match_is_exact_and_case_sensitive() {
        let parsed = doc("NOISE_TEST_LIMIT=40\n");
        assert_eq!(parsed.values("NOISE_TEST_LIMIT"), vec![40]);
        assert!(parsed.values("NOISE_TEST").is_empty());
        assert!(parsed.values("noise_test_limit").is_empty());
    }

    #[test]
    fn test_first_declaration_wins() {
        let parsed = doc("KEY=1\nKEY=2\n");
        assert_eq!(parsed.values("KEY"), vec![1]);
    }

    #[test]
    fn test_scalar_lookup() {
        let parsed = doc("ONE=7\nMANY=1,2\n");
        assert_eq!(parsed.scalar("ONE"), Some(7));
        assert_eq!(parsed.scalar("MANY"), None);
        assert_eq!(parsed.scalar("ABSENT"), None);
    }

    #[test]
    fn test_geometry_mismatch_is_fatal() {
        let text = "NUM_OF_ROW=16\nNUM_OF_COL=3\n";
        let err = LimitsDoc::parse(text, geometry()).expect_err("mismatch");
        assert!(matches!(err, ConfigError::GeometryMismatch { key: "NUM_OF_ROW", .. }));
    }

    #[test]
    fn test_missing_geometry_key_is_fatal() {
        let text = "NUM_OF_ROW=2\n";
        let err = LimitsDoc::parse(text, geometry()).expect_err("missing");
        assert!(matches!(err, ConfigError::MissingGeometryKey { key: "NUM_OF_COL" }));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = LimitsDoc::load("/nonexistent/limits.ini", geometry()).expect_err("io");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "# plant limits").expect("write");
        writeln!(file, "NUM_OF_ROW = 2").expect("write");
        writeln!(file, "NUM_OF_COL = 3").expect("write");
        writeln!(file, "NOISE_TEST_LIMIT = 0x28").expect("write");
        let parsed = LimitsDoc::load(file.path(), geometry()).expect("load");
        assert_eq!(parsed.values("NOISE_TEST_LIMIT"), vec![40]);
    }
}
