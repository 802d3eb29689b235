// ============================================================================
// File: scriptpad/src/verdict.rs
// ----------------------------------------------------------------------------
// Comparison of actual program output against the expected output pane.
// ============================================================================

use serde::Serialize;

/// Result of comparing actual output with expected output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Match,
    /// First differing line (1-based); a missing line is an empty string
    Mismatch {
        line: usize,
        expected: String,
        actual: String,
    },
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

/// Compare line by line, ignoring line-ending style and trailing newlines
pub fn compare(actual: &str, expected: &str) -> Verdict {
    let actual_lines = lines(actual);
    let expected_lines = lines(expected);
    let longest = actual_lines.len().max(expected_lines.len());

    for index in 0..longest {
        let a = actual_lines.get(index).copied();
        let e = expected_lines.get(index).copied();
        if a != e {
            return Verdict::Mismatch {
                line: index + 1,
                expected: e.unwrap_or_default().to_string(),
                actual: a.unwrap_or_default().to_string(),
            };
        }
    }
    Verdict::Match
}

fn lines(text: &str) -> Vec<&str> {
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_modulo_line_endings() {
        assert!(compare("1\n2\n", "1\r\n2").is_match());
        assert!(compare("", "\n\n").is_match());
    }

    #[test]
    fn reports_first_difference() {
        assert_eq!(
            compare("1\n2\n4", "1\n2\n3"),
            Verdict::Mismatch {
                line: 3,
                expected: "3".into(),
                actual: "4".into()
            }
        );
    }

    #[test]
    fn missing_lines_are_mismatches() {
        assert_eq!(
            compare("1", "1\n2"),
            Verdict::Mismatch {
                line: 2,
                expected: "2".into(),
                actual: String::new()
            }
        );
    }

    #[test]
    fn trailing_spaces_matter() {
        assert!(!compare("x ", "x").is_match());
    }
}
