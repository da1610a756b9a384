use std::sync::LazyLock;

use regex::Regex;

use crate::outline::normalize::collapse_whitespace;

const MAX_HEURISTIC_CANDIDATES: usize = 5;

static BULLET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-\x{2022}*]\s+").expect("invalid bullet prefix pattern"));
static NUMBERED_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+)*[.)]\s*").expect("invalid numbered prefix pattern")
});
static BARE_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)*\s+").expect("invalid bare number pattern"));

static UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:\.\d+)?\s?(?:mm|cm|m|in|ft|N|kN|MPa|GPa|°C|°F)\b")
        .expect("invalid unit pattern")
});
static STANDARD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ASME|ISO|DIN|ASTM)\b").expect("invalid standards pattern")
});
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-\x{2022}*]|\d+(?:\.\d+)*[.)]?)").expect("invalid list marker pattern")
});

/// Strips one bullet, then numbering, then trailing `.;:,` and collapses whitespace.
/// Lines left without any letter or digit normalize to the empty string.
pub fn normalize_line(line: &str) -> String {
    let text = line.trim();
    if text.is_empty() {
        return String::new();
    }
    let text = BULLET_PREFIX.replace(text, "");
    let text = NUMBERED_PREFIX.replace(&text, "");
    let text = BARE_NUMBER_PREFIX.replace(&text, "");
    let text = text.trim_end_matches(['.', ';', ':', ',']);
    // A bare marker or a rule like `---` carries no requirement.
    if !text.chars().any(char::is_alphanumeric) {
        return String::new();
    }
    collapse_whitespace(text)
}

pub fn parse_model_response(response: &str) -> Vec<String> {
    response
        .lines()
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn heuristic_candidates(section_text: &str) -> Vec<String> {
    let mut matches = Vec::new();
    for line in section_text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let looks_like_spec = UNIT_PATTERN.is_match(line)
            || STANDARD_PATTERN.is_match(line)
            || LIST_MARKER.is_match(line);
        if looks_like_spec {
            let normalized = normalize_line(line);
            if !normalized.is_empty() {
                matches.push(normalized);
            }
        }
        if matches.len() >= MAX_HEURISTIC_CANDIDATES {
            break;
        }
    }

    if matches.is_empty() {
        if let Some(first) = section_text.lines().map(normalize_line).find(|line| !line.is_empty()) {
            matches.push(first);
        }
    }
    matches
}

pub fn dedup_key(candidate: &str) -> String {
    collapse_whitespace(candidate).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{heuristic_candidates, normalize_line, parse_model_response};

    #[test]
    fn normalizes_markers_and_trailing_punctuation() {
        assert_eq!(normalize_line("- Max load 5 kN;"), "Max load 5 kN");
        assert_eq!(normalize_line("• Bolts per ISO 898."), "Bolts per ISO 898");
        assert_eq!(normalize_line("2.3) Wall  thickness 4 mm"), "Wall thickness 4 mm");
        assert_eq!(normalize_line("3 Operating temp 80 °C"), "Operating temp 80 °C");
        assert_eq!(normalize_line("   "), "");
        assert_eq!(normalize_line("..."), "");
        assert_eq!(normalize_line("***"), "");
    }

    #[test]
    fn model_response_drops_blank_and_marker_only_lines() {
        let parsed = parse_model_response("- A\n\n  \n* B,\n-\n---\n*\n\u{2022}");
        assert_eq!(parsed, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn heuristic_matches_units_standards_and_lists() {
        let text = "Intro prose\nShaft diameter 25 mm\nComply with ASME B31.3\n- Paint all surfaces\nclosing remark";
        assert_eq!(
            heuristic_candidates(text),
            vec![
                "Shaft diameter 25 mm".to_string(),
                "Comply with ASME B31.3".to_string(),
                "Paint all surfaces".to_string(),
            ]
        );
    }

    #[test]
    fn heuristic_caps_at_five() {
        let text = (1..=8).map(|n| format!("- item {n}")).collect::<Vec<_>>().join("\n");
        assert_eq!(heuristic_candidates(&text).len(), 5);
    }

    #[test]
    fn heuristic_falls_back_to_first_line() {
        assert_eq!(
            heuristic_candidates("\n  plain words only  \nmore words"),
            vec!["plain words only".to_string()]
        );
        assert!(heuristic_candidates(" \n ").is_empty());
    }
}
