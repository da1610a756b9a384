//! Free-text outline -> unpositioned section tree.
//!
//! Each non-blank line is one heading. Depth comes from indentation (two columns per
//! level, tabs expanded to four columns), may grow by at most one level per line, and
//! is overridden by the dot count of a dotted enumerator such as `2.1.4`.

use tracing::{debug, warn};

use crate::core::types::SectionNode;

/// Substituted whenever an outline yields no usable headings.
pub const FALLBACK_OUTLINE: &str = "1. Introduction\n  1.1 Background\n2. Methods\n3. Results";

pub const ROOT_TITLE: &str = "Document";

const INDENT_WIDTH: usize = 2;
const TAB_EXPANSION: &str = "    ";
const BULLET_GLYPHS: &[char] = &['-', '*', '+', '•', '–', '—'];
const MAX_ROMAN_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineLine {
    pub depth: usize,
    pub number: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct ParsedOutline {
    pub root: SectionNode,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitLine<'a> {
    pub number: Option<String>,
    pub title: &'a str,
}

impl SplitLine<'_> {
    fn dotted_levels(&self) -> usize {
        self.number
            .as_deref()
            .map(|number| number.matches('.').count())
            .unwrap_or(0)
    }
}

pub fn root_id(document_id: &str) -> String {
    format!("{document_id}-root")
}

pub fn parse_outline(document_id: &str, outline_text: &str) -> ParsedOutline {
    let mut lines = parse_lines(outline_text);
    let used_fallback = lines.is_empty();
    if used_fallback {
        warn!(document_id, "outline has no usable headings; using fallback outline");
        lines = parse_lines(FALLBACK_OUTLINE);
    }
    debug!(document_id, headings = lines.len(), "parsed outline");
    ParsedOutline {
        root: build_tree(document_id, &lines),
        used_fallback,
    }
}

pub fn parse_lines(outline_text: &str) -> Vec<OutlineLine> {
    let mut items = Vec::new();
    let mut last_depth = 0usize;
    for raw in outline_text.lines() {
        let line = raw.trim_end().replace('\t', TAB_EXPANSION);
        let indent = line.len() - line.trim_start_matches(' ').len();
        let content = line.trim().trim_start_matches('#').trim();
        if content.is_empty() {
            continue;
        }
        let split = split_marker(content);
        let title = clean_title(split.title);
        if !title.chars().any(char::is_alphanumeric) {
            continue;
        }

        let mut depth = (indent / INDENT_WIDTH).min(last_depth + 1);
        let dotted = split.dotted_levels();
        if dotted >= 1 {
            depth = dotted;
        }
        last_depth = depth;
        items.push(OutlineLine {
            depth,
            number: split.number,
            title: title.to_string(),
        });
    }
    items
}

fn build_tree(document_id: &str, lines: &[OutlineLine]) -> SectionNode {
    let root = SectionNode::new(root_id(document_id), document_id, None, ROOT_TITLE, 0);
    // Entries carry `depth + 1` so the root can sit at level 0 and is never popped.
    let mut stack: Vec<(usize, SectionNode)> = vec![(0, root)];

    for (counter, line) in lines.iter().enumerate() {
        let top_level = stack.last().map(|(level, _)| *level).unwrap_or(0);
        let level = (line.depth + 1).min(top_level + 1);
        while stack.len() > 1 && stack.last().is_some_and(|(top, _)| level <= *top) {
            attach_top(&mut stack);
        }
        let node = SectionNode::new(
            format!("{document_id}-sec-{:04}", counter + 1),
            document_id,
            line.number.clone(),
            line.title.clone(),
            level - 1,
        );
        stack.push((level, node));
    }

    while stack.len() > 1 {
        attach_top(&mut stack);
    }
    stack
        .pop()
        .map(|(_, root)| root)
        .unwrap_or_else(|| SectionNode::new(root_id(document_id), document_id, None, ROOT_TITLE, 0))
}

fn attach_top(stack: &mut Vec<(usize, SectionNode)>) {
    if let Some((_, node)) = stack.pop() {
        if let Some((_, parent)) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

fn clean_title(title: &str) -> &str {
    title.trim_matches(|ch: char| ch == '*' || ch == '_').trim()
}

/// Splits a leading bullet glyph or enumerator token off a heading line.
pub(crate) fn split_marker(text: &str) -> SplitLine<'_> {
    let text = text.trim();
    for glyph in BULLET_GLYPHS {
        if let Some(rest) = text.strip_prefix(*glyph) {
            if rest.starts_with(char::is_whitespace) {
                return SplitLine {
                    number: None,
                    title: rest.trim(),
                };
            }
        }
    }

    match text.split_once(char::is_whitespace) {
        Some((token, rest)) => match parse_enumerator(token) {
            Some(label) => SplitLine {
                number: Some(label),
                title: rest.trim(),
            },
            None => SplitLine {
                number: None,
                title: text,
            },
        },
        // A lone enumerator carries no title.
        None if parse_enumerator(text).is_some() => SplitLine {
            number: None,
            title: "",
        },
        None => SplitLine {
            number: None,
            title: text,
        },
    }
}

/// Recognizes `1`, `2.1.4`, `A.1`, `a)`, `(iv)`, `IV.` and similar tokens, returning the
/// label without its surrounding punctuation. Purely alphabetic tokens need a `.`/`)`
/// suffix or parentheses so ordinary words are not mistaken for enumerators.
fn parse_enumerator(token: &str) -> Option<String> {
    let token = token.trim();
    let (core, punctuated) = if token.len() > 2 && token.starts_with('(') && token.ends_with(')') {
        (&token[1..token.len() - 1], true)
    } else if let Some(stripped) = token.strip_suffix(')') {
        (stripped, true)
    } else if let Some(stripped) = token.strip_suffix('.') {
        (stripped, true)
    } else {
        (token, false)
    };
    if core.is_empty() {
        return None;
    }

    let segments: Vec<&str> = core.split('.').collect();
    if segments.iter().any(|segment| !is_enumerator_segment(segment)) {
        return None;
    }
    let numeric_or_dotted =
        segments.len() > 1 || segments[0].chars().all(|ch| ch.is_ascii_digit());
    if !numeric_or_dotted && !punctuated {
        return None;
    }
    Some(core.to_string())
}

fn is_enumerator_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.chars().all(|ch| ch.is_ascii_digit()) {
        return true;
    }
    if segment.len() == 1 && segment.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return true;
    }
    segment.len() <= MAX_ROMAN_LEN
        && segment
            .chars()
            .all(|ch| matches!(ch.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
}

#[cfg(test)]
mod tests {
    use super::{parse_enumerator, parse_lines, parse_outline, split_marker, OutlineLine};

    #[test]
    fn recognizes_enumerator_shapes() {
        assert_eq!(parse_enumerator("1."), Some("1".to_string()));
        assert_eq!(parse_enumerator("2.1.4"), Some("2.1.4".to_string()));
        assert_eq!(parse_enumerator("(a)"), Some("a".to_string()));
        assert_eq!(parse_enumerator("b)"), Some("b".to_string()));
        assert_eq!(parse_enumerator("IV."), Some("IV".to_string()));
        assert_eq!(parse_enumerator("A.1"), Some("A.1".to_string()));
        assert_eq!(parse_enumerator("Methods"), None);
        assert_eq!(parse_enumerator("Mix"), None);
        assert_eq!(parse_enumerator("1..2"), None);
    }

    #[test]
    fn bullets_drop_their_glyph() {
        let split = split_marker("• Thermal limits");
        assert_eq!(split.number, None);
        assert_eq!(split.title, "Thermal limits");
        assert_eq!(split_marker("-dash joined").title, "-dash joined");
    }

    #[test]
    fn indent_growth_is_clamped_to_one_level() {
        let lines = parse_lines("Intro\n        Deep child\n  Sibling of deep");
        let depths: Vec<usize> = lines.iter().map(|line| line.depth).collect();
        assert_eq!(depths, vec![0, 1, 1]);
    }

    #[test]
    fn dotted_numbers_override_indent() {
        let lines = parse_lines("1 Scope\n2.1.4 Bolts\n    3.2 Welds");
        assert_eq!(
            lines,
            vec![
                OutlineLine { depth: 0, number: Some("1".to_string()), title: "Scope".to_string() },
                OutlineLine { depth: 2, number: Some("2.1.4".to_string()), title: "Bolts".to_string() },
                OutlineLine { depth: 1, number: Some("3.2".to_string()), title: "Welds".to_string() },
            ]
        );
    }

    #[test]
    fn tab_indent_is_expanded_then_clamped() {
        let lines = parse_lines("A. Top\n\t1) Nested");
        assert_eq!(lines[1].depth, 1);
        assert_eq!(lines[1].number.as_deref(), Some("1"));
    }

    #[test]
    fn markdown_noise_is_skipped_or_stripped() {
        let lines = parse_lines("```\n## **Overview**\n---\n1.\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].title, "Overview");
    }

    #[test]
    fn skipped_depth_attaches_to_nearest_ancestor() {
        let parsed = parse_outline("doc", "1 Top\n1.1.1 Grandchild\n2 Next");
        let root = parsed.root;
        assert_eq!(root.children.len(), 2);
        let grandchild = &root.children[0].children[0];
        assert_eq!(grandchild.title, "Grandchild");
        assert_eq!(grandchild.depth, 1);
        assert_eq!(root.children[1].title, "Next");
    }

    #[test]
    fn ids_follow_parse_order() {
        let parsed = parse_outline("doc-7", "A\n  B\nC");
        let ids: Vec<&str> = parsed.root.preorder().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-7-root", "doc-7-sec-0001", "doc-7-sec-0002", "doc-7-sec-0003"]);
        assert!(!parsed.used_fallback);
    }
}
