use crate::core::types::{Fragment, SectionNode};

const OUTLINE_EXCERPT_CHARS: usize = 4000;
const SECTION_TEXT_CHARS: usize = 10_000;

pub fn outline_prompt(fragments: &[&Fragment]) -> String {
    let mut excerpt = String::new();
    for line in fragments
        .iter()
        .flat_map(|fragment| fragment.text_or_empty().lines())
        .map(str::trim)
        .filter(|line| !line.is_empty())
    {
        if !excerpt.is_empty() {
            excerpt.push('\n');
        }
        excerpt.push_str(line);
        if excerpt.chars().count() >= OUTLINE_EXCERPT_CHARS {
            break;
        }
    }

    let mut text = String::new();
    text.push_str("You are helping to outline a technical document. ");
    text.push_str("Review the provided excerpts and identify its headers.\n\n");
    text.push_str("Document excerpts:\n");
    text.push_str(&truncate_chars(&excerpt, OUTLINE_EXCERPT_CHARS));
    text.push_str("\n\nPlease show a simple nested list of all headers and subheaders for this document.");
    text
}

pub fn requirements_prompt(section: &SectionNode, section_text: &str) -> String {
    let number = section.number.as_deref().unwrap_or("N/A");
    let mut text = String::new();
    text.push_str("You are extracting mechanical engineering specifications.\n");
    text.push_str(&format!("Section: \"{}\" (Number: {number})\n", section.title));
    text.push_str(
        "Provide a concise bullet list of each mechanical engineering specification found in this section.\n",
    );
    text.push_str("Return each spec on its own line; do not include commentary.\n\n");
    text.push_str(&truncate_chars(section_text, SECTION_TEXT_CHARS));
    text
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::{outline_prompt, requirements_prompt};
    use crate::core::types::{Fragment, SectionNode};

    #[test]
    fn outline_prompt_skips_blank_lines() {
        let fragments = vec![
            Fragment::text("o0", "doc", Some(1), 0, "1 Scope\n\n  "),
            Fragment::text("o1", "doc", Some(1), 1, "Body text"),
        ];
        let refs: Vec<&Fragment> = fragments.iter().collect();
        let prompt = outline_prompt(&refs);
        assert!(prompt.contains("Document excerpts:\n1 Scope\nBody text\n\n"));
        assert!(prompt.ends_with("headers and subheaders for this document."));
    }

    #[test]
    fn outline_excerpt_is_bounded() {
        let long = "x".repeat(9000);
        let fragments = vec![Fragment::text("o0", "doc", None, 0, long.as_str())];
        let refs: Vec<&Fragment> = fragments.iter().collect();
        let prompt = outline_prompt(&refs);
        assert!(prompt.len() < 4300);
    }

    #[test]
    fn requirements_prompt_names_section() {
        let section = SectionNode::new("doc-sec-0001", "doc", None, "Loads", 1);
        let prompt = requirements_prompt(&section, &"~".repeat(12_000));
        assert!(prompt.contains("Section: \"Loads\" (Number: N/A)\n"));
        assert_eq!(prompt.matches('~').count(), 10_000);
    }
}
