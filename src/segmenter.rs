//! Markdown segmenter: splits a note into headed sections.
//!
//! Boundary collaborator for callers that submit raw markdown instead of
//! pre-segmented sections. ATX headings start a new section; text before the
//! first heading becomes a level-0 preamble section. YAML frontmatter at the
//! top of the note is skipped.

use crate::patterns::{re_iso_date, re_list_marker, re_month_date};
use crate::types::{Section, StructuralFeatures};

/// Split raw markdown into sections with structural features.
///
/// Section ids are positional (`s1`, `s2`, ...) and therefore stable for
/// byte-identical input. Empty sections (heading with no body) are kept —
/// downstream stages decide what to do with them.
pub fn segment_note(note_id: &str, raw_markdown: &str) -> Vec<Section> {
    let lines: Vec<&str> = raw_markdown.lines().collect();
    let mut sections = Vec::new();

    let mut idx = 0;
    // Skip YAML frontmatter delimited by `---` at the very top.
    if lines.first().map(|l| l.trim()) == Some("---") {
        if let Some(close) = lines.iter().skip(1).position(|l| l.trim() == "---") {
            idx = close + 2;
        }
    }

    let mut current: Option<SectionBuilder> = None;
    for (offset, line) in lines.iter().enumerate().skip(idx) {
        let line_no = offset + 1;
        if let Some((level, heading)) = parse_atx_heading(line) {
            if let Some(builder) = current.take() {
                sections.push(builder.finish(note_id, sections.len() + 1));
            }
            current = Some(SectionBuilder::new(heading, level, line, line_no));
        } else {
            let builder = current.get_or_insert_with(|| {
                // Preamble: content before the first heading.
                SectionBuilder::new(String::new(), 0, "", line_no)
            });
            builder.push_line(line, line_no);
        }
    }
    if let Some(builder) = current.take() {
        sections.push(builder.finish(note_id, sections.len() + 1));
    }

    log::debug!(
        "Segmented note '{}' into {} section(s)",
        note_id,
        sections.len()
    );
    sections
}

/// Parse an ATX heading line into (level, text).
fn parse_atx_heading(line: &str) -> Option<(u8, String)> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(' ') && !rest.is_empty() {
        return None;
    }
    Some((hashes as u8, rest.trim().trim_end_matches('#').trim().to_string()))
}

struct SectionBuilder {
    heading_text: String,
    heading_level: u8,
    raw_lines: Vec<String>,
    body_lines: Vec<String>,
    start_line: usize,
    end_line: usize,
}

impl SectionBuilder {
    fn new(heading_text: String, heading_level: u8, heading_line: &str, line_no: usize) -> Self {
        let mut raw_lines = Vec::new();
        if !heading_line.is_empty() {
            raw_lines.push(heading_line.to_string());
        }
        Self {
            heading_text,
            heading_level,
            raw_lines,
            body_lines: Vec::new(),
            start_line: line_no,
            end_line: line_no,
        }
    }

    fn push_line(&mut self, line: &str, line_no: usize) {
        self.raw_lines.push(line.to_string());
        if !line.trim().is_empty() {
            self.body_lines.push(line.to_string());
        }
        self.end_line = line_no;
    }

    fn finish(self, note_id: &str, position: usize) -> Section {
        let num_list_items = self
            .body_lines
            .iter()
            .filter(|l| re_list_marker().is_match(l))
            .count();
        let raw_text = self.raw_lines.join("\n");
        let has_dates = re_iso_date().is_match(&raw_text) || re_month_date().is_match(&raw_text);
        Section {
            note_id: note_id.to_string(),
            section_id: format!("s{}", position),
            heading_text: self.heading_text,
            heading_level: self.heading_level,
            features: StructuralFeatures {
                num_lines: self.body_lines.len(),
                num_list_items,
                has_dates,
            },
            body_lines: self.body_lines,
            raw_text,
            start_line: self.start_line,
            end_line: self.end_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_headings() {
        let md = "# Timeline\nMove the launch.\n\n## Ideas\n- Build exports\n- Add SSO\n";
        let sections = segment_note("n1", md);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading_text, "Timeline");
        assert_eq!(sections[0].heading_level, 1);
        assert_eq!(sections[1].heading_text, "Ideas");
        assert_eq!(sections[1].features.num_list_items, 2);
    }

    #[test]
    fn preamble_becomes_level_zero_section() {
        let md = "Quick recap of the call.\n\n# Next steps\n- Do things\n";
        let sections = segment_note("n1", md);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading_level, 0);
        assert_eq!(sections[0].heading_text, "");
        assert_eq!(sections[0].body_lines.len(), 1);
    }

    #[test]
    fn frontmatter_is_skipped() {
        let md = "---\ndate: 2026-02-04\n---\n# Notes\nBody text.\n";
        let sections = segment_note("n1", md);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading_text, "Notes");
    }

    #[test]
    fn section_ids_are_positional_and_stable() {
        let md = "# A\nx\n# B\ny\n";
        let first = segment_note("n1", md);
        let second = segment_note("n1", md);
        assert_eq!(first[0].section_id, "s1");
        assert_eq!(first[1].section_id, "s2");
        assert_eq!(first[1].section_id, second[1].section_id);
    }

    #[test]
    fn dates_are_detected() {
        let md = "# Timeline\nLaunch on 2026-03-15.\n";
        let sections = segment_note("n1", md);
        assert!(sections[0].features.has_dates);
    }

    #[test]
    fn raw_text_contains_body_verbatim() {
        let md = "# Notes\nUsers need better error visibility.\n";
        let sections = segment_note("n1", md);
        assert!(sections[0]
            .raw_text
            .contains("Users need better error visibility."));
    }

    #[test]
    fn line_numbers_are_one_based() {
        let md = "# A\nfirst\n# B\nsecond\n";
        let sections = segment_note("n1", md);
        assert_eq!(sections[0].start_line, 1);
        assert_eq!(sections[0].end_line, 2);
        assert_eq!(sections[1].start_line, 3);
    }
}
