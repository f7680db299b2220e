// crates/rca-core/src/normalize.rs
//
// Response normalizer: turns free-form model text into fixed RCA sections.
//
// Extraction is keyword-delimited and best-effort. Each known keyword is
// located by its first literal (case-sensitive) occurrence; a section body
// runs from just after its keyword to the nearest later keyword in the list,
// or to the end of the text. Reordered or repeated headings in the model
// output give undefined boundaries.

use crate::report::RcaFields;

/// The four sections of an RCA, in the order the prompt asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    RcaDescription,
    ProbableCauses,
    Impacts,
    RecommendedActions,
}

impl Section {
    /// All sections in extraction order.
    pub const ALL: [Section; 4] = [
        Section::RcaDescription,
        Section::ProbableCauses,
        Section::Impacts,
        Section::RecommendedActions,
    ];

    /// Heading text searched for in the model output.
    pub fn keyword(self) -> &'static str {
        match self {
            Section::RcaDescription => "RCA Description",
            Section::ProbableCauses => "Probable Causes",
            Section::Impacts => "Impacts",
            Section::RecommendedActions => "Recommended Actions",
        }
    }

    /// Placeholder stored when the heading is missing.
    pub fn sentinel(self) -> String {
        format!("{} section not found.", self.keyword())
    }

    /// List sections are re-rendered as bullets; the description stays prose.
    fn is_list(self) -> bool {
        !matches!(self, Section::RcaDescription)
    }

    fn index(self) -> usize {
        match self {
            Section::RcaDescription => 0,
            Section::ProbableCauses => 1,
            Section::Impacts => 2,
            Section::RecommendedActions => 3,
        }
    }
}

/// Outcome of looking for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Heading present; carries the cleaned body.
    Found(String),
    /// Heading absent from the output.
    NotFound,
}

impl Extraction {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    fn into_text(self, section: Section) -> String {
        match self {
            Extraction::Found(text) => text,
            Extraction::NotFound => section.sentinel(),
        }
    }
}

/// Per-section extraction results, keeping the found/not-found distinction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSections {
    sections: [Extraction; 4],
}

impl ExtractedSections {
    pub fn get(&self, section: Section) -> &Extraction {
        &self.sections[section.index()]
    }

    /// Sections whose heading was missing.
    pub fn missing(&self) -> Vec<Section> {
        Section::ALL
            .iter()
            .copied()
            .filter(|s| !self.get(*s).is_found())
            .collect()
    }

    /// Collapse into the external field set, substituting sentinels.
    pub fn into_fields(self) -> RcaFields {
        let [description, causes, impacts, actions] = self.sections;
        RcaFields {
            rca_description: description.into_text(Section::RcaDescription),
            probable_causes: causes.into_text(Section::ProbableCauses),
            impacts: impacts.into_text(Section::Impacts),
            recommended_actions: actions.into_text(Section::RecommendedActions),
        }
    }
}

/// Normalize raw model text into RCA fields. Never fails.
pub fn normalize(raw: &str) -> RcaFields {
    extract_sections(raw).into_fields()
}

/// Locate and clean every known section in `raw`.
pub fn extract_sections(raw: &str) -> ExtractedSections {
    let sections = Section::ALL.map(|section| match raw.find(section.keyword()) {
        None => Extraction::NotFound,
        Some(pos) => {
            let body_start = pos + section.keyword().len();
            let body_end = Section::ALL[section.index() + 1..]
                .iter()
                .filter_map(|later| {
                    raw[body_start..]
                        .find(later.keyword())
                        .map(|offset| body_start + offset)
                })
                .min()
                .unwrap_or(raw.len());
            Extraction::Found(clean_section(section, &raw[body_start..body_end]))
        }
    });

    ExtractedSections { sections }
}

/// True if `text` is one of the section sentinels.
pub fn is_sentinel(text: &str) -> bool {
    Section::ALL.iter().any(|s| text == s.sentinel())
}

/// Strip markers, drop blank lines, and re-render a section body.
///
/// Falls back to the raw body when nothing survives cleanup.
fn clean_section(section: Section, raw: &str) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(strip_line_markers)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return raw.to_string();
    }

    if section.is_list() {
        lines
            .iter()
            .map(|line| format!("- {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        lines.join("\n")
    }
}

/// Remove leading colons, bullets and numbering tokens until none remain.
fn strip_line_markers(line: &str) -> &str {
    let mut rest = line.trim();
    loop {
        let before = rest.len();
        rest = rest.trim_start_matches(':').trim_start();
        rest = strip_bullet(rest);
        rest = strip_numbering(rest);
        if rest.len() == before {
            break;
        }
    }
    rest.trim_end()
}

fn strip_bullet(s: &str) -> &str {
    for marker in ['-', '*', '•'] {
        if let Some(after) = s.strip_prefix(marker) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return after.trim_start();
            }
        }
    }
    s
}

/// `1.` / `12)` followed by whitespace or end of line.
fn strip_numbering(s: &str) -> &str {
    let digits = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }
    let rest = &s[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) if after.is_empty() || after.starts_with(char::is_whitespace) => {
            after.trim_start()
        }
        _ => s,
    }
}
