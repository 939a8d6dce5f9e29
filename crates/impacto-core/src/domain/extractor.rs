//! Heuristic entity extraction from documentation text
//!
//! Documentation returned by the remote tool is free-form markdown. The
//! extractor walks it line by line, keeping a pointer to the entity currently
//! being described:
//!
//! - a heading (`#` to `###`) whose text contains a keyword for the target
//!   kind starts a new candidate; any other heading closes the current one
//! - for features and components, a bullet (`-` / `*`) containing a keyword
//!   also starts a candidate
//! - lines opening with `-` or `*` are never part of a description
//! - any other non-blank line is appended to the current candidate's
//!   description
//!
//! Sections without a keyword are dropped, trading recall for precision.

use tracing::debug;

use super::entity::{Component, Domain, EntityKind, Feature, humanize, slugify};

/// Deepest heading level treated as an entity heading
const MAX_HEADING_LEVEL: usize = 3;

/// A candidate produced by extraction, before it is typed and persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Candidate {
    fn new(name: &str) -> Self {
        Self {
            id: slugify(name),
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn append(&mut self, text: &str) {
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(text);
    }
}

enum Line<'a> {
    Heading(&'a str),
    /// Any line opening with `-` or `*`; named only for list items (`- x`, `* x`)
    Bullet(Option<&'a str>),
    Text(&'a str),
    Blank,
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }

    let level = line.chars().take_while(|c| *c == '#').count();
    if (1..=MAX_HEADING_LEVEL).contains(&level) {
        let rest = &line[level..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Line::Heading(rest.trim());
        }
    }

    if trimmed.starts_with(['-', '*']) {
        let name = ["- ", "* "]
            .into_iter()
            .find_map(|marker| trimmed.strip_prefix(marker))
            .map(str::trim);
        return Line::Bullet(name);
    }

    Line::Text(trimmed)
}

fn matches_kind(name: &str, kind: EntityKind) -> bool {
    let lower = name.to_lowercase();
    kind.keywords().iter().any(|keyword| lower.contains(keyword))
}

/// Line-oriented extractor for domain, feature and component candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentationExtractor;

impl DocumentationExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract untyped candidates of the given kind
    pub fn extract(&self, documentation: &str, kind: EntityKind) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut current: Option<usize> = None;

        for line in documentation.lines() {
            match classify(line) {
                Line::Heading(name) => {
                    if matches_kind(name, kind) {
                        candidates.push(Candidate::new(name));
                        current = Some(candidates.len() - 1);
                    } else {
                        current = None;
                    }
                }
                Line::Bullet(Some(name)) => {
                    if kind.accepts_bullets() && matches_kind(name, kind) {
                        candidates.push(Candidate::new(name));
                        current = Some(candidates.len() - 1);
                    }
                }
                Line::Bullet(None) => {}
                Line::Text(text) => {
                    if let Some(index) = current {
                        candidates[index].append(text);
                    }
                }
                Line::Blank => {}
            }
        }

        debug!(kind = %kind, count = candidates.len(), "Extracted candidates from documentation");
        candidates
    }

    /// Extract domain candidates
    pub fn extract_domains(&self, documentation: &str) -> Vec<Domain> {
        self.extract(documentation, EntityKind::Domain)
            .into_iter()
            .map(|c| Domain::new(c.id, c.name, c.description))
            .collect()
    }

    /// Extract feature candidates owned by `domain_id`
    pub fn extract_features(&self, documentation: &str, domain_id: &str) -> Vec<Feature> {
        self.extract(documentation, EntityKind::Feature)
            .into_iter()
            .map(|c| Feature::new(c.id, c.name, c.description, domain_id))
            .collect()
    }

    /// Extract component candidates owned by `feature_id`
    pub fn extract_components(&self, documentation: &str, feature_id: &str) -> Vec<Component> {
        self.extract(documentation, EntityKind::Component)
            .into_iter()
            .map(|c| Component::new(c.id, c.name, c.description, feature_id))
            .collect()
    }
}

/// Minimal record for an id referenced by configuration but not yet known
pub fn placeholder(kind: EntityKind, id: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        name: humanize(id),
        description: format!("{kind} created from configuration"),
    }
}

pub fn placeholder_domain(id: &str) -> Domain {
    let c = placeholder(EntityKind::Domain, id);
    Domain::new(c.id, c.name, c.description)
}

pub fn placeholder_feature(id: &str, domain_id: &str) -> Feature {
    let c = placeholder(EntityKind::Feature, id);
    Feature::new(c.id, c.name, c.description, domain_id)
}

pub fn placeholder_component(id: &str, feature_id: &str) -> Component {
    let c = placeholder(EntityKind::Component, id);
    Component::new(c.id, c.name, c.description, feature_id)
}
