//! Business knowledge entities
//!
//! The graph is Domain → Feature → Component → code/test references. Every
//! link is held by id; the owning record is looked up on demand so snapshots
//! never embed copies of their parents.

use serde::{Deserialize, Serialize};

/// Id of the owner assigned to features mined without a known domain
pub const DEFAULT_DOMAIN_ID: &str = "default-domain";

/// Id of the owner assigned to components mined without a known feature
pub const DEFAULT_FEATURE_ID: &str = "default-feature";

/// Kind of business entity in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Domain,
    Feature,
    Component,
}

impl EntityKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Feature => "feature",
            Self::Component => "component",
        }
    }

    /// Plural form used by CLI subcommands
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Domain => "domains",
            Self::Feature => "features",
            Self::Component => "components",
        }
    }

    /// Heading/bullet keywords that mark a documentation section as this kind
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["domain", "module", "service"],
            Self::Feature => &["feature", "functionality"],
            Self::Component => &["component", "module", "service"],
        }
    }

    /// Whether bullet lines may start a new candidate of this kind
    pub fn accepts_bullets(&self) -> bool {
        !matches!(self, Self::Domain)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain => write!(f, "Domain"),
            Self::Feature => write!(f, "Feature"),
            Self::Component => write!(f, "Component"),
        }
    }
}

/// Kind of code entity a component reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeEntityKind {
    #[default]
    Class,
    Method,
    Field,
}

/// Kind of test entity a component reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestEntityKind {
    #[default]
    TestClass,
    TestMethod,
}

/// Association between a component and an external code entity
///
/// `confidence` is stored as given; callers clamp it to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntityReference {
    pub entity_id: String,
    pub entity_type: CodeEntityKind,
    pub confidence: f64,
}

impl CodeEntityReference {
    pub fn new(entity_id: impl Into<String>, entity_type: CodeEntityKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Association between a component and an external test entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntityReference {
    pub entity_id: String,
    pub entity_type: TestEntityKind,
    pub confidence: f64,
}

impl TestEntityReference {
    pub fn new(entity_id: impl Into<String>, entity_type: TestEntityKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Top-level business area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Stable, globally unique id; the only join key in the graph
    pub id: String,
    pub name: String,
    pub description: String,
    /// Parent domain, by id
    pub parent_id: Option<String>,
    pub tags: Vec<String>,
}

impl Domain {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            parent_id: None,
            tags: Vec::new(),
        }
    }

    /// Create a domain whose id is derived from its display name
    pub fn named(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(slugify(&name), name, description)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Capability within a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Owning domain, by id
    pub domain_id: String,
    pub tags: Vec<String>,
}

impl Feature {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        domain_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            domain_id: domain_id.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Implementation unit within a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Owning feature, by id
    pub feature_id: String,
    pub code_entities: Vec<CodeEntityReference>,
    pub test_entities: Vec<TestEntityReference>,
    pub tags: Vec<String>,
}

impl Component {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        feature_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            feature_id: feature_id.into(),
            code_entities: Vec::new(),
            test_entities: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Copy of this component with one more code reference appended
    pub fn with_code_entity(&self, reference: CodeEntityReference) -> Self {
        let mut updated = self.clone();
        updated.code_entities.push(reference);
        updated
    }

    /// Copy of this component with one more test reference appended
    pub fn with_test_entity(&self, reference: TestEntityReference) -> Self {
        let mut updated = self.clone();
        updated.test_entities.push(reference);
        updated
    }

    pub fn references_code_entity(&self, entity_id: &str) -> bool {
        self.code_entities.iter().any(|r| r.entity_id == entity_id)
    }

    pub fn references_test_entity(&self, entity_id: &str) -> bool {
        self.test_entities.iter().any(|r| r.entity_id == entity_id)
    }
}

/// Derive an id from a display name: spaces become hyphens, then lowercase
pub fn slugify(name: &str) -> String {
    name.replace(' ', "-").to_lowercase()
}

/// Turn an id back into a display name: hyphens become spaces, words capitalised
pub fn humanize(id: &str) -> String {
    id.replace('-', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) if first.is_lowercase() => {
                    first.to_uppercase().chain(chars).collect::<String>()
                }
                Some(first) => std::iter::once(first).chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
