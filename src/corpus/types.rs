use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    #[serde(other)]
    #[default]
    Other,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Other => "other",
        }
    }
}

/// One pre-aggregated entity row as exported by the backend.
#[derive(Clone, Debug, Deserialize)]
pub struct EntityRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default, rename = "mentionCount")]
    pub mention_count: u64,
    #[serde(default, rename = "documentCount")]
    pub document_count: u64,
    #[serde(default)]
    pub sections: Vec<SectionCount>,
}

impl EntityRow {
    /// Section label with the most mentions, used for category coloring.
    pub fn dominant_section(&self) -> Option<&str> {
        self.sections
            .iter()
            .max_by(|a, b| {
                a.mentions
                    .cmp(&b.mentions)
                    .then_with(|| b.section.cmp(&a.section))
            })
            .map(|entry| entry.section.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SectionCount {
    pub section: String,
    #[serde(default)]
    pub mentions: u64,
}

/// Unordered entity pair with proximity co-occurrence statistics. (A,B) and
/// (B,A) denote the same relationship.
#[derive(Clone, Debug, Deserialize)]
pub struct CoOccurrenceRow {
    #[serde(rename = "entityA")]
    pub entity_a: String,
    #[serde(rename = "entityB")]
    pub entity_b: String,
    #[serde(default, rename = "coOccurrences")]
    pub co_occurrences: u64,
    #[serde(default, rename = "sharedDocuments")]
    pub shared_documents: u64,
}

impl CoOccurrenceRow {
    /// Canonical (min, max) id key so symmetric duplicates collapse.
    pub fn canonical_key(&self) -> (&str, &str) {
        if self.entity_a <= self.entity_b {
            (self.entity_a.as_str(), self.entity_b.as_str())
        } else {
            (self.entity_b.as_str(), self.entity_a.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_section_prefers_highest_count() {
        let entity = EntityRow {
            id: "e1".to_owned(),
            name: "Example".to_owned(),
            kind: EntityKind::Person,
            mention_count: 10,
            document_count: 3,
            sections: vec![
                SectionCount {
                    section: "testimony".to_owned(),
                    mentions: 4,
                },
                SectionCount {
                    section: "summary".to_owned(),
                    mentions: 6,
                },
            ],
        };
        assert_eq!(entity.dominant_section(), Some("summary"));
    }

    #[test]
    fn canonical_key_is_order_independent() {
        let forward = CoOccurrenceRow {
            entity_a: "a".to_owned(),
            entity_b: "b".to_owned(),
            co_occurrences: 2,
            shared_documents: 1,
        };
        let reverse = CoOccurrenceRow {
            entity_a: "b".to_owned(),
            entity_b: "a".to_owned(),
            co_occurrences: 2,
            shared_documents: 1,
        };
        assert_eq!(forward.canonical_key(), reverse.canonical_key());
    }
}
