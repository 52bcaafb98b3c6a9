use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result, anyhow};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::parse::{AggregateSnapshot, parse_snapshot};
use super::types::{CoOccurrenceRow, EntityRow, SectionCount};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntitySort {
    Mentions,
    Documents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Descending,
    Ascending,
}

/// Read-only contract to the analytics backend. The UI never touches raw
/// corpus data directly; everything arrives through these four operations.
pub trait AggregateGateway: Send + Sync {
    fn top_entities(&self, sort: EntitySort, order: SortOrder, limit: usize)
    -> Result<Vec<EntityRow>>;

    /// Pairs with at least `min_co_occurrences`, most significant first,
    /// truncated to `limit`.
    fn co_occurrence_pairs(
        &self,
        min_co_occurrences: u64,
        limit: usize,
    ) -> Result<Vec<CoOccurrenceRow>>;

    fn section_breakdown(&self, entity_id: &str) -> Result<Vec<SectionCount>>;

    fn search_entities(&self, query: &str, limit: usize) -> Result<Vec<EntityRow>>;
}

/// Gateway backed by a pre-aggregated snapshot file exported from the backend.
pub struct SnapshotGateway {
    entities: Vec<EntityRow>,
    co_occurrences: Vec<CoOccurrenceRow>,
    index_by_id: HashMap<String, usize>,
}

pub fn load_snapshot_gateway(path: &str) -> Result<SnapshotGateway> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read aggregate snapshot {path}"))?;
    let snapshot =
        parse_snapshot(&raw).with_context(|| format!("failed to parse aggregate snapshot {path}"))?;
    Ok(SnapshotGateway::new(snapshot))
}

impl SnapshotGateway {
    pub(super) fn new(snapshot: AggregateSnapshot) -> Self {
        let index_by_id = snapshot
            .entities
            .iter()
            .enumerate()
            .map(|(index, entity)| (entity.id.clone(), index))
            .collect();

        Self {
            entities: snapshot.entities,
            co_occurrences: snapshot.co_occurrences,
            index_by_id,
        }
    }

    #[cfg(test)]
    pub fn from_rows(entities: Vec<EntityRow>, co_occurrences: Vec<CoOccurrenceRow>) -> Self {
        let mut co_occurrences = co_occurrences;
        co_occurrences.sort_by(|a, b| {
            b.co_occurrences
                .cmp(&a.co_occurrences)
                .then_with(|| a.canonical_key().cmp(&b.canonical_key()))
        });
        Self::new(AggregateSnapshot {
            entities,
            co_occurrences,
        })
    }
}

impl AggregateGateway for SnapshotGateway {
    fn top_entities(
        &self,
        sort: EntitySort,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<EntityRow>> {
        let key = |entity: &EntityRow| match sort {
            EntitySort::Mentions => entity.mention_count,
            EntitySort::Documents => entity.document_count,
        };

        let mut rows = self.entities.clone();
        rows.sort_by(|a, b| match order {
            SortOrder::Descending => key(b).cmp(&key(a)).then_with(|| a.id.cmp(&b.id)),
            SortOrder::Ascending => key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id)),
        });
        rows.truncate(limit);
        Ok(rows)
    }

    fn co_occurrence_pairs(
        &self,
        min_co_occurrences: u64,
        limit: usize,
    ) -> Result<Vec<CoOccurrenceRow>> {
        // Stored most-significant-first, so truncation keeps the top pairs.
        let rows = self
            .co_occurrences
            .iter()
            .filter(|pair| pair.co_occurrences >= min_co_occurrences)
            .take(limit)
            .cloned()
            .collect();
        Ok(rows)
    }

    fn section_breakdown(&self, entity_id: &str) -> Result<Vec<SectionCount>> {
        let &index = self
            .index_by_id
            .get(entity_id)
            .ok_or_else(|| anyhow!("unknown entity id: {entity_id}"))?;

        let mut sections = self.entities[index].sections.clone();
        sections.sort_by(|a, b| {
            b.mentions
                .cmp(&a.mentions)
                .then_with(|| a.section.cmp(&b.section))
        });
        Ok(sections)
    }

    fn search_entities(&self, query: &str, limit: usize) -> Result<Vec<EntityRow>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .entities
            .iter()
            .filter_map(|entity| {
                matcher
                    .fuzzy_match(&entity.name, query)
                    .or_else(|| {
                        matcher.fuzzy_match(&entity.name.to_ascii_lowercase(), &query.to_ascii_lowercase())
                    })
                    .map(|score| (score, entity))
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_score, entity)| entity.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::types::EntityKind;

    fn entity(id: &str, name: &str, mentions: u64, documents: u64) -> EntityRow {
        EntityRow {
            id: id.to_owned(),
            name: name.to_owned(),
            kind: EntityKind::Person,
            mention_count: mentions,
            document_count: documents,
            sections: vec![
                SectionCount {
                    section: "summary".to_owned(),
                    mentions: mentions / 2,
                },
                SectionCount {
                    section: "testimony".to_owned(),
                    mentions,
                },
            ],
        }
    }

    fn pair(a: &str, b: &str, co: u64, shared: u64) -> CoOccurrenceRow {
        CoOccurrenceRow {
            entity_a: a.to_owned(),
            entity_b: b.to_owned(),
            co_occurrences: co,
            shared_documents: shared,
        }
    }

    fn gateway() -> SnapshotGateway {
        SnapshotGateway::from_rows(
            vec![
                entity("a", "Arthur Blake", 100, 30),
                entity("b", "Beatrice Cole", 50, 40),
                entity("c", "Cromwell Trust", 5, 2),
            ],
            vec![pair("a", "b", 10, 8), pair("b", "c", 1, 1)],
        )
    }

    #[test]
    fn top_entities_sorts_and_truncates() {
        let gateway = gateway();
        let by_mentions = gateway
            .top_entities(EntitySort::Mentions, SortOrder::Descending, 2)
            .unwrap();
        assert_eq!(
            by_mentions.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(),
            ["a", "b"]
        );

        let by_documents = gateway
            .top_entities(EntitySort::Documents, SortOrder::Descending, 3)
            .unwrap();
        assert_eq!(by_documents[0].id, "b");

        let ascending = gateway
            .top_entities(EntitySort::Mentions, SortOrder::Ascending, 1)
            .unwrap();
        assert_eq!(ascending[0].id, "c");
    }

    #[test]
    fn co_occurrence_pairs_apply_threshold_and_order() {
        let gateway = gateway();
        let pairs = gateway.co_occurrence_pairs(5, 500).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].canonical_key(), ("a", "b"));

        let all = gateway.co_occurrence_pairs(0, 500).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].co_occurrences >= all[1].co_occurrences);

        let limited = gateway.co_occurrence_pairs(0, 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].co_occurrences, 10);
    }

    #[test]
    fn section_breakdown_sorted_and_missing_id_errors() {
        let gateway = gateway();
        let sections = gateway.section_breakdown("a").unwrap();
        assert_eq!(sections[0].section, "testimony");
        assert!(sections[0].mentions >= sections[1].mentions);

        assert!(gateway.section_breakdown("nope").is_err());
    }

    #[test]
    fn search_matches_fuzzily() {
        let gateway = gateway();
        let hits = gateway.search_entities("beatrice", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");

        assert!(gateway.search_entities("   ", 10).unwrap().is_empty());
        assert!(gateway.search_entities("zzzz", 10).unwrap().is_empty());
    }
}
