use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::types::{CoOccurrenceRow, EntityRow};

/// Decoded aggregate snapshot, normalized: entity ids unique and non-empty,
/// self-pairs and pairs over unknown entities dropped.
#[derive(Clone, Debug)]
pub(super) struct AggregateSnapshot {
    pub(super) entities: Vec<EntityRow>,
    pub(super) co_occurrences: Vec<CoOccurrenceRow>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    entities: Vec<EntityRow>,
    #[serde(default, rename = "coOccurrences")]
    co_occurrences: Vec<CoOccurrenceRow>,
}

pub(super) fn parse_snapshot(raw: &str) -> Result<AggregateSnapshot> {
    let parsed: RawSnapshot =
        serde_json::from_str(raw).context("invalid aggregate snapshot JSON")?;

    let mut seen_ids = HashSet::new();
    let mut entities = Vec::with_capacity(parsed.entities.len());
    for entity in parsed.entities {
        if entity.id.is_empty() {
            continue;
        }
        if !seen_ids.insert(entity.id.clone()) {
            return Err(anyhow!("duplicate entity id in snapshot: {}", entity.id));
        }
        entities.push(entity);
    }

    let mut seen_pairs = HashSet::new();
    let mut co_occurrences = Vec::with_capacity(parsed.co_occurrences.len());
    for pair in parsed.co_occurrences {
        if pair.entity_a == pair.entity_b {
            continue;
        }
        if !seen_ids.contains(&pair.entity_a) || !seen_ids.contains(&pair.entity_b) {
            continue;
        }

        let (low, high) = pair.canonical_key();
        if !seen_pairs.insert((low.to_owned(), high.to_owned())) {
            continue;
        }
        co_occurrences.push(pair);
    }

    // Most significant relationships first; ties broken by id for stable output.
    co_occurrences.sort_by(|a, b| {
        b.co_occurrences
            .cmp(&a.co_occurrences)
            .then_with(|| a.canonical_key().cmp(&b.canonical_key()))
    });

    Ok(AggregateSnapshot {
        entities,
        co_occurrences,
    })
}
