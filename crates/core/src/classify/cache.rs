use std::collections::HashMap;
use std::sync::Arc;

use lanewise_protocol::SharedStr;
use tracing::debug;

use super::{SemanticTags, classify};
use crate::brush::{ActiveBrush, Ambient, brush_signature, matches};
use crate::model::{CommitEvent, InteractionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TagKey {
    uuid: SharedStr,
    version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    uuid: SharedStr,
    version: u64,
    brush: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub tag_hits: u64,
    pub tag_misses: u64,
    pub match_hits: u64,
    pub match_misses: u64,
    pub invalidations: u64,
}

/// Memoized classification and brush results for one lane.
///
/// Tags are keyed by `(uuid, sibling-set version)`, match results by
/// `(uuid, version, brush signature)`. Bumping the version drops every
/// entry; changing the brush drops only match results.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    version: u64,
    brush: u64,
    tags: HashMap<TagKey, Arc<SemanticTags>>,
    matched: HashMap<MatchKey, bool>,
    stats: CacheStats,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn observe_version(&mut self, version: u64) {
        if version != self.version {
            if !self.tags.is_empty() || !self.matched.is_empty() {
                debug!(
                    from = self.version,
                    to = version,
                    dropped = self.tags.len(),
                    "classification cache invalidated"
                );
                self.stats.invalidations += 1;
            }
            self.tags.clear();
            self.matched.clear();
            self.version = version;
        }
    }

    pub fn tags(
        &mut self,
        version: u64,
        record: &InteractionRecord,
        siblings: &[InteractionRecord],
        commits: &[CommitEvent],
    ) -> Arc<SemanticTags> {
        self.observe_version(version);
        let key = TagKey {
            uuid: record.uuid.clone(),
            version,
        };
        if let Some(tags) = self.tags.get(&key) {
            self.stats.tag_hits += 1;
            return Arc::clone(tags);
        }
        self.stats.tag_misses += 1;
        let tags = Arc::new(classify(record, siblings, commits));
        self.tags.insert(key, Arc::clone(&tags));
        tags
    }

    pub fn matched(
        &mut self,
        version: u64,
        brush: Option<&ActiveBrush>,
        record: &InteractionRecord,
        tags: &SemanticTags,
    ) -> bool {
        self.observe_version(version);
        let signature = brush_signature(brush);
        if signature == 0 {
            return true;
        }
        if signature != self.brush {
            self.matched.clear();
            self.brush = signature;
        }
        let key = MatchKey {
            uuid: record.uuid.clone(),
            version,
            brush: signature,
        };
        if let Some(hit) = self.matched.get(&key) {
            self.stats.match_hits += 1;
            return *hit;
        }
        self.stats.match_misses += 1;
        let result = matches(brush, tags, Ambient::of(record));
        self.matched.insert(key, result);
        result
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use serde_json::json;

    fn records() -> Vec<InteractionRecord> {
        vec![
            InteractionRecord::new("a", Role::Assistant)
                .with_tool("Bash", json!({ "command": "ls" })),
            InteractionRecord::new("b", Role::Assistant).with_text("done"),
        ]
    }

    #[test]
    fn second_lookup_hits() {
        let rs = records();
        let mut cache = ClassificationCache::new();
        let first = cache.tags(1, &rs[0], &rs, &[]);
        let second = cache.tags(1, &rs[0], &rs, &[]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().tag_hits, 1);
        assert_eq!(cache.stats().tag_misses, 1);
    }

    #[test]
    fn version_bump_invalidates() {
        let rs = records();
        let mut cache = ClassificationCache::new();
        cache.tags(1, &rs[0], &rs, &[]);
        cache.tags(1, &rs[1], &rs, &[]);
        assert_eq!(cache.len(), 2);
        cache.tags(2, &rs[0], &rs, &[]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().invalidations, 1);
        assert_eq!(cache.stats().tag_misses, 3);
    }

    #[test]
    fn brush_change_recomputes_matches() {
        let rs = records();
        let mut cache = ClassificationCache::new();
        let tags = cache.tags(1, &rs[0], &rs, &[]);
        let tool = ActiveBrush::any_tool();
        assert!(cache.matched(1, Some(&tool), &rs[0], &tags));
        assert!(cache.matched(1, Some(&tool), &rs[0], &tags));
        assert_eq!(cache.stats().match_hits, 1);

        let errors = ActiveBrush::errors();
        assert!(!cache.matched(1, Some(&errors), &rs[0], &tags));
        assert_eq!(cache.stats().match_misses, 2);
        // tags survive a brush change
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn no_brush_skips_the_table() {
        let rs = records();
        let mut cache = ClassificationCache::new();
        let tags = cache.tags(1, &rs[1], &rs, &[]);
        assert!(cache.matched(1, None, &rs[1], &tags));
        assert_eq!(cache.stats().match_misses, 0);
    }
}
