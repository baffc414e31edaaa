use crate::matcher::MatchSpec;
use crate::parser::Record;
use crate::settings::Settings;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

/// Surviving record count after each stage; `None` for stages that were
/// not active this run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_time_range: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_start_keyword: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_search_keywords: Option<usize>,
}

/// Holds the ingested records and narrows them stage by stage.
///
/// The working set keeps ingestion order throughout; every stage is a pure
/// narrowing of it, never an expansion or reorder.
#[derive(Debug, Default)]
pub struct FilterEngine {
    records: Vec<Record>,
}

impl FilterEngine {
    pub fn new() -> FilterEngine {
        FilterEngine::default()
    }

    /// Takes ownership of the ingested records, in input order.
    pub fn ingest(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Runs the active stages in their fixed order: time range, then the
    /// start-keyword trim that establishes the capture boundary, then the
    /// keyword search within it. Inactive stages are skipped entirely.
    pub fn apply(&mut self, settings: &Settings) -> StageCounts {
        let mut counts = StageCounts::default();

        if let Some(range) = settings.time_range {
            self.filter_by_time_range(range.start, range.end);
            counts.after_time_range = Some(self.records.len());
        }

        if let Some(start) = &settings.start_keyword {
            self.filter_by_start_keyword(start);
            counts.after_start_keyword = Some(self.records.len());
        }

        if !settings.search_keywords.is_empty() {
            self.filter_by_keywords(&settings.search_keywords);
            counts.after_search_keywords = Some(self.records.len());
        }

        counts
    }

    /// Keeps records whose timestamp falls inside the inclusive window;
    /// one-sided when only one bound is given. Records without a parsed
    /// timestamp are dropped while this stage is active. Both bounds absent
    /// is a no-op.
    pub fn filter_by_time_range(
        &mut self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) {
        if start.is_none() && end.is_none() {
            return;
        }
        self.records.retain(|record| {
            let Some(ts) = record.timestamp else {
                return false;
            };
            start.is_none_or(|s| ts >= s) && end.is_none_or(|e| ts <= e)
        });
    }

    /// Drops everything before the first record matching `start`; that
    /// record and every one after it are kept whether or not they match
    /// again. No match leaves nothing.
    pub fn filter_by_start_keyword(&mut self, start: &MatchSpec) {
        match self.records.iter().position(|record| start.matches(record)) {
            Some(index) => {
                self.records.drain(..index);
            }
            None => self.records.clear(),
        }
    }

    /// Keeps the union of the per-keyword match sets: each keyword selects
    /// its own subset of the current working set, and the union is
    /// deduplicated by record identity with input order preserved.
    pub fn filter_by_keywords(&mut self, specs: &[MatchSpec]) {
        let mut keep: BTreeSet<usize> = BTreeSet::new();
        for spec in specs {
            keep.extend(
                self.records
                    .iter()
                    .enumerate()
                    .filter(|(_, record)| spec.matches(record))
                    .map(|(index, _)| index),
            );
        }

        let mut index = 0;
        self.records.retain(|_| {
            let kept = keep.contains(&index);
            index += 1;
            kept
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: &str) -> Record {
        Record::from_value(&serde_json::json!({
            "timeStamp": "04-23-2021 12:00:11",
            "delayMillis": 450,
            "properties": { "body": body }
        }))
    }

    fn engine(bodies: &[&str]) -> FilterEngine {
        let mut engine = FilterEngine::new();
        engine.ingest(bodies.iter().map(|b| record(b)).collect());
        engine
    }

    fn bodies(engine: &FilterEngine) -> Vec<String> {
        engine
            .records()
            .iter()
            .map(|r| r.tokens.join(" "))
            .collect()
    }

    #[test]
    fn test_start_keyword_keeps_a_contiguous_suffix() {
        let mut engine = engine(&["boot", "idle", "login ok", "idle", "login again", "shutdown"]);
        engine.filter_by_start_keyword(&MatchSpec::resolve("login").unwrap());
        assert_eq!(
            bodies(&engine),
            vec!["login ok", "idle", "login again", "shutdown"]
        );
    }

    #[test]
    fn test_start_keyword_without_match_leaves_nothing() {
        let mut engine = engine(&["boot", "idle"]);
        engine.filter_by_start_keyword(&MatchSpec::resolve("login").unwrap());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_keyword_union_preserves_input_order() {
        let mut engine = engine(&["alpha", "beta", "gamma", "delta"]);
        let specs = vec![
            MatchSpec::resolve("delta").unwrap(),
            MatchSpec::resolve("alpha").unwrap(),
        ];
        engine.filter_by_keywords(&specs);
        assert_eq!(bodies(&engine), vec!["alpha", "delta"]);
    }

    #[test]
    fn test_time_range_noop_when_both_bounds_absent() {
        let mut engine = engine(&["a", "b"]);
        engine.filter_by_time_range(None, None);
        assert_eq!(engine.len(), 2);
    }
}
