//! Query execution: analyze the phrase, intersect postings, materialize
//! records, paginate, and time the whole thing.

use crate::analyzer::Analyzer;
use crate::index::{intersect_parallel, DocumentStore, InvertedIndex};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};

/// Fixed number of results per page.
pub const PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processed {
    pub time: f64,
    pub unit: String,
}

impl Processed {
    fn from_elapsed(elapsed: Duration) -> Self {
        let micros = elapsed.as_micros();
        if micros >= 1000 {
            Self {
                time: elapsed.as_millis() as f64,
                unit: "milliseconds".to_string(),
            }
        } else {
            Self {
                time: micros as f64 / 1000.0,
                unit: "microseconds".to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub rank: f64,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub processed: Processed,
    pub number_of_results: usize,
    pub current_page: u32,
    pub number_of_pages: u32,
    pub results: Vec<SearchResult>,
}

/// A frozen index and document store plus the analyzer that produced the
/// index keys. Queries take shared references only, so any number can run
/// concurrently.
pub struct SearchEngine {
    index: InvertedIndex,
    store: DocumentStore,
    analyzer: Analyzer,
    cores: usize,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex, store: DocumentStore) -> Self {
        let cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            index,
            store,
            analyzer: Analyzer::new(),
            cores,
        }
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Evaluates `phrase` as an AND of its analyzed tokens and returns the
    /// requested page of matches in ascending id order. A token with no
    /// posting list empties the intersection; this never fails.
    pub fn search(&self, phrase: &str, page: u32) -> SearchResults {
        let started = Instant::now();

        let tokens = self.analyzer.analyze(phrase);
        let mut matches: Option<RoaringBitmap> = None;
        for token in &tokens {
            let Some(postings) = self.index.get(token) else {
                matches = Some(RoaringBitmap::new());
                break;
            };
            matches = Some(match matches {
                None => postings.clone(),
                Some(acc) => intersect_parallel(self.cores, &acc, postings),
            });
        }
        let matches = matches.unwrap_or_default();

        let mut hits = Vec::with_capacity(matches.len() as usize);
        for id in &matches {
            // Ids without a record are skipped rather than reported.
            if let Some(doc) = self.store.get(id) {
                hits.push(SearchResult {
                    url: doc.url.clone(),
                    rank: 1.0,
                    title: doc.title.clone(),
                    abstract_text: doc.abstract_text.clone(),
                });
            }
        }

        let number_of_results = hits.len();
        let number_of_pages = number_of_results.div_ceil(PAGE_SIZE) as u32;
        let current_page = if number_of_pages == 0 {
            0
        } else {
            page.clamp(1, number_of_pages)
        };
        let skip = (current_page.saturating_sub(1) as usize) * PAGE_SIZE;
        let results: Vec<SearchResult> = hits.into_iter().skip(skip).take(PAGE_SIZE).collect();

        let processed = Processed::from_elapsed(started.elapsed());
        tracing::debug!(
            phrase,
            page,
            returned = results.len(),
            total = number_of_results,
            "executed query"
        );
        SearchResults {
            processed,
            number_of_results,
            current_page,
            number_of_pages,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Document, IndexBuilder};

    fn doc(id: u32, title: &str, url: &str, abstract_text: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            url: url.to_string(),
            abstract_text: abstract_text.to_string(),
        }
    }

    fn engine(docs: Vec<Document>) -> SearchEngine {
        let (index, store) = IndexBuilder::new()
            .with_workers(2)
            .build(docs.into_iter().map(Ok))
            .unwrap();
        SearchEngine::new(index, store)
    }

    fn two_doc_engine() -> SearchEngine {
        engine(vec![
            doc(0, "Alpha Bravo", "u0", "hello world"),
            doc(1, "Charlie", "u1", "hello Alpha"),
        ])
    }

    #[test]
    fn single_term_matches_both_documents() {
        let results = two_doc_engine().search("alpha", 1);
        assert_eq!(results.number_of_results, 2);
        assert_eq!(results.current_page, 1);
        assert_eq!(results.number_of_pages, 1);
        let urls: Vec<&str> = results.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["u0", "u1"]);
        assert!(results.results.iter().all(|r| r.rank == 1.0));
    }

    #[test]
    fn multi_term_queries_use_and_semantics() {
        let results = two_doc_engine().search("hello world", 1);
        assert_eq!(results.number_of_results, 1);
        assert_eq!(results.results[0].url, "u0");
        assert_eq!(results.results[0].title, "Alpha Bravo");
    }

    #[test]
    fn stop_word_only_query_is_empty() {
        let results = two_doc_engine().search("the", 1);
        assert_eq!(results.number_of_results, 0);
        assert_eq!(results.number_of_pages, 0);
        assert_eq!(results.current_page, 0);
        assert!(results.results.is_empty());
    }

    #[test]
    fn unknown_token_empties_the_intersection() {
        let results = two_doc_engine().search("hello zzzyx", 1);
        assert_eq!(results.number_of_results, 0);
    }

    #[test]
    fn query_terms_are_analyzed_like_documents() {
        // "Running" in a document must be reachable via "runs"/"running".
        let e = engine(vec![doc(0, "Running", "u0", "jogging daily")]);
        assert_eq!(e.search("running", 1).number_of_results, 1);
        assert_eq!(e.search("RUNS", 1).number_of_results, 1);
    }

    #[test]
    fn pages_partition_the_result_list() {
        let docs: Vec<Document> = (0..60)
            .map(|i| doc(i, "Common", &format!("u{i}"), "shared token"))
            .collect();
        let e = engine(docs);

        let first = e.search("common", 1);
        assert_eq!(first.number_of_results, 60);
        assert_eq!(first.number_of_pages, 3);
        assert_eq!(first.results.len(), PAGE_SIZE);

        let mut seen: Vec<String> = Vec::new();
        for page in 1..=3 {
            let chunk = e.search("common", page);
            assert_eq!(chunk.current_page, page);
            seen.extend(chunk.results.into_iter().map(|r| r.url));
        }
        assert_eq!(seen.len(), 60);
        let expected: Vec<String> = (0..60).map(|i| format!("u{i}")).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let docs: Vec<Document> = (0..30)
            .map(|i| doc(i, "Common", &format!("u{i}"), "shared token"))
            .collect();
        let e = engine(docs);

        let clamped = e.search("common", 99);
        assert_eq!(clamped.current_page, 2);
        assert_eq!(clamped.results.len(), 5);

        // Page zero serves the first page.
        let zero = e.search("common", 0);
        assert_eq!(zero.current_page, 1);
        assert_eq!(zero.results.len(), PAGE_SIZE);
    }

    #[test]
    fn timing_unit_matches_the_scale() {
        let fast = Processed::from_elapsed(Duration::from_micros(250));
        assert_eq!(fast.unit, "microseconds");
        assert!((fast.time - 0.25).abs() < f64::EPSILON);

        let slow = Processed::from_elapsed(Duration::from_millis(12));
        assert_eq!(slow.unit, "milliseconds");
        assert_eq!(slow.time, 12.0);
    }

    #[test]
    fn response_serializes_with_the_wire_field_names() {
        let results = two_doc_engine().search("alpha", 1);
        let value = serde_json::to_value(&results).unwrap();
        assert!(value["processed"]["time"].is_number());
        assert!(value["processed"]["unit"].is_string());
        assert_eq!(value["number_of_results"], serde_json::json!(2));
        assert_eq!(value["results"][0]["rank"], serde_json::json!(1.0));
        assert!(value["results"][0]["abstract"].is_string());
    }
}
