//! The inverted index, the document store, and the parallel index builder.

use crate::analyzer::Analyzer;
use crate::Result;
use parking_lot::Mutex;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::thread;
use std::time::Instant;

/// Ingest fan-out width is `available cores x this multiplier`.
pub const WORKER_MULTIPLIER: usize = 2;

/// Capacity hint for the record buffer; one abstract shard holds on the
/// order of half a million documents.
pub const DOCUMENT_CAPACITY: usize = 1 << 19;

/// Below this many candidate ids the intersection runs on the calling
/// thread; spawning workers costs more than the scan.
const PARALLEL_INTERSECT_CUTOFF: u64 = 4096;

/// One record of the abstracts dataset. Immutable after ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "index")]
    pub id: u32,
    pub title: String,
    pub url: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Mapping from analyzed token to the set of documents containing it.
///
/// Mutated only while an index is being built or loaded; every reader after
/// that observes a frozen value.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, RoaringBitmap>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `id` into the posting list for `token`, creating the list on
    /// first insert. Idempotent on `(token, id)`.
    pub fn add(&mut self, token: String, id: u32) {
        self.postings.entry(token).or_default().insert(id);
    }

    pub fn get(&self, token: &str) -> Option<&RoaringBitmap> {
        self.postings.get(token)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RoaringBitmap)> {
        self.postings.iter()
    }

    /// Transient array form used by the JSON dump.
    pub fn to_arrays(&self) -> HashMap<&str, Vec<u32>> {
        self.postings
            .iter()
            .map(|(token, ids)| (token.as_str(), to_sorted_ids(ids)))
            .collect()
    }

    pub fn from_arrays(arrays: HashMap<String, Vec<u32>>) -> Self {
        let postings = arrays
            .into_iter()
            .map(|(token, ids)| (token, ids.into_iter().collect()))
            .collect();
        Self { postings }
    }
}

/// Exports a posting list as an ascending id array.
pub fn to_sorted_ids(bitmap: &RoaringBitmap) -> Vec<u32> {
    bitmap.iter().collect()
}

/// Intersection of two posting lists, fanned out over up to `degree`
/// threads. The smaller operand's ids are partitioned into contiguous
/// chunks and each worker probes the larger operand, so the union of the
/// per-chunk results is exactly the intersection.
pub fn intersect_parallel(
    degree: usize,
    a: &RoaringBitmap,
    b: &RoaringBitmap,
) -> RoaringBitmap {
    let (outer, inner) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if degree <= 1 || outer.len() <= PARALLEL_INTERSECT_CUTOFF {
        return outer & inner;
    }

    let ids = to_sorted_ids(outer);
    let chunk_size = ids.len().div_ceil(degree).max(1);
    thread::scope(|scope| {
        let handles: Vec<_> = ids
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .copied()
                        .filter(|id| inner.contains(*id))
                        .collect::<RoaringBitmap>()
                })
            })
            .collect();

        let mut intersection = RoaringBitmap::new();
        for handle in handles {
            match handle.join() {
                Ok(part) => intersection |= part,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        intersection
    })
}

/// Mapping from document id to its full record. Populated once, then
/// read-only.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: HashMap<u32, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc: Document) {
        self.docs.insert(doc.id, doc);
    }

    pub fn get(&self, id: u32) -> Option<&Document> {
        self.docs.get(&id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<u32, Document> {
        &self.docs
    }

    pub fn from_map(docs: HashMap<u32, Document>) -> Self {
        Self { docs }
    }
}

/// Concurrent ingestion of a record stream into an index and store.
///
/// The producer drains the stream serially, filling the document store and
/// collecting the text to analyze. The records are then partitioned into
/// contiguous chunks handed to scoped worker threads that share the posting
/// map behind a single mutex. Returns only after every worker has finished.
pub struct IndexBuilder {
    analyzer: Analyzer,
    workers: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        let cores = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            analyzer: Analyzer::new(),
            workers: cores * WORKER_MULTIPLIER,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn build<I>(&self, records: I) -> Result<(InvertedIndex, DocumentStore)>
    where
        I: IntoIterator<Item = Result<Document>>,
    {
        let started = Instant::now();
        let mut store = DocumentStore::new();
        let mut items: Vec<(u32, String)> = Vec::with_capacity(DOCUMENT_CAPACITY);
        for record in records {
            let record = record?;
            items.push((
                record.id,
                format!("{} {}", record.title, record.abstract_text),
            ));
            store.insert(record);
        }
        tracing::info!(
            documents = items.len(),
            seconds = started.elapsed().as_secs_f64(),
            "collected document records"
        );

        let indexing = Instant::now();
        let index = Mutex::new(InvertedIndex::new());
        let chunk_size = items.len().div_ceil(self.workers).max(1);
        thread::scope(|scope| {
            let index = &index;
            let analyzer = &self.analyzer;
            for chunk in items.chunks(chunk_size) {
                scope.spawn(move || {
                    for (id, text) in chunk {
                        for token in analyzer.analyze(text) {
                            index.lock().add(token, *id);
                        }
                    }
                });
            }
        });
        let index = index.into_inner();
        tracing::info!(
            tokens = index.len(),
            seconds = indexing.elapsed().as_secs_f64(),
            "indexed documents"
        );
        Ok((index, store))
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
