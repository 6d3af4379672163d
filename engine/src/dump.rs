//! On-disk persistence for the index and document store.
//!
//! Both dumps are plain JSON so they can be inspected and consumed outside
//! the engine: the index dump maps each token to its ascending id array,
//! the data dump maps each id to its full record.

use crate::index::{Document, DocumentStore, InvertedIndex};
use crate::Result;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub fn save_index<P: AsRef<Path>>(index: &InvertedIndex, path: P) -> Result<()> {
    let started = Instant::now();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &index.to_arrays())?;
    writer.flush()?;
    tracing::info!(
        seconds = started.elapsed().as_secs_f64(),
        "saved index dump"
    );
    Ok(())
}

pub fn load_index<P: AsRef<Path>>(path: P) -> Result<InvertedIndex> {
    let started = Instant::now();
    let reader = BufReader::new(File::open(path)?);
    let arrays: HashMap<String, Vec<u32>> = serde_json::from_reader(reader)?;
    let index = InvertedIndex::from_arrays(arrays);
    tracing::info!(
        seconds = started.elapsed().as_secs_f64(),
        "loaded index dump"
    );
    Ok(index)
}

pub fn save_data<P: AsRef<Path>>(store: &DocumentStore, path: P) -> Result<()> {
    let started = Instant::now();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, store.as_map())?;
    writer.flush()?;
    tracing::info!(seconds = started.elapsed().as_secs_f64(), "saved data dump");
    Ok(())
}

pub fn load_data<P: AsRef<Path>>(path: P) -> Result<DocumentStore> {
    let started = Instant::now();
    let reader = BufReader::new(File::open(path)?);
    let docs: HashMap<u32, Document> = serde_json::from_reader(reader)?;
    tracing::info!(seconds = started.elapsed().as_secs_f64(), "loaded data dump");
    Ok(DocumentStore::from_map(docs))
}

/// Decompresses `<name>.gz` to `<name>` next to it and returns the target
/// path.
pub fn gunzip<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let started = Instant::now();
    let target = path.with_extension("");
    let mut decoder = GzDecoder::new(BufReader::new(File::open(path)?));
    let mut out = BufWriter::new(File::create(&target)?);
    io::copy(&mut decoder, &mut out)?;
    out.flush()?;
    tracing::info!(
        target = %target.display(),
        seconds = started.elapsed().as_secs_f64(),
        "decompressed dump"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Read;
    use tempfile::tempdir;

    fn doc(id: u32, title: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            url: format!("https://example.org/{id}"),
            abstract_text: format!("abstract {id}"),
        }
    }

    #[test]
    fn index_dump_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexes.json");

        let mut index = InvertedIndex::new();
        index.add("alpha".into(), 1);
        index.add("alpha".into(), 0);
        index.add("bravo".into(), 2);
        save_index(&index, &path).unwrap();

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            crate::index::to_sorted_ids(loaded.get("alpha").unwrap()),
            vec![0, 1]
        );
    }

    #[test]
    fn index_dump_is_token_to_sorted_array_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexes.json");
        let mut index = InvertedIndex::new();
        index.add("alpha".into(), 9);
        index.add("alpha".into(), 4);
        save_index(&index, &path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(raw["alpha"], serde_json::json!([4, 9]));
    }

    #[test]
    fn data_dump_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut store = DocumentStore::new();
        store.insert(doc(0, "Zero"));
        store.insert(doc(1, "One"));
        save_data(&store, &path).unwrap();

        let loaded = load_data(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(1).unwrap().title, "One");

        // Records are keyed by stringified id and carry the "index" field.
        let raw: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(raw["0"]["index"], serde_json::json!(0));
        assert_eq!(raw["0"]["abstract"], serde_json::json!("abstract 0"));
    }

    #[test]
    fn gunzip_strips_the_gz_suffix() {
        let dir = tempdir().unwrap();
        let gz_path = dir.path().join("dump.xml.gz");

        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::fast());
        encoder.write_all(b"<feed></feed>").unwrap();
        encoder.finish().unwrap();

        let target = gunzip(&gz_path).unwrap();
        assert_eq!(target, dir.path().join("dump.xml"));
        let mut contents = String::new();
        File::open(&target)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "<feed></feed>");
    }

    #[test]
    fn loading_a_missing_dump_fails() {
        assert!(load_index("/nonexistent/indexes.json").is_err());
    }
}
