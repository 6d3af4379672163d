//! Streaming `<doc>` record source for Wikipedia abstract dumps.
//!
//! The dumps are far too large for a document tree, so records are pulled
//! out of the byte stream one element at a time through a bounded buffer.

use crate::index::Document;
use crate::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Buffer size for the underlying reader.
pub const XML_STREAM_BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Url,
    Abstract,
}

/// Pull-based iterator over the `<doc>` elements of an abstract dump.
///
/// Each record receives a monotonically increasing id starting at 0, in
/// stream order. Only the first text child of `<title>`, `<url>`, and
/// `<abstract>` is captured; nested markup such as the `<links>` section is
/// skipped.
pub struct DocumentStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    next_id: u32,
}

impl DocumentStream<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(
            XML_STREAM_BUFFER_SIZE,
            file,
        )))
    }
}

impl<R: BufRead> DocumentStream<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            next_id: 0,
        }
    }

    fn next_document(&mut self) -> Result<Option<Document>> {
        let mut title = String::new();
        let mut url = String::new();
        let mut abstract_text = String::new();
        let mut in_doc = false;
        // Element depth below <doc>; fields are only direct children.
        let mut depth = 0usize;
        let mut field: Option<Field> = None;

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| Error::Xml(e.to_string()))?;
            match event {
                Event::Start(start) => {
                    let name = start.name();
                    if !in_doc {
                        if name.as_ref() == b"doc" {
                            in_doc = true;
                            depth = 0;
                            field = None;
                        }
                    } else {
                        field = if depth == 0 {
                            match name.as_ref() {
                                b"title" => Some(Field::Title),
                                b"url" => Some(Field::Url),
                                b"abstract" => Some(Field::Abstract),
                                _ => None,
                            }
                        } else {
                            None
                        };
                        depth += 1;
                    }
                }
                Event::End(end) => {
                    if in_doc {
                        if depth == 0 && end.name().as_ref() == b"doc" {
                            let id = self.next_id;
                            self.next_id += 1;
                            return Ok(Some(Document {
                                id,
                                title,
                                url,
                                abstract_text,
                            }));
                        }
                        depth = depth.saturating_sub(1);
                        field = None;
                    }
                }
                Event::Text(text) => {
                    if in_doc && depth == 1 {
                        let value = text.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                        match field {
                            Some(Field::Title) if title.is_empty() => {
                                title = value.into_owned();
                            }
                            Some(Field::Url) if url.is_empty() => {
                                url = value.into_owned();
                            }
                            Some(Field::Abstract) if abstract_text.is_empty() => {
                                abstract_text = value.into_owned();
                            }
                            _ => {}
                        }
                    }
                }
                Event::CData(cdata) => {
                    if in_doc && depth == 1 {
                        let value = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                        match field {
                            Some(Field::Title) if title.is_empty() => title = value,
                            Some(Field::Url) if url.is_empty() => url = value,
                            Some(Field::Abstract) if abstract_text.is_empty() => {
                                abstract_text = value;
                            }
                            _ => {}
                        }
                    }
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DocumentStream<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = r#"<feed>
  <doc>
    <title>Wikipedia: Anarchism</title>
    <url>https://en.wikipedia.org/wiki/Anarchism</url>
    <abstract>Anarchism is a political philosophy &amp; movement.</abstract>
    <links>
      <sublink linktype="nav"><anchor>Etymology</anchor><link>https://x</link></sublink>
    </links>
  </doc>
  <doc>
    <title>Wikipedia: Autism</title>
    <url>https://en.wikipedia.org/wiki/Autism</url>
    <abstract>Autism is a neurodevelopmental condition.</abstract>
  </doc>
</feed>"#;

    fn stream(xml: &str) -> DocumentStream<Cursor<&[u8]>> {
        DocumentStream::new(Cursor::new(xml.as_bytes()))
    }

    #[test]
    fn emits_records_with_dense_ids() {
        let docs: Vec<Document> = stream(SAMPLE).map(|d| d.unwrap()).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, 0);
        assert_eq!(docs[1].id, 1);
        assert_eq!(docs[0].title, "Wikipedia: Anarchism");
        assert_eq!(docs[1].url, "https://en.wikipedia.org/wiki/Autism");
    }

    #[test]
    fn unescapes_entities() {
        let docs: Vec<Document> = stream(SAMPLE).map(|d| d.unwrap()).collect();
        assert_eq!(
            docs[0].abstract_text,
            "Anarchism is a political philosophy & movement."
        );
    }

    #[test]
    fn ignores_nested_link_markup() {
        let docs: Vec<Document> = stream(SAMPLE).map(|d| d.unwrap()).collect();
        assert!(!docs[0].abstract_text.contains("Etymology"));
        assert!(!docs[0].title.contains("Etymology"));
    }

    #[test]
    fn empty_feed_yields_nothing() {
        assert_eq!(stream("<feed></feed>").count(), 0);
    }

    #[test]
    fn captures_only_the_first_text_of_a_field() {
        let xml = "<feed><doc><title>First</title><title>Second</title>\
                   <url>u</url><abstract>a</abstract></doc></feed>";
        let docs: Vec<Document> = stream(xml).map(|d| d.unwrap()).collect();
        assert_eq!(docs[0].title, "First");
    }
}
