//! Work document parser
//!
//! Best-effort decoding of the content service's XML work documents:
//!
//! ```text
//! <works>
//!   <authorweb>…</authorweb>
//!   <titleshort>…</titleshort>
//!   <titles><isbn>…</isbn></titles>
//! </works>
//! ```
//!
//! Unknown elements and attributes are ignored and missing fields decode as
//! empty strings. A repeated element overwrites the earlier one, so the last
//! occurrence wins. Only a document that cannot be decoded at all is an error.

use serde::Deserialize;

use crate::contracts::WorkRecord;
use crate::error::ParseError;

#[derive(Debug, Default, Deserialize)]
struct WorksDocument {
    #[serde(rename = "authorweb", default)]
    authors: Vec<String>,
    #[serde(rename = "titleshort", default)]
    titles_short: Vec<String>,
    #[serde(rename = "titles", default)]
    titles: Vec<TitlesBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct TitlesBlock {
    #[serde(rename = "isbn", default)]
    isbns: Vec<String>,
}

impl From<WorksDocument> for WorkRecord {
    fn from(mut doc: WorksDocument) -> Self {
        let identifier = doc
            .titles
            .into_iter()
            .flat_map(|block| block.isbns)
            .last()
            .unwrap_or_default();

        WorkRecord {
            author: doc.authors.pop().unwrap_or_default(),
            title: doc.titles_short.pop().unwrap_or_default(),
            identifier,
        }
    }
}

/// Decode a work document.
pub fn parse(document: &str) -> Result<WorkRecord, ParseError> {
    let doc: WorksDocument = quick_xml::de::from_str(document)?;
    Ok(doc.into())
}

/// Decode a work document, falling back to an empty record.
///
/// The flag is false when the document could not be decoded.
pub fn decode(document: &str) -> (WorkRecord, bool) {
    match parse(document) {
        Ok(record) => (record, true),
        Err(e) => {
            tracing::debug!(error = %e, "Work document not decodable, using empty record");
            (WorkRecord::default(), false)
        }
    }
}
