//! Turning submitted documents into a store-ready batch.

use crate::error::{DocumentError, DocumentResult};
use crate::metadata::{Metadata, index_metadata, interpret_metadata};
use crate::models::DocumentEntry;

/// Ids, texts and metadata ready for a single add call
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatch {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<Metadata>,
}

impl PreparedBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn no_documents() -> DocumentError {
    DocumentError::validation("no valid documents supplied")
}

/// `doc_<millis>_<position>`; one timestamp for the whole batch.
pub fn assign_ids(timestamp_millis: i64, count: usize) -> Vec<String> {
    (0..count)
        .map(|position| format!("doc_{timestamp_millis}_{position}"))
        .collect()
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Prepare rows edited in the console.
///
/// Rows with blank text are dropped. Blank metadata falls back to
/// `{ index }`, where the index is the position of the first row with the
/// same text, so rows with identical text share it.
pub fn prepare_entries(entries: &[DocumentEntry]) -> DocumentResult<PreparedBatch> {
    prepare_entries_at(entries, now_millis())
}

pub(crate) fn prepare_entries_at(
    entries: &[DocumentEntry],
    timestamp_millis: i64,
) -> DocumentResult<PreparedBatch> {
    let kept: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.document.trim(), e.metadata.as_str()))
        .filter(|(document, _)| !document.is_empty())
        .collect();

    if kept.is_empty() {
        return Err(no_documents());
    }

    let documents: Vec<String> = kept.iter().map(|(d, _)| d.to_string()).collect();
    let metadatas = kept
        .iter()
        .map(|(document, raw)| {
            let position = documents
                .iter()
                .position(|d| d == document)
                .unwrap_or_default();
            interpret_metadata(raw, position)
        })
        .collect::<DocumentResult<Vec<_>>>()?;

    Ok(PreparedBatch {
        ids: assign_ids(timestamp_millis, documents.len()),
        documents,
        metadatas,
    })
}

/// Prepare documents submitted through the JSON API.
///
/// `metadatas`, when given, must align with `documents` one-to-one; rows
/// with blank text are dropped together with their metadata. Missing
/// metadata falls back to `{ index }` by position in the kept list.
pub fn prepare_documents(
    documents: Vec<String>,
    metadatas: Option<Vec<Metadata>>,
) -> DocumentResult<PreparedBatch> {
    prepare_documents_at(documents, metadatas, now_millis())
}

pub(crate) fn prepare_documents_at(
    documents: Vec<String>,
    metadatas: Option<Vec<Metadata>>,
    timestamp_millis: i64,
) -> DocumentResult<PreparedBatch> {
    if let Some(metadatas) = &metadatas {
        if metadatas.len() != documents.len() {
            return Err(DocumentError::validation(format!(
                "metadatas must have the same length as documents ({} != {})",
                metadatas.len(),
                documents.len()
            )));
        }
    }

    let mut metadatas = metadatas.map(|m| m.into_iter());
    let mut kept_documents = Vec::with_capacity(documents.len());
    let mut kept_metadatas = Vec::with_capacity(documents.len());

    for document in documents {
        let metadata = metadatas.as_mut().and_then(Iterator::next);
        let trimmed = document.trim();
        if trimmed.is_empty() {
            continue;
        }

        let position = kept_documents.len();
        kept_metadatas.push(metadata.unwrap_or_else(|| index_metadata(position)));
        kept_documents.push(trimmed.to_string());
    }

    if kept_documents.is_empty() {
        return Err(no_documents());
    }

    Ok(PreparedBatch {
        ids: assign_ids(timestamp_millis, kept_documents.len()),
        documents: kept_documents,
        metadatas: kept_metadatas,
    })
}
