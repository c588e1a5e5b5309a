use crate::{DocumentId, SearchServer};
use std::collections::BTreeSet;

/// Remove every document whose set of words equals that of a document with a
/// smaller id. Word frequencies are ignored. Returns the removed ids in
/// ascending order.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocumentId> {
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut duplicates = Vec::new();

    for &document_id in server.iter() {
        // keys of an ordered map, so equal sets produce equal vectors
        let words: Vec<String> = server.word_frequencies(document_id).keys().cloned().collect();
        if !seen.insert(words) {
            duplicates.push(document_id);
        }
    }

    for &document_id in &duplicates {
        server.remove_document(document_id);
        tracing::info!(document_id, "found duplicate document");
    }
    duplicates
}
