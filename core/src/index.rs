use crate::query::Query;
use crate::ranking::{inverse_document_freq, select_top};
use crate::tokenizer::{split_into_words_no_stop, StopWords};
use crate::{
    compute_average_rating, ConcurrentMap, Document, DocumentId, DocumentStatus, ExecutionPolicy, Result,
    SearchError,
};
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::{btree_set, BTreeMap, BTreeSet};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;

const DEFAULT_SHARD_COUNT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchServerConfig {
    /// Shards of the relevance accumulator used by parallel searches.
    pub shard_count: usize,
}

impl Default for SearchServerConfig {
    fn default() -> Self {
        Self { shard_count: DEFAULT_SHARD_COUNT }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
}

/// Inverted index with TF-IDF ranking.
///
/// Not internally synchronized: structural changes need `&mut self`, searches
/// take `&self` and may fan out over the thread pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchServer {
    config: SearchServerConfig,
    stop_words: StopWords,
    word_to_document_freqs: BTreeMap<String, BTreeMap<DocumentId, f64>>,
    document_to_word_freqs: BTreeMap<DocumentId, BTreeMap<String, f64>>,
    documents: BTreeMap<DocumentId, DocumentData>,
    document_ids: BTreeSet<DocumentId>,
}

impl SearchServer {
    pub fn new(stop_words: StopWords) -> Self {
        Self::with_config(stop_words, SearchServerConfig::default())
    }

    pub fn with_config(stop_words: StopWords, config: SearchServerConfig) -> Self {
        Self { config, stop_words, ..Self::default() }
    }

    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Ok(Self::new(StopWords::from_text(text)?))
    }

    pub fn add_document(
        &mut self,
        document_id: DocumentId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 || self.documents.contains_key(&document_id) {
            return Err(SearchError::InvalidDocumentId(document_id));
        }
        let words = split_into_words_no_stop(document, &self.stop_words)?;

        let inv_word_count = 1.0 / words.len() as f64;
        let word_freqs = self.document_to_word_freqs.entry(document_id).or_default();
        for word in &words {
            *self
                .word_to_document_freqs
                .entry((*word).to_string())
                .or_default()
                .entry(document_id)
                .or_insert(0.0) += inv_word_count;
            *word_freqs.entry((*word).to_string()).or_insert(0.0) += inv_word_count;
        }
        let rating = compute_average_rating(ratings);
        self.documents.insert(document_id, DocumentData { rating, status });
        self.document_ids.insert(document_id);
        tracing::debug!(document_id, words = words.len(), rating, %status, "document added");
        Ok(())
    }

    pub fn remove_document(&mut self, document_id: DocumentId) {
        self.remove_document_with(ExecutionPolicy::Sequential, document_id);
    }

    /// Excise a document from every posting. Unknown ids are ignored.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, document_id: DocumentId) {
        if !self.document_ids.remove(&document_id) {
            return;
        }
        match policy {
            ExecutionPolicy::Sequential => self.word_to_document_freqs.iter_mut().for_each(|(_, postings)| {
                postings.remove(&document_id);
            }),
            ExecutionPolicy::Parallel => self.word_to_document_freqs.par_iter_mut().for_each(|(_, postings)| {
                postings.remove(&document_id);
            }),
        }
        self.word_to_document_freqs.retain(|_, postings| !postings.is_empty());
        self.documents.remove(&document_id);
        self.document_to_word_freqs.remove(&document_id);
        tracing::debug!(document_id, ?policy, "document removed");
    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(&self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.find_top_documents_by(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    /// Best [`MAX_RESULT_DOCUMENT_COUNT`] documents accepted by `predicate`.
    ///
    /// The predicate sees `(id, status, rating)` of every candidate.
    pub fn find_top_documents_with<P>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let matched = match policy {
            ExecutionPolicy::Sequential => self.find_all_documents_seq(&query, &predicate),
            ExecutionPolicy::Parallel => self.find_all_documents_par(&query, &predicate),
        };
        let total_hits = matched.len();
        let top = select_top(matched, MAX_RESULT_DOCUMENT_COUNT, policy);
        tracing::debug!(query = raw_query, ?policy, total_hits, returned = top.len(), "search complete");
        Ok(top)
    }

    fn postings(&self, word: &str) -> Option<&BTreeMap<DocumentId, f64>> {
        self.word_to_document_freqs.get(word).filter(|p| !p.is_empty())
    }

    fn to_documents(&self, document_to_relevance: BTreeMap<DocumentId, f64>) -> Vec<Document> {
        document_to_relevance
            .into_iter()
            .filter_map(|(id, relevance)| self.documents.get(&id).map(|data| Document::new(id, relevance, data.rating)))
            .collect()
    }

    fn find_all_documents_seq<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.postings(word) else { continue };
            let idf = inverse_document_freq(self.document_count(), postings.len());
            for (&id, &term_freq) in postings {
                let Some(data) = self.documents.get(&id) else { continue };
                if predicate(id, data.status, data.rating) {
                    *document_to_relevance.entry(id).or_insert(0.0) += term_freq * idf;
                }
            }
        }
        for word in &query.minus_words {
            let Some(postings) = self.postings(word) else { continue };
            for id in postings.keys() {
                document_to_relevance.remove(id);
            }
        }
        self.to_documents(document_to_relevance)
    }

    fn find_all_documents_par<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance: ConcurrentMap<DocumentId, f64> = ConcurrentMap::new(self.config.shard_count);
        for word in &query.plus_words {
            let Some(postings) = self.postings(word) else { continue };
            let idf = inverse_document_freq(self.document_count(), postings.len());
            postings.par_iter().for_each(|(&id, &term_freq)| {
                if let Some(data) = self.documents.get(&id) {
                    if predicate(id, data.status, data.rating) {
                        *document_to_relevance.access(id) += term_freq * idf;
                    }
                }
            });
        }
        for word in &query.minus_words {
            let Some(postings) = self.postings(word) else { continue };
            postings.par_iter().for_each(|(&id, _)| {
                document_to_relevance.erase(id);
            });
        }
        self.to_documents(document_to_relevance.into_ordinary_map())
    }

    pub fn match_document(&self, raw_query: &str, document_id: DocumentId) -> Result<(Vec<&str>, DocumentStatus)> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    /// Plus words of `raw_query` found in the document, or none at all if a
    /// minus word is found. Returned words are sorted and distinct.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        document_id: DocumentId,
    ) -> Result<(Vec<&str>, DocumentStatus)> {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let status = self
            .documents
            .get(&document_id)
            .map(|data| data.status)
            .ok_or(SearchError::DocumentNotFound(document_id))?;

        let contains = |word: &str| self.postings(word).is_some_and(|p| p.contains_key(&document_id));
        let excluded = match policy {
            ExecutionPolicy::Sequential => query.minus_words.iter().any(|w| contains(*w)),
            ExecutionPolicy::Parallel => query.minus_words.par_iter().any(|w| contains(*w)),
        };
        if excluded {
            return Ok((Vec::new(), status));
        }

        let matched: Vec<&str> = match policy {
            ExecutionPolicy::Sequential => {
                query.plus_words.iter().filter_map(|w| self.indexed_word(w, document_id)).collect()
            }
            ExecutionPolicy::Parallel => {
                let mut words: Vec<&str> =
                    query.plus_words.par_iter().filter_map(|w| self.indexed_word(w, document_id)).collect();
                words.par_sort_unstable();
                words
            }
        };
        Ok((matched, status))
    }

    /// The index's own copy of `word` if it occurs in the document.
    fn indexed_word(&self, word: &str, document_id: DocumentId) -> Option<&str> {
        self.word_to_document_freqs
            .get_key_value(word)
            .filter(|(_, postings)| postings.contains_key(&document_id))
            .map(|(key, _)| key.as_str())
    }

    /// Word frequencies of one document; empty for unknown ids.
    pub fn word_frequencies(&self, document_id: DocumentId) -> Cow<'_, BTreeMap<String, f64>> {
        match self.document_to_word_freqs.get(&document_id) {
            Some(freqs) => Cow::Borrowed(freqs),
            None => Cow::Owned(BTreeMap::new()),
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn contains(&self, document_id: DocumentId) -> bool {
        self.document_ids.contains(&document_id)
    }

    /// Indexed ids in ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, DocumentId> {
        self.document_ids.iter()
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = &'a DocumentId;
    type IntoIter = btree_set::Iter<'a, DocumentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> SearchServer {
        let mut server = SearchServer::from_stop_words_text("and in on").unwrap();
        server.add_document(1, "white cat and fancy collar", DocumentStatus::Actual, &[8, -3]).unwrap();
        server.add_document(2, "fluffy cat fluffy tail", DocumentStatus::Actual, &[7, 2, 7]).unwrap();
        server.add_document(3, "groomed dog expressive eyes", DocumentStatus::Actual, &[5, -12, 2, 1]).unwrap();
        server.add_document(4, "groomed starling evgeny", DocumentStatus::Banned, &[9]).unwrap();
        server
    }

    #[test]
    fn term_frequencies_exclude_stop_words() {
        let server = server();
        let freqs = server.word_frequencies(1);
        assert_eq!(freqs.len(), 4);
        assert!((freqs["cat"] - 0.25).abs() < 1e-12);
        assert!(!freqs.contains_key("and"));
        let freqs = server.word_frequencies(2);
        assert!((freqs["fluffy"] - 0.5).abs() < 1e-12);
        let total: f64 = freqs.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn add_rejects_negative_and_duplicate_ids() {
        let mut server = server();
        assert_eq!(
            server.add_document(-1, "cat", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidDocumentId(-1))
        );
        assert_eq!(
            server.add_document(2, "new text", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidDocumentId(2))
        );
        assert_eq!(server.document_count(), 4);
        assert!(server.word_frequencies(2).contains_key("fluffy"));
    }

    #[test]
    fn invalid_word_leaves_no_trace() {
        let mut server = server();
        let err = server.add_document(9, "big d\u{12}og", DocumentStatus::Actual, &[1]).unwrap_err();
        assert_eq!(err, SearchError::InvalidWord("d\u{12}og".into()));
        assert!(!server.contains(9));
        assert!(server.word_frequencies(9).is_empty());
        assert!(server.find_top_documents("big").unwrap().is_empty());
    }

    #[test]
    fn stop_word_only_document_is_indexed_without_words() {
        let mut server = server();
        server.add_document(10, "and in on", DocumentStatus::Actual, &[]).unwrap();
        assert!(server.contains(10));
        assert!(server.word_frequencies(10).is_empty());
    }

    #[test]
    fn default_search_only_returns_actual() {
        let server = server();
        let found = server.find_top_documents("groomed").unwrap();
        assert_eq!(found.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3]);
        let banned = server.find_top_documents_by_status("groomed", DocumentStatus::Banned).unwrap();
        assert_eq!(banned.iter().map(|d| d.id).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn predicate_sees_id_status_and_rating() {
        let server = server();
        let found = server.find_top_documents_by("cat groomed", |id, _, rating| id % 2 == 1 || rating > 6).unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.id).collect();
        // 1 and 3 score exactly the same, so the higher rating goes first
        assert_eq!(ids, vec![4, 1, 3]);
    }

    #[test]
    fn match_document_reports_plus_words() {
        let server = server();
        let (words, status) = server.match_document("fluffy cat collar", 2).unwrap();
        assert_eq!(words, vec!["cat", "fluffy"]);
        assert_eq!(status, DocumentStatus::Actual);
        let (words, _) = server.match_document("fluffy cat -tail", 2).unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn match_document_policies_agree() {
        let server = server();
        for id in &server {
            let seq = server.match_document_with(ExecutionPolicy::Sequential, "groomed cat -eyes white", *id).unwrap();
            let par = server.match_document_with(ExecutionPolicy::Parallel, "groomed cat -eyes white", *id).unwrap();
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn match_unknown_document_is_out_of_range() {
        let server = server();
        let err = server.match_document("cat", 42).unwrap_err();
        assert_eq!(err, SearchError::DocumentNotFound(42));
        assert_eq!(err.kind(), crate::ErrorKind::OutOfRange);
        // malformed queries are reported before the lookup
        assert!(server.match_document("--cat", 42).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn remove_prunes_empty_postings() {
        let mut server = server();
        server.remove_document(4);
        assert!(!server.word_to_document_freqs.contains_key("starling"));
        assert!(server.word_to_document_freqs.contains_key("groomed"));
        server.remove_document(4);
        assert_eq!(server.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn idf_uses_live_document_count() {
        let mut server = server();
        server.remove_document_with(ExecutionPolicy::Parallel, 3);
        // "groomed" now lives only in the banned document, so idf = ln(3/1)
        let found = server.find_top_documents_by_status("groomed", DocumentStatus::Banned).unwrap();
        let expected = (1.0 / 3.0) * 3f64.ln();
        assert!((found[0].relevance - expected).abs() < 1e-12);
    }
}
