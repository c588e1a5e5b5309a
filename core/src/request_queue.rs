use crate::{Document, DocumentId, DocumentStatus, ExecutionPolicy, Result, SearchServer};
use std::collections::VecDeque;

/// Default window: one request per minute over a day.
pub const MIN_IN_DAY: usize = 1440;

#[derive(Debug)]
struct QueryResult {
    found_documents: Vec<Document>,
    empty: bool,
}

/// Sliding log of the most recent searches and how many came back empty.
///
/// The log does not hold on to the index; every request names the server it
/// runs against, so documents can be added or removed between requests.
#[derive(Debug)]
pub struct RequestQueue {
    requests: VecDeque<QueryResult>,
    window: usize,
    policy: ExecutionPolicy,
    no_result_count: usize,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::with_window(MIN_IN_DAY)
    }

    pub fn with_window(window: usize) -> Self {
        let window = window.max(1);
        Self {
            requests: VecDeque::with_capacity(window.min(MIN_IN_DAY)),
            window,
            policy: ExecutionPolicy::Sequential,
            no_result_count: 0,
        }
    }

    /// Execution policy used for every search issued through this queue.
    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn add_find_request(&mut self, server: &SearchServer, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(server, raw_query, DocumentStatus::Actual)
    }

    pub fn add_find_request_by_status(
        &mut self,
        server: &SearchServer,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.add_find_request_by(server, raw_query, move |_, document_status, _| document_status == status)
    }

    /// Run the search and log its outcome. A malformed query is not logged.
    pub fn add_find_request_by<P>(&mut self, server: &SearchServer, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let found_documents = server.find_top_documents_with(self.policy, raw_query, predicate)?;
        self.record(found_documents.clone());
        Ok(found_documents)
    }

    fn record(&mut self, found_documents: Vec<Document>) {
        let empty = found_documents.is_empty();
        self.requests.push_back(QueryResult { found_documents, empty });
        if empty {
            self.no_result_count += 1;
        }
        while self.requests.len() > self.window {
            if let Some(evicted) = self.requests.pop_front() {
                if evicted.empty {
                    self.no_result_count -= 1;
                }
            }
        }
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result_count
    }

    /// Results of the most recent logged request.
    pub fn last(&self) -> Option<&[Document]> {
        self.requests.back().map(|r| r.found_documents.as_slice())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> SearchServer {
        let mut server = SearchServer::from_stop_words_text("and in at").unwrap();
        server.add_document(1, "curly cat curly tail", DocumentStatus::Actual, &[7, 2, 7]).unwrap();
        server.add_document(2, "curly dog and fancy collar", DocumentStatus::Actual, &[1, 2, 3]).unwrap();
        server.add_document(3, "big cat fancy collar ", DocumentStatus::Actual, &[1, 2, 8]).unwrap();
        server.add_document(4, "big dog sparrow Eugene", DocumentStatus::Actual, &[1, 3, 2]).unwrap();
        server.add_document(5, "big dog sparrow Vasiliy", DocumentStatus::Actual, &[1, 1, 1]).unwrap();
        server
    }

    #[test]
    fn day_of_empty_requests_then_evictions() {
        let server = server();
        let mut queue = RequestQueue::new();
        for _ in 0..1439 {
            queue.add_find_request(&server, "empty request").unwrap();
        }
        assert_eq!(queue.no_result_requests(), 1439);
        queue.add_find_request(&server, "curly dog").unwrap();
        queue.add_find_request(&server, "big collar").unwrap();
        queue.add_find_request(&server, "sparrow").unwrap();
        assert_eq!(queue.len(), MIN_IN_DAY);
        assert_eq!(queue.no_result_requests(), 1437);
    }

    #[test]
    fn small_window_counts_only_live_entries() {
        let server = server();
        let mut queue = RequestQueue::with_window(2).with_policy(ExecutionPolicy::Parallel);
        queue.add_find_request(&server, "nothing").unwrap();
        queue.add_find_request(&server, "sparrow").unwrap();
        assert_eq!(queue.no_result_requests(), 1);
        queue.add_find_request(&server, "cat").unwrap();
        assert_eq!(queue.no_result_requests(), 0);
        queue.add_find_request(&server, "nothing").unwrap();
        assert_eq!(queue.no_result_requests(), 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn malformed_query_is_not_logged() {
        let server = server();
        let mut queue = RequestQueue::with_window(3);
        assert!(queue.add_find_request(&server, "cat --dog").is_err());
        assert!(queue.is_empty());
        assert_eq!(queue.no_result_requests(), 0);
    }

    #[test]
    fn status_and_predicate_requests() {
        let server = server();
        let mut queue = RequestQueue::new();
        assert!(queue.add_find_request_by_status(&server, "cat", DocumentStatus::Banned).unwrap().is_empty());
        let found = queue.add_find_request_by(&server, "big", |id, _, _| id > 3).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(queue.last().map(<[Document]>::len), Some(2));
        assert_eq!(queue.no_result_requests(), 1);
    }

    #[test]
    fn log_survives_index_changes_between_requests() {
        let mut server = server();
        let mut queue = RequestQueue::with_window(3);
        assert!(queue.add_find_request(&server, "parrot").unwrap().is_empty());

        server.add_document(6, "green parrot", DocumentStatus::Actual, &[4]).unwrap();
        assert_eq!(queue.add_find_request(&server, "parrot").unwrap().len(), 1);
        assert_eq!(queue.no_result_requests(), 1);

        server.remove_document(6);
        assert!(queue.add_find_request(&server, "parrot").unwrap().is_empty());
        assert_eq!(queue.no_result_requests(), 2);
        assert_eq!(queue.len(), 3);

        // the first empty request falls out of the window
        queue.add_find_request(&server, "cat").unwrap();
        assert_eq!(queue.no_result_requests(), 1);
    }
}
