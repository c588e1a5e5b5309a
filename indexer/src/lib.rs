use anyhow::{Context, Result};
use search_core::{Document, DocumentId, DocumentStatus, ExecutionPolicy, RequestQueue, SearchServer};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One line of a `.jsonl` input file.
#[derive(Debug, Clone, Deserialize)]
pub struct InputDoc {
    pub id: DocumentId,
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub added: usize,
    /// Documents the index refused (bad id, invalid word).
    pub rejected: usize,
    /// Lines that were not valid JSON documents.
    pub malformed: usize,
}

/// `.jsonl` files under `input`, or `input` itself if it is a file.
pub fn collect_input_files(input: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

/// Feed every line of `reader` to the index. Bad lines (including ones that
/// are not UTF-8) and rejected documents are logged and skipped; only I/O
/// failures abort.
pub fn load_jsonl<R: BufRead>(mut reader: R, server: &mut SearchServer, report: &mut LoadReport) -> Result<()> {
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim_end_matches(['\n', '\r']),
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "skipping line that is not UTF-8");
                report.malformed += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = match serde_json::from_str(line) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(line = line_no, error = %err, "skipping malformed line");
                report.malformed += 1;
                continue;
            }
        };
        match server.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
            Ok(()) => report.added += 1,
            Err(err) => {
                tracing::warn!(document_id = doc.id, error = %err, "failed to add document");
                report.rejected += 1;
            }
        }
    }
    Ok(())
}

pub fn load_path(input: &Path, server: &mut SearchServer) -> Result<LoadReport> {
    let files = collect_input_files(input);
    if files.is_empty() {
        anyhow::bail!("no .jsonl input found at {}", input.display());
    }
    let mut report = LoadReport::default();
    for file in files {
        let f = File::open(&file).with_context(|| format!("opening {}", file.display()))?;
        load_jsonl(BufReader::new(f), server, &mut report)?;
    }
    tracing::info!(added = report.added, rejected = report.rejected, malformed = report.malformed, "ingested documents");
    Ok(report)
}

/// Non-empty lines of a query file.
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut queries = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            queries.push(line);
        }
    }
    Ok(queries)
}

#[derive(Debug, Serialize)]
pub struct QueryOutput<'a> {
    pub query: &'a str,
    pub results: &'a [Document],
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub answered: usize,
    pub failed: usize,
    pub no_result_requests: usize,
}

/// Run queries through a request log, writing one JSON line per answered query.
pub fn run_queries<W: Write>(
    server: &SearchServer,
    queries: &[String],
    status: DocumentStatus,
    policy: ExecutionPolicy,
    window: usize,
    mut out: W,
) -> Result<RunSummary> {
    let mut queue = RequestQueue::with_window(window).with_policy(policy);
    let mut summary = RunSummary::default();
    for query in queries {
        match queue.add_find_request_by_status(server, query, status) {
            Ok(results) => {
                serde_json::to_writer(&mut out, &QueryOutput { query, results: &results })?;
                writeln!(out)?;
                summary.answered += 1;
            }
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "search failed");
                summary.failed += 1;
            }
        }
    }
    summary.no_result_requests = queue.no_result_requests();
    Ok(summary)
}

#[derive(Debug, Serialize)]
pub struct MatchOutput<'a> {
    pub id: DocumentId,
    pub words: Vec<&'a str>,
    pub status: DocumentStatus,
}

/// Write the match of `query` against every indexed document.
pub fn match_all<W: Write>(server: &SearchServer, query: &str, policy: ExecutionPolicy, mut out: W) -> Result<()> {
    for &id in server {
        let (words, status) = server.match_document_with(policy, query, id)?;
        serde_json::to_writer(&mut out, &MatchOutput { id, words, status })?;
        writeln!(out)?;
    }
    Ok(())
}
