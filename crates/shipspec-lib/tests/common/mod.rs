//! Common test utilities and fixture helpers.
//!
//! Provides an in-memory stand-in for the encyclopedia API plus helpers to
//! build page envelopes and load the JSON fixtures under `docs/fixtures`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use url::Url;

use shipspec_lib::{Error, Result, Transport, TransportResponse};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Parse a fixture file as JSON.
#[allow(dead_code)]
pub fn fixture_json(name: &str) -> Value {
    let path = fixtures_dir().join(name);
    let text = fs::read_to_string(&path).expect("fixture readable");
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

/// Build a `{status, data, meta}` page envelope.
#[allow(dead_code)]
pub fn page_envelope<I>(records: I, page: u32, page_total: u32, total: u64) -> Value
where
    I: IntoIterator<Item = (u64, Value)>,
{
    let data: Map<String, Value> = records
        .into_iter()
        .map(|(id, record)| (id.to_string(), record))
        .collect();
    json!({
        "status": "ok",
        "meta": {
            "count": data.len(),
            "page": page,
            "page_total": page_total,
            "total": total,
            "limit": 100
        },
        "data": data
    })
}

/// Minimal ship records with ids `ids`.
#[allow(dead_code)]
pub fn ship_records(ids: std::ops::Range<u64>) -> Vec<(u64, Value)> {
    ids.map(|id| (id, json!({"ship_id": id, "name": format!("Ship {id}")})))
        .collect()
}

/// Split a keyed JSON object into pages of `per_page` records, as the API does.
#[allow(dead_code)]
pub fn paginate_object(object: &Value, per_page: usize) -> Vec<Value> {
    let records: Vec<(u64, Value)> = object
        .as_object()
        .expect("keyed object")
        .iter()
        .map(|(id, record)| (id.parse().expect("numeric id"), record.clone()))
        .collect();
    let total = records.len() as u64;
    let chunks: Vec<Vec<(u64, Value)>> = records
        .chunks(per_page.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();
    let page_total = chunks.len().max(1) as u32;
    if chunks.is_empty() {
        return vec![page_envelope(Vec::new(), 1, 1, 0)];
    }
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| page_envelope(chunk, index as u32 + 1, page_total, total))
        .collect()
}

/// Canned answer for one page request.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Reply {
    Page(Value),
    /// 2xx answer with a body that is not JSON.
    Text(String),
    Status(u16),
    NetworkError,
}

/// In-memory encyclopedia API keyed by endpoint (`ships`/`modules`) and page.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeApi {
    replies: HashMap<(String, u32), Reply>,
    requests: RefCell<Vec<Url>>,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, endpoint: &str, page: u32, reply: Reply) -> Self {
        self.replies.insert((endpoint.to_string(), page), reply);
        self
    }

    pub fn pages(mut self, endpoint: &str, pages: Vec<Value>) -> Self {
        for (index, page) in pages.into_iter().enumerate() {
            self.replies
                .insert((endpoint.to_string(), index as u32 + 1), Reply::Page(page));
        }
        self
    }

    /// Every URL requested so far, in request order.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.borrow().clone()
    }

    /// `page_no` of every request to `endpoint`, in request order.
    pub fn requested_pages(&self, endpoint: &str) -> Vec<u32> {
        self.requests
            .borrow()
            .iter()
            .filter(|url| endpoint_of(url) == endpoint)
            .filter_map(page_of)
            .collect()
    }
}

impl Transport for FakeApi {
    fn get(&self, url: &Url) -> Result<TransportResponse> {
        self.requests.borrow_mut().push(url.clone());
        let key = (endpoint_of(url), page_of(url).unwrap_or(1));
        match self.replies.get(&key) {
            Some(Reply::Page(body)) => Ok(TransportResponse::Success(body.to_string())),
            Some(Reply::Text(body)) => Ok(TransportResponse::Success(body.clone())),
            Some(Reply::Status(status)) => Ok(TransportResponse::Status(*status)),
            Some(Reply::NetworkError) => Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
            None => Ok(TransportResponse::Status(404)),
        }
    }
}

#[allow(dead_code)]
fn endpoint_of(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string()
}

fn page_of(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| key == "page_no")
        .and_then(|(_, value)| value.parse().ok())
}
