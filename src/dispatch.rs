//! Maps a pipeline run to a transport-neutral response.

use rand::Rng;

use crate::pipeline::Pipeline;

pub const CACHE_CONTROL: &str = "no-store, max-age=0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    details: String,
}

/// Run one request. Success is a 200 image; any failure is a 500 with a JSON body.
pub fn handle<R: Rng>(pipeline: &Pipeline, rng: &mut R) -> Response {
    match pipeline.run(rng) {
        Ok(out) => Response {
            status: 200,
            headers: vec![
                ("Content-Type".to_owned(), out.content_type.to_owned()),
                ("Cache-Control".to_owned(), CACHE_CONTROL.to_owned()),
            ],
            body: out.bytes,
        },
        Err(e) => {
            tracing::warn!(error = %e, "card generation failed");
            let body = serde_json::to_vec(&ErrorBody {
                error: "Internal Server Error",
                details: e.to_string(),
            })
            .unwrap_or_else(|_| br#"{"error":"Internal Server Error"}"#.to_vec());
            Response {
                status: 500,
                headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
                body,
            }
        }
    }
}
