//! In-memory [`HttpClient`] for tests and offline runs.
//!
//! Responses are registered against URL fragments; the first registered
//! fragment contained in a request's URL answers it. Unmatched requests get
//! a 404. Every request is recorded so callers can count network calls.

use std::cell::RefCell;

use super::client::{HttpClient, HttpResponse, TransportError};

enum Canned {
    Response { status: u16, body: Vec<u8> },
    Fail(String),
}

/// A request as seen by [`MockClient`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct MockClient {
    routes: Vec<(String, Canned)>,
    recorded: RefCell<Vec<RecordedRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers URLs containing `fragment` with `status` and `body`.
    pub fn respond(mut self, fragment: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((
            fragment.to_string(),
            Canned::Response {
                status,
                body: body.into(),
            },
        ));
        self
    }

    /// Answers URLs containing `fragment` with `200` and a JSON body.
    pub fn json(self, fragment: &str, body: &str) -> Self {
        self.respond(fragment, 200, body)
    }

    /// Fails URLs containing `fragment` at the transport level.
    pub fn fail(mut self, fragment: &str, reason: &str) -> Self {
        self.routes
            .push((fragment.to_string(), Canned::Fail(reason.to_string())));
        self
    }

    /// Number of requests executed so far.
    pub fn calls(&self) -> usize {
        self.recorded.borrow().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.borrow().clone()
    }
}

impl HttpClient for MockClient {
    fn execute(&self, req: reqwest::blocking::Request) -> Result<HttpResponse, TransportError> {
        let url = req.url().to_string();
        self.recorded.borrow_mut().push(RecordedRequest {
            method: req.method().to_string(),
            url: url.clone(),
            authorization: req
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: req
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8_lossy(b).into_owned()),
        });

        match self.routes.iter().find(|(fragment, _)| url.contains(fragment.as_str())) {
            Some((_, Canned::Response { status, body })) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            Some((_, Canned::Fail(reason))) => Err(TransportError(reason.clone())),
            None => Ok(HttpResponse {
                status: 404,
                body: b"not found".to_vec(),
            }),
        }
    }
}
