//! Per-request types shared by loaders, actions, and head functions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

/// Response metadata side channel. Loaders and actions may set status and
/// headers here without short-circuiting the render.
#[derive(Debug, Clone)]
pub struct ResponseInit {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Default for ResponseInit {
    fn default() -> Self {
        ResponseInit {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

/// A deliberate early response from a loader or action. Control flow, not
/// failure: it bypasses rendering entirely.
#[derive(Debug, Clone)]
pub enum ResponseSignal {
    /// Redirect to another location.
    Redirect { location: String, status: StatusCode },
    /// A fully-formed response body.
    Response {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },
}

impl ResponseSignal {
    pub fn redirect(location: impl Into<String>) -> Self {
        ResponseSignal::Redirect {
            location: location.into(),
            status: StatusCode::FOUND,
        }
    }
}

/// How a loader or action fails.
#[derive(Debug, Error)]
pub enum DataError {
    /// Not a failure: a response-like value thrown to terminate normally.
    #[error("short-circuit response")]
    ShortCircuit(ResponseSignal),
    /// Any other runtime error; recovered by the nearest error boundary.
    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

/// Arguments handed to every loader, action, and head function in a chain.
///
/// Cloning is cheap; the response side channel is shared, so concurrent
/// loaders all mutate the same [`ResponseInit`].
#[derive(Debug, Clone)]
pub struct DataFunctionArgs {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub splat_segments: Vec<String>,
    response: Arc<Mutex<ResponseInit>>,
}

impl DataFunctionArgs {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        params: HashMap<String, String>,
        splat_segments: Vec<String>,
    ) -> Self {
        DataFunctionArgs {
            method,
            path: path.into(),
            params,
            splat_segments,
            response: Arc::new(Mutex::new(ResponseInit::default())),
        }
    }

    /// Sets the response status for the eventual render.
    pub fn set_status(&self, status: StatusCode) {
        self.response.lock().expect("response lock poisoned").status = status;
    }

    /// Appends a response header for the eventual render.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        self.response
            .lock()
            .expect("response lock poisoned")
            .headers
            .insert(name, value);
    }

    /// Snapshot of the accumulated response metadata.
    pub fn response_init(&self) -> ResponseInit {
        self.response.lock().expect("response lock poisoned").clone()
    }

    /// Whether the request method implies a mutation (and thus an action).
    pub fn is_mutation(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }
}
