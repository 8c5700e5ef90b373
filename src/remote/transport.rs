//! Outbound HTTP seam.
//!
//! Everything the browser sends goes through [`Transport`]. The production
//! implementation is [`HttpTransport`] (blocking `ureq`); tests plug in a
//! scripted transport and count calls.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use url::Url;

use crate::error::DriverError;

/// How often an in-flight request checks its [`CancelToken`].
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// One HTTP request against the API.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Full URL, query string included.
    pub url: Url,
    /// JSON body, only sent with [`Method::Post`].
    pub json_body: Option<Value>,
    pub follow_redirects: bool,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        ApiRequest {
            method: Method::Get,
            url,
            json_body: None,
            follow_redirects: true,
        }
    }

    pub fn post_json(url: Url, body: Value) -> Self {
        ApiRequest {
            method: Method::Post,
            url,
            json_body: Some(body),
            follow_redirects: true,
        }
    }

    pub fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }
}

/// Status, redirect target and body of a completed request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

/// Sends [`ApiRequest`]s. Implementations must be shareable across calls.
pub trait Transport: Send + Sync {
    /// Performs the request. Any HTTP status is a successful return;
    /// only network failures and cancellation are errors.
    fn execute(&self, request: &ApiRequest, cancel: &CancelToken)
        -> Result<ApiResponse, DriverError>;
}

/// Caller-controlled cancellation, optionally with a deadline.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        CancelToken {
            cancelled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Cancels every clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails with [`DriverError::Cancelled`] once cancelled.
    pub fn check(&self) -> Result<(), DriverError> {
        if self.is_cancelled() {
            Err(DriverError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// `ureq`-backed transport. Holds two agents so that redirect handling can
/// differ per request without rebuilding clients.
pub struct HttpTransport {
    agent: ureq::Agent,
    no_redirect_agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        let agent: ureq::Agent = config.into();

        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .build();
        let no_redirect_agent: ureq::Agent = config.into();

        HttpTransport {
            agent,
            no_redirect_agent,
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    /// Runs the blocking call on a worker thread so that a cancel can
    /// return control to the caller while the request is still in flight.
    /// An abandoned worker finishes on its own and its result is dropped.
    fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancelToken,
    ) -> Result<ApiResponse, DriverError> {
        cancel.check()?;

        let agent = if request.follow_redirects {
            self.agent.clone()
        } else {
            self.no_redirect_agent.clone()
        };
        let worker_request = request.clone();
        let timeout = cancel.remaining();
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("modelscope-http".to_string())
            .spawn(move || {
                let _ = tx.send(send_request(&agent, &worker_request, timeout));
            })
            .map_err(DriverError::Io)?;

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(Err(_)) if cancel.is_cancelled() => return Err(DriverError::Cancelled),
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => cancel.check()?,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(DriverError::Transport {
                        url: request.url.to_string(),
                        message: "request worker exited without a response".to_string(),
                    })
                }
            }
        }
    }
}

fn send_request(
    agent: &ureq::Agent,
    request: &ApiRequest,
    timeout: Option<Duration>,
) -> Result<ApiResponse, DriverError> {
    let url = request.url.as_str();
    let transport_error = |source: ureq::Error| DriverError::Transport {
        url: url.to_string(),
        message: source.to_string(),
    };

    let result = match (request.method, request.json_body.as_ref()) {
        (Method::Post, Some(body)) => agent
            .post(url)
            .config()
            .timeout_global(timeout)
            .build()
            .send_json(body),
        (Method::Post, None) => agent
            .post(url)
            .config()
            .timeout_global(timeout)
            .build()
            .send_empty(),
        (Method::Get, _) => agent
            .get(url)
            .config()
            .timeout_global(timeout)
            .build()
            .call(),
    };
    let mut response = result.map_err(transport_error)?;

    let status = response.status().as_u16();
    let location = response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(transport_error)?;

    Ok(ApiResponse {
        status,
        location,
        body,
    })
}
