#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use modelscope_fs::remote::transport::{ApiRequest, ApiResponse, CancelToken, Transport};
use modelscope_fs::{DriverConfig, DriverError, RepositoryBrowser};

/// Transport that replays canned responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ApiResponse, DriverError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<ApiResponse, DriverError>>) -> Arc<Self> {
        Arc::new(ScriptedTransport {
            script: Mutex::new(script.into()),
            requests: Mutex::default(),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.url.to_string())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancelToken,
    ) -> Result<ApiResponse, DriverError> {
        cancel.check()?;
        self.requests.lock().expect("lock").push(request.clone());
        self.script
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(DriverError::Transport {
                    url: request.url.to_string(),
                    message: "script exhausted".into(),
                })
            })
    }
}

pub fn json_ok(body: serde_json::Value) -> Result<ApiResponse, DriverError> {
    Ok(ApiResponse {
        status: 200,
        location: None,
        body: body.to_string(),
    })
}

pub fn status(code: u16) -> Result<ApiResponse, DriverError> {
    Ok(ApiResponse {
        status: code,
        location: None,
        body: String::new(),
    })
}

pub fn redirect(location: &str) -> Result<ApiResponse, DriverError> {
    Ok(ApiResponse {
        status: 302,
        location: Some(location.to_string()),
        body: String::new(),
    })
}

pub fn network_error() -> Result<ApiResponse, DriverError> {
    Err(DriverError::Transport {
        url: "mock".into(),
        message: "connection reset".into(),
    })
}

/// A successful listing envelope with the given `Files` array.
pub fn listing(files: serde_json::Value) -> Result<ApiResponse, DriverError> {
    json_ok(serde_json::json!({
        "Code": 200,
        "Data": {"Files": files},
        "Message": "success",
        "RequestId": "req-test",
        "Success": true
    }))
}

pub fn config(model_id: &str, kind: &str, revision: &str) -> DriverConfig {
    DriverConfig {
        model_id: model_id.into(),
        resource_type: kind.into(),
        revision: revision.into(),
        default_root: String::new(),
    }
}

pub fn browser(config: &DriverConfig, transport: &Arc<ScriptedTransport>) -> RepositoryBrowser {
    RepositoryBrowser::with_transport(config, transport.clone()).expect("init")
}
