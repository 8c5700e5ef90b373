//! Read-only browser over one ModelScope repository.
//!
//! Listing and link resolution both walk a cascade of URL variants (resource
//! segment alias × revision, plus a POST retry when the GET form is rejected)
//! because the API accepts different spellings on different deployments.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::cascade::{
    candidates, candidates_with_params, revision_candidates, run_cascade, Candidate,
};
use crate::config::{DriverConfig, ResourceKind, ValidatedConfig};
use crate::driver::{DriverInfo, Link, LinkArgs, StorageDriver};
use crate::error::DriverError;
use crate::object::{strip_root, trim_slashes, ExposedObject};
use crate::remote::transport::{ApiRequest, ApiResponse, CancelToken, HttpTransport, Transport};
use crate::remote::{entries_to_objects, entries_to_objects_under, FileListResponse};

/// Registry name of this driver.
pub const DRIVER_NAME: &str = "modelscope";

/// Public API host.
pub const DEFAULT_ENDPOINT: &str = "https://www.modelscope.cn";

/// Page size for tree listings. Only the first page is read.
pub const TREE_PAGE_SIZE: u32 = 1000;

/// Query parameter names the tree endpoint has been seen to accept.
const TREE_PATH_PARAMS: [&str; 2] = ["Root", "Path"];

const DRIVER_INFO: DriverInfo = DriverInfo {
    name: "ModelScope",
    only_proxy: false,
};

/// Browses one repository. Immutable after [`RepositoryBrowser::initialize`].
pub struct RepositoryBrowser {
    config: ValidatedConfig,
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl RepositoryBrowser {
    /// Validates `config` and builds a browser backed by [`HttpTransport`].
    pub fn initialize(config: &DriverConfig) -> Result<Self, DriverError> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Validates `config` and builds a browser on a caller-supplied transport.
    pub fn with_transport(
        config: &DriverConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, DriverError> {
        let config = config.validate()?;
        info!(
            "ModelScope driver initialized: {} {} @ {}",
            config.kind, config.repo_id, config.revision
        );
        Ok(RepositoryBrowser {
            config,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport,
        })
    }

    /// Points the browser at a different API host, e.g. a mirror.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// The repository id; hosts address the storage root by it.
    pub fn root_path(&self) -> &str {
        &self.config.repo_id
    }

    /// Lists the direct children of `path`.
    ///
    /// `path` may be empty or the repository id (both mean the root), or a
    /// path returned by an earlier listing.
    pub fn list_directory(
        &self,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<ExposedObject>, DriverError> {
        let path = self.browse_path(path);
        match self.config.kind {
            ResourceKind::Model => self.list_files(path, cancel),
            ResourceKind::Dataset => {
                self.list_tree(strip_root(path, &self.config.repo_id), cancel)
            }
        }
    }

    /// Resolves a download URL for `file_path`.
    ///
    /// With `want_redirect_target`, a redirecting API answer yields the
    /// final location; otherwise the stable API URL is returned.
    pub fn resolve_link(
        &self,
        file_path: &str,
        want_redirect_target: bool,
        cancel: &CancelToken,
    ) -> Result<String, DriverError> {
        let file_path = match self.config.kind {
            ResourceKind::Model => trim_slashes(file_path),
            ResourceKind::Dataset => strip_root(file_path, &self.config.repo_id),
        };
        let revisions = revision_candidates(&self.config.revision);
        let all = candidates(self.config.kind.segments(), &revisions);

        run_cascade("resolve link", all, |candidate| {
            self.try_link(candidate, file_path, want_redirect_target, cancel)
        })
    }

    /// Maps the root to the default subpath (or `""`); other paths lose
    /// their surrounding slashes.
    fn browse_path<'a>(&'a self, path: &'a str) -> &'a str {
        let trimmed = trim_slashes(path);
        if trimmed.is_empty() || trimmed == trim_slashes(&self.config.repo_id) {
            self.config.default_subpath.as_deref().unwrap_or("")
        } else {
            trimmed
        }
    }

    fn list_files(
        &self,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<ExposedObject>, DriverError> {
        let revisions = revision_candidates(&self.config.revision);
        let all = candidates(self.config.kind.segments(), &revisions);

        run_cascade("list files", all, |candidate| {
            let url = self.api_url(
                candidate.segment,
                &["repo", "files"],
                &[
                    ("Revision", candidate.revision.as_str()),
                    ("Recursive", "false"),
                    ("Root", path),
                ],
            )?;
            info!("ModelScope List API URL: {url}");

            let response = self.transport.execute(&ApiRequest::get(url.clone()), cancel)?;
            let listing = match accept_listing(&url, &response) {
                Err(err) if is_method_rejection(response.status) => {
                    debug!("GET {url} failed ({err}), retrying as POST");
                    let post_url = self.api_url(candidate.segment, &["repo", "files"], &[])?;
                    let body = json!({
                        "Revision": candidate.revision,
                        "Recursive": false,
                        "Root": path,
                    });
                    let response = self
                        .transport
                        .execute(&ApiRequest::post_json(post_url.clone(), body), cancel)?;
                    accept_listing(&post_url, &response)?
                }
                other => other?,
            };

            Ok(entries_to_objects(listing.entries()))
        })
    }

    fn list_tree(
        &self,
        dir: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<ExposedObject>, DriverError> {
        let revisions = revision_candidates(&self.config.revision);
        let all =
            candidates_with_params(self.config.kind.segments(), &revisions, &TREE_PATH_PARAMS);
        let page_size = TREE_PAGE_SIZE.to_string();

        run_cascade("list tree", all, |candidate| {
            let path_param = candidate.path_param.unwrap_or(TREE_PATH_PARAMS[0]);
            let url = self.api_url(
                candidate.segment,
                &["repo", "tree"],
                &[
                    ("Revision", candidate.revision.as_str()),
                    (path_param, dir),
                    ("PageNumber", "1"),
                    ("PageSize", page_size.as_str()),
                ],
            )?;
            info!("ModelScope Tree API URL: {url}");

            let response = self.transport.execute(&ApiRequest::get(url.clone()), cancel)?;
            let listing = accept_listing(&url, &response)?;
            Ok(entries_to_objects_under(dir, listing.entries()))
        })
    }

    fn try_link(
        &self,
        candidate: &Candidate,
        file_path: &str,
        want_redirect_target: bool,
        cancel: &CancelToken,
    ) -> Result<String, DriverError> {
        let stable_url = self.api_url(
            candidate.segment,
            &["repo"],
            &[
                ("Revision", candidate.revision.as_str()),
                ("FilePath", file_path),
            ],
        )?;
        info!("ModelScope Link API URL: {stable_url}, Redirect: {want_redirect_target}");

        let request = ApiRequest::get(stable_url.clone()).without_redirects();
        let err = match self.transport.execute(&request, cancel) {
            Ok(response) => match link_from_response(&stable_url, &response, want_redirect_target) {
                Ok(link) => return Ok(link),
                Err(err) if is_method_rejection(response.status) => err,
                Err(err) => return Err(err),
            },
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => err,
        };

        debug!("GET {stable_url} failed ({err}), retrying as POST");
        let post_url = self.api_url(candidate.segment, &["repo"], &[])?;
        let body = json!({
            "Revision": candidate.revision,
            "FilePath": file_path,
        });
        let request = ApiRequest::post_json(post_url, body).without_redirects();
        let response = self.transport.execute(&request, cancel)?;
        link_from_response(&stable_url, &response, want_redirect_target)
    }

    /// `<endpoint>/api/v1/<segment>/<repo id>/<tail..>?<query>`
    fn api_url(
        &self,
        segment: &str,
        tail: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Url, DriverError> {
        let raw = format!(
            "{}/api/v1/{}/{}/{}",
            self.endpoint,
            segment,
            trim_slashes(&self.config.repo_id),
            tail.join("/")
        );
        let mut url = Url::parse(&raw).map_err(|source| DriverError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

impl StorageDriver for RepositoryBrowser {
    fn info(&self) -> DriverInfo {
        DRIVER_INFO
    }

    fn root_path(&self) -> &str {
        RepositoryBrowser::root_path(self)
    }

    fn list(
        &self,
        dir: &ExposedObject,
        cancel: &CancelToken,
    ) -> Result<Vec<ExposedObject>, DriverError> {
        self.list_directory(&dir.path, cancel)
    }

    fn link(
        &self,
        file: &ExposedObject,
        args: LinkArgs,
        cancel: &CancelToken,
    ) -> Result<Link, DriverError> {
        let url = self.resolve_link(&file.path, args.redirect, cancel)?;
        Ok(Link { url })
    }
}

/// Constructor handed to [`crate::driver::DriverRegistry`].
pub fn construct(config: DriverConfig) -> Result<Box<dyn StorageDriver>, DriverError> {
    Ok(Box::new(RepositoryBrowser::initialize(&config)?))
}

fn is_method_rejection(status: u16) -> bool {
    matches!(status, 404 | 405)
}

/// Checks status, decodes the envelope and applies the success test.
fn accept_listing(url: &Url, response: &ApiResponse) -> Result<FileListResponse, DriverError> {
    if response.status != 200 {
        warn!(
            "modelscope list api response status error: {}, body: {}",
            response.status, response.body
        );
        return Err(DriverError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let listing = FileListResponse::from_slice(response.body.as_bytes()).map_err(|source| {
        warn!("modelscope list api unmarshal error: {source}, body: {}", response.body);
        DriverError::Decode {
            url: url.to_string(),
            source,
        }
    })?;

    if !listing.is_success() {
        warn!(
            "modelscope list api logic error: {} (RequestId: {})",
            listing.message, listing.request_id
        );
        return Err(DriverError::Remote {
            message: listing.message,
            request_id: listing.request_id,
        });
    }

    Ok(listing)
}

fn link_from_response(
    stable_url: &Url,
    response: &ApiResponse,
    want_redirect_target: bool,
) -> Result<String, DriverError> {
    match response.status {
        302 => match response.location.as_deref().filter(|location| !location.is_empty()) {
            Some(location) if want_redirect_target => Ok(location.to_string()),
            Some(_) => Ok(stable_url.to_string()),
            None => {
                warn!("modelscope link api error: Location header not found in 302 redirect response");
                Err(DriverError::MissingLocation {
                    url: stable_url.to_string(),
                })
            }
        },
        200 => Ok(stable_url.to_string()),
        status => {
            warn!("modelscope link api response status error: {status}");
            Err(DriverError::HttpStatus {
                url: stable_url.to_string(),
                status,
            })
        }
    }
}
