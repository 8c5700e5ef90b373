mod common;

use common::*;
use modelscope_fs::driver::LinkArgs;
use modelscope_fs::remote::transport::{CancelToken, Method};
use modelscope_fs::{DriverError, ExposedObject, StorageDriver};
use serde_json::json;

const STABLE_README: &str =
    "https://www.modelscope.cn/api/v1/models/org/model/repo?Revision=master&FilePath=README.md";
const CDN: &str = "https://cdn.example.com/org/model/README.md?sig=abc";

#[test]
fn redirect_target_is_returned_when_wanted() {
    let transport = ScriptedTransport::new(vec![redirect(CDN)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("README.md", true, &CancelToken::new())
        .expect("link");

    assert_eq!(url, CDN);
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].follow_redirects);
    assert_eq!(requests[0].url.as_str(), STABLE_README);
}

#[test]
fn stable_url_is_returned_when_redirect_not_wanted() {
    let transport = ScriptedTransport::new(vec![redirect(CDN)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("README.md", false, &CancelToken::new())
        .expect("link");
    assert_eq!(url, STABLE_README);
}

#[test]
fn model_link_trims_surrounding_slashes() {
    let transport = ScriptedTransport::new(vec![status(200)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("/weights/a.bin", false, &CancelToken::new())
        .expect("link");

    assert_eq!(
        url,
        "https://www.modelscope.cn/api/v1/models/org/model/repo?Revision=master&FilePath=weights%2Fa.bin"
    );
    assert_eq!(transport.urls()[0], url);
}

#[test]
fn ok_response_yields_stable_url() {
    let transport = ScriptedTransport::new(vec![status(200)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("README.md", true, &CancelToken::new())
        .expect("link");
    assert_eq!(url, STABLE_README);
}

#[test]
fn file_path_is_escaped() {
    let transport = ScriptedTransport::new(vec![status(200)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("weights/model v1.bin", false, &CancelToken::new())
        .expect("link");
    assert!(url.ends_with("FilePath=weights%2Fmodel+v1.bin"), "{url}");
}

#[test]
fn not_found_is_retried_as_post() {
    let transport = ScriptedTransport::new(vec![status(404), redirect(CDN)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("README.md", true, &CancelToken::new())
        .expect("link");

    assert_eq!(url, CDN);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::Post);
    assert!(!requests[1].follow_redirects);
    assert_eq!(
        requests[1].url.as_str(),
        "https://www.modelscope.cn/api/v1/models/org/model/repo"
    );
    assert_eq!(
        requests[1].json_body,
        Some(json!({"Revision": "master", "FilePath": "README.md"}))
    );
}

#[test]
fn post_fallback_still_returns_stable_get_url() {
    let transport = ScriptedTransport::new(vec![status(405), status(200)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("README.md", false, &CancelToken::new())
        .expect("link");
    assert_eq!(url, STABLE_README);
}

#[test]
fn network_error_is_retried_as_post() {
    let transport = ScriptedTransport::new(vec![network_error(), status(200)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    browser
        .resolve_link("README.md", false, &CancelToken::new())
        .expect("link");
    assert_eq!(transport.requests()[1].method, Method::Post);
}

#[test]
fn other_statuses_skip_post_and_try_next_revision() {
    let transport = ScriptedTransport::new(vec![status(403), status(200)]);
    let browser = browser(&config("org/model", "model", "v2"), &transport);

    let url = browser
        .resolve_link("README.md", false, &CancelToken::new())
        .expect("link");

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::Get);
    assert!(url.contains("Revision=master"));
}

#[test]
fn redirect_without_location_moves_on() {
    let transport = ScriptedTransport::new(vec![status(302), redirect(CDN)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let url = browser
        .resolve_link("README.md", true, &CancelToken::new())
        .expect("link");

    assert_eq!(url, CDN);
    let requests = transport.requests();
    assert_eq!(requests[1].method, Method::Get);
    assert!(requests[1].url.as_str().contains("Revision=main"));
}

#[test]
fn exhausted_link_cascade_returns_last_error() {
    let transport = ScriptedTransport::new(vec![status(302), status(500), status(500), status(302)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let err = browser
        .resolve_link("README.md", true, &CancelToken::new())
        .expect_err("should fail");

    assert!(matches!(err, DriverError::MissingLocation { .. }));
    assert_eq!(transport.calls(), 4);
}

#[test]
fn cancellation_during_get_skips_post() {
    let transport = ScriptedTransport::new(vec![Err(DriverError::Cancelled), status(200)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let err = browser
        .resolve_link("README.md", false, &CancelToken::new())
        .expect_err("should fail");
    assert!(err.is_cancelled());
    assert_eq!(transport.calls(), 1);
}

#[test]
fn dataset_links_strip_the_repo_root() {
    let transport = ScriptedTransport::new(vec![status(200)]);
    let browser = browser(&config("org/data", "dataset", "master"), &transport);

    let url = browser
        .resolve_link("org/data/train/a.csv", false, &CancelToken::new())
        .expect("link");
    assert_eq!(
        url,
        "https://www.modelscope.cn/api/v1/datasets/org/data/repo?Revision=master&FilePath=train%2Fa.csv"
    );
}

#[test]
fn storage_driver_link_passes_redirect_flag() {
    let transport = ScriptedTransport::new(vec![redirect(CDN)]);
    let browser = browser(&config("org/model", "model", "master"), &transport);

    let link = browser
        .link(
            &ExposedObject::file("README.md"),
            LinkArgs { redirect: true },
            &CancelToken::new(),
        )
        .expect("link");
    assert_eq!(link.url, CDN);
}
