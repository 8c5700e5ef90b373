//! Fuzz target for listing envelope decoding.
//!
//! Feeds arbitrary bytes to the response decoder and maps whatever decodes,
//! checking for panics in the decode or mapping paths.
//!
//! Run with:
//!   cargo +nightly fuzz run file_list_response_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use modelscope_fs::remote::{entries_to_objects, entries_to_objects_under, FileListResponse};

fuzz_target!(|data: &[u8]| {
    // Real listings are far below this.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(response) = FileListResponse::from_slice(data) {
        let _ = response.is_success();
        let _ = entries_to_objects(response.entries());
        let _ = entries_to_objects_under("a/b", response.entries());
    }
});
