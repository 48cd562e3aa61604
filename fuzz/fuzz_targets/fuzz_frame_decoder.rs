//! Fuzz target: `FrameDecoder::feed`
//!
//! Splits arbitrary input at a fuzzer-chosen point and feeds both halves.
//! The decoder must never panic, never yield a frame above its limit, and
//! must accept bytes again after a reset.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use lockstep_rpc::rpc::frame::FrameDecoder;

const MAX: usize = 1024;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = (split as usize).min(rest.len());
    let mut decoder = FrameDecoder::new(MAX);

    for chunk in [&rest[..split], &rest[split..]] {
        if decoder.feed(chunk).is_err() {
            assert!(!decoder.is_mid_frame(), "oversize header must reset");
        }
        while let Some(frame) = decoder.next_frame() {
            assert!(frame.len() <= MAX, "frame exceeds limit");
        }
    }

    decoder.reset();
    let _ = decoder.feed(rest);
});
