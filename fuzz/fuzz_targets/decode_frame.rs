//! Fuzz the frame decoder: arbitrary text must never panic, and every
//! successfully decoded frame must re-encode losslessly.
#![no_main]

use libfuzzer_sys::fuzz_target;
use tether_proto::Frame;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(frame) = Frame::decode(text) {
        let encoded = frame.encode().expect("decoded frame must re-encode");
        let again = Frame::decode(&encoded).expect("re-encoded frame must decode");
        assert_eq!(frame, again);
    }
});
