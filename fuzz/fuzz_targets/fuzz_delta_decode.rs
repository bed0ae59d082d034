#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary blobs must decode without panicking, and whatever decodes
    // must survive a re-encode.
    let values = gramdex::utils::delta_decode(data);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));

    let mut buf = Vec::new();
    gramdex::utils::delta_encode(&values, &mut buf);
    assert_eq!(gramdex::utils::delta_decode(&buf), values);
});
