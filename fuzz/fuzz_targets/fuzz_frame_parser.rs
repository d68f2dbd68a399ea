#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Some(f) = damper_core::parse_frame(data) else {
        return;
    };
    let line = format!(
        "Time: {} | Raw: X = {}, Y = {}, Z = {}",
        f.device_time_s, f.x, f.y, f.z
    );
    assert_eq!(damper_core::parse_frame(&line), Some(f), "{line}");
});
