#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = damper_config::load_toml(data) {
        let _ = cfg.validate();
    }
    if let Ok(profile) = damper_config::profile_from_reader(data.as_bytes()) {
        assert_eq!(profile.mean.len(), profile.scale.len());
    }
    if let Ok(artifact) = damper_config::artifact::artifact_from_reader(data.as_bytes()) {
        let _ = artifact.validate();
    }
});
