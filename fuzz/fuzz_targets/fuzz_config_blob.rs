//! Fuzz target: stored config blob decoding.
//!
//! Whatever sits in the NVS partition, loading must either yield a
//! config that passes validation or fall back to defaults.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use battmon::adapters::nvs::NvsAdapter;
use battmon::app::ports::ConfigPort;
use battmon::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.sim_write_raw(data);

    if let Ok(cfg) = nvs.load() {
        assert!(cfg.validate().is_ok(), "load must never return an invalid config");
    }
    let cfg = SystemConfig::load_or_default(&nvs);
    assert!(cfg.validate().is_ok());
});
