#![no_main]

use libfuzzer_sys::fuzz_target;

use tailwatch_core::config::TailwatchConfig;
use tailwatch_engine::WatchConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = TailwatchConfig::parse(text) {
            if config.validate().is_ok() {
                // 검증을 통과한 설정은 엔진 설정으로 변환되어야 함
                let watch = WatchConfig::from_core(&config.watch);
                assert!(watch.is_ok());
            }
        }
    }
});
