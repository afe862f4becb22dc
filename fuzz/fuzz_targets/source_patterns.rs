#![no_main]

use libfuzzer_sys::fuzz_target;

use tailwatch_engine::SourceSet;
use tailwatch_engine::source::glob::glob_base;

fuzz_target!(|data: &[u8]| {
    if let Ok(pattern) = std::str::from_utf8(data) {
        // 컴파일 실패는 허용, 패닉은 불가
        let _ = SourceSet::from_patterns(Some(pattern), None);
        let _ = SourceSet::from_patterns(None, Some(pattern));

        let base = glob_base(std::path::Path::new(pattern));
        assert!(std::path::Path::new(pattern).starts_with(&base) || base.as_os_str().is_empty());
    }
});
