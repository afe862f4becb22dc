//! 플랫폼 파일 식별자: Unix는 device + inode, Windows는 volume serial + file index
//!
//! 같은 경로에 다른 파일이 놓였는지(로테이션) 판별하는 데 사용합니다.

use std::fs::File;
use std::io;
use std::path::Path;

/// 플랫폼 독립 파일 식별자
///
/// 파일 이름이 바뀌어도 유지되므로, 경로의 현재 식별자와 열 때 기록한
/// 식별자가 다르면 해당 경로의 파일이 교체된 것입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    /// device ID (Unix) 또는 volume serial number (Windows)
    dev: u64,
    /// inode 번호 (Unix) 또는 file index (Windows)
    ino: u64,
}

impl FileId {
    /// 원시 값으로 식별자를 생성합니다.
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// 열린 파일 핸들에서 식별자를 읽습니다.
    #[cfg(unix)]
    pub fn from_file(file: &File) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;

        let metadata = file.metadata()?;
        Ok(Self::new(metadata.dev(), metadata.ino()))
    }

    /// 경로가 현재 가리키는 파일의 식별자를 읽습니다 (심볼릭 링크는 따라갑니다).
    #[cfg(unix)]
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        use std::os::unix::fs::MetadataExt;

        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(metadata.dev(), metadata.ino()))
    }

    /// 열린 파일 핸들에서 식별자를 읽습니다.
    #[cfg(windows)]
    pub fn from_file(file: &File) -> io::Result<Self> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::Foundation::HANDLE;
        use windows_sys::Win32::Storage::FileSystem::{
            BY_HANDLE_FILE_INFORMATION, GetFileInformationByHandle,
        };

        let handle = file.as_raw_handle() as HANDLE;
        // SAFETY: BY_HANDLE_FILE_INFORMATION은 모든 필드가 정수인 POD 구조체입니다.
        let mut info: BY_HANDLE_FILE_INFORMATION = unsafe { std::mem::zeroed() };

        // SAFETY: handle은 `file`이 살아있는 동안 유효하고, info는 쓰기 가능한 버퍼입니다.
        let result = unsafe { GetFileInformationByHandle(handle, &mut info) };
        if result == 0 {
            return Err(io::Error::last_os_error());
        }

        let file_index = (u64::from(info.nFileIndexHigh) << 32) | u64::from(info.nFileIndexLow);
        Ok(Self::new(u64::from(info.dwVolumeSerialNumber), file_index))
    }

    /// 경로가 현재 가리키는 파일의 식별자를 읽습니다.
    ///
    /// Windows는 핸들이 있어야 식별자를 얻을 수 있으므로 잠깐 열었다가 바로 닫습니다.
    #[cfg(windows)]
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_file(&file)
    }

    /// device ID (Unix) 또는 volume serial number (Windows)
    pub fn dev(&self) -> u64 {
        self.dev
    }

    /// inode 번호 (Unix) 또는 file index (Windows)
    pub fn ino(&self) -> u64 {
        self.ino
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}
