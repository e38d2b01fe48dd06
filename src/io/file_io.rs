/// 配置文件 IO 实现
///
/// 提供基于文件系统的默认存储实现，每个操作都在调用内部打开并关闭文件
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::traits::{offset_beyond_end, CfgStorage, FileTail};

/// 默认的文件存储（基于 std::fs）
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CfgStorage for FileStorage {
    fn read_all(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    fn tail(&self) -> io::Result<FileTail> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();

        let last_byte = if len == 0 {
            None
        } else {
            let mut byte = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1))?;
            file.read_exact(&mut byte)?;
            Some(byte[0])
        };

        Ok(FileTail { len, last_byte })
    }

    fn read_from(&self, offset: u64) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if offset > len {
            return Err(offset_beyond_end(offset, len));
        }

        let mut buffer = Vec::with_capacity((len - offset) as usize);
        file.seek(SeekFrom::Start(offset))?;
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(bytes)?;
        file.flush()
    }
}
