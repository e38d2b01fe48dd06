/// 内存存储实现
///
/// 克隆共享同一块缓冲区，便于在测试中一边交给解析器、一边检查内容。
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::traits::{offset_beyond_end, CfgStorage, FileTail};

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<Vec<u8>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Arc::new(Mutex::new(contents.into())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 当前内容的副本
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// 打开后所有 `write_at`/`append` 都返回错误且不修改内容
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }
        Ok(())
    }
}

impl CfgStorage for MemoryStorage {
    fn read_all(&self) -> io::Result<Vec<u8>> {
        Ok(self.contents())
    }

    fn tail(&self) -> io::Result<FileTail> {
        let data = self.lock();
        Ok(FileTail {
            len: data.len() as u64,
            last_byte: data.last().copied(),
        })
    }

    fn read_from(&self, offset: u64) -> io::Result<Vec<u8>> {
        let data = self.lock();
        let len = data.len() as u64;
        if offset > len {
            return Err(offset_beyond_end(offset, len));
        }
        Ok(data[offset as usize..].to_vec())
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.check_writable()?;

        let mut data = self.lock();
        let len = data.len() as u64;
        if offset > len {
            return Err(offset_beyond_end(offset, len));
        }

        let start = offset as usize;
        let end = start + bytes.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        self.check_writable()?;
        self.lock().extend_from_slice(bytes);
        Ok(())
    }
}
