/// IO 抽象层 - trait 定义
///
/// 补丁器只通过这些操作访问后备存储，每个操作都是独立的、同步的，
/// 不在操作之间持有任何句柄。

use std::fmt;
use std::io;

/// 存储尾部信息：当前长度与最后一个字节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTail {
    pub len: u64,
    pub last_byte: Option<u8>,
}

/// 配置文件的后备存储
///
/// # 职责
/// - 提供整体读取、尾部查询、按偏移读写和追加
/// - 不负责解析，仅负责 IO
///
/// # 约定
/// - `read_from` 在偏移超出存储长度时返回 `UnexpectedEof` 错误
/// - `write_at` 覆盖从偏移开始的字节，必要时扩展存储，不截断
/// - `write_at` 与 `append` 返回前必须已写入全部字节并刷新
pub trait CfgStorage: fmt::Debug + Send + Sync {
    /// 读取全部内容
    fn read_all(&self) -> io::Result<Vec<u8>>;

    /// 查询长度与最后一个字节
    fn tail(&self) -> io::Result<FileTail>;

    /// 读取从 `offset` 到末尾的全部字节
    fn read_from(&self, offset: u64) -> io::Result<Vec<u8>>;

    /// 从 `offset` 开始覆盖写入
    fn write_at(&self, offset: u64, bytes: &[u8]) -> io::Result<()>;

    /// 追加到末尾
    fn append(&self, bytes: &[u8]) -> io::Result<()>;
}

pub(crate) fn offset_beyond_end(offset: u64, len: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("offset {offset} lies beyond end of storage ({len} bytes)"),
    )
}
