/// 文件补丁器
///
/// 只执行 IO 并返回补丁结果，不修改内存存储。调用方在写入成功后再提交。
use crate::io::traits::offset_beyond_end;
use crate::io::CfgStorage;
use crate::utils::{IoOp, Result};

use super::offsets::Patch;

/// 追加新节后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedSection {
    /// 写入的节头文本
    pub header: String,
    /// 新节内容的起始偏移（紧跟节头之后）
    pub file_position: u64,
}

/// 插入键值行后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedEntry {
    pub patch: Patch,
    /// 被补丁节的新起始偏移；仅当需要补一个换行时比原偏移大 1
    pub section_position: u64,
}

/// 生成节头文本，保证新节之前恰好有一个空行
pub fn section_header(name: &str, last_byte: Option<u8>) -> String {
    match last_byte {
        None => format!("[{name}]\n"),
        Some(b'\n') => format!("\n[{name}]\n"),
        Some(_) => format!("\n\n[{name}]\n"),
    }
}

/// 在存储末尾追加节头
pub fn append_section(storage: &dyn CfgStorage, name: &str) -> Result<AppendedSection> {
    let tail = storage.tail().map_err(|e| IoOp::Stat.wrap(e))?;
    let header = section_header(name, tail.last_byte);

    storage
        .append(header.as_bytes())
        .map_err(|e| IoOp::Append.wrap(e))?;

    Ok(AppendedSection {
        file_position: tail.len + header.len() as u64,
        header,
    })
}

/// 在 `offset` 处插入一行 `line`
///
/// 读取从 `offset` 到文件末尾的后缀，把 `line\n` + 后缀写回 `offset`。
/// 新内容总是不短于被覆盖的后缀，因此无需截断。若 `offset` 前一个字节不是
/// 换行符（节头位于文件末尾且没有行尾），先补一个 `\n`。
pub fn insert_line(storage: &dyn CfgStorage, offset: u64, line: &str) -> Result<InsertedEntry> {
    let read_start = offset.saturating_sub(1);
    let buffer = storage
        .read_from(read_start)
        .map_err(|e| IoOp::Read.wrap(e))?;

    let (needs_newline, suffix) = if offset == 0 {
        (false, buffer.as_slice())
    } else {
        match buffer.split_first() {
            Some((&previous, rest)) => (previous != b'\n', rest),
            None => return Err(IoOp::Read.wrap(offset_beyond_end(offset, read_start))),
        }
    };

    let mut bytes = Vec::with_capacity(line.len() + suffix.len() + 2);
    if needs_newline {
        bytes.push(b'\n');
    }
    bytes.extend_from_slice(line.as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(suffix);

    storage
        .write_at(offset, &bytes)
        .map_err(|e| IoOp::Write.wrap(e))?;

    Ok(InsertedEntry {
        patch: Patch::new(offset, bytes.len() as u64, suffix.len() as u64),
        section_position: offset + u64::from(needs_newline),
    })
}
