/// 偏移重新索引
///
/// 一次就地补丁从 `offset` 开始写入 `written` 字节，覆盖了原先从同一位置到
/// 文件末尾的 `replaced` 字节。插入只会让文件变长，因此 `written >= replaced`，
/// 所有起始偏移严格大于 `offset` 的节都要整体后移 `bytes_added()`。
use crate::section::Section;

/// 一次就地补丁的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    /// 补丁起始偏移
    pub offset: u64,
    /// 实际写入的字节数
    pub written: u64,
    /// 被覆盖的原有字节数（即原文件从 `offset` 到末尾的长度）
    pub replaced: u64,
}

impl Patch {
    pub fn new(offset: u64, written: u64, replaced: u64) -> Self {
        debug_assert!(written >= replaced, "an insertion never shrinks the file");
        Self { offset, written, replaced }
    }

    /// 补丁使文件增长的字节数
    pub fn bytes_added(&self) -> u64 {
        self.written.saturating_sub(self.replaced)
    }
}

/// 将除 `patched` 外、偏移严格大于补丁位置的节后移，返回被移动的节数量
pub fn shift_after<'a, I>(sections: I, patched: &str, patch: &Patch) -> usize
where
    I: IntoIterator<Item = &'a mut Section>,
{
    let delta = patch.bytes_added();
    if delta == 0 {
        return 0;
    }

    let mut shifted = 0;
    for section in sections {
        if section.name() != patched && section.file_position() > patch.offset {
            section.set_file_position(section.file_position() + delta);
            shifted += 1;
        }
    }
    shifted
}
