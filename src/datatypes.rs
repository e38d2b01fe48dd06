use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::utils::{validate_file_name, Result};

/// 键值分隔符
///
/// `.ini` 文件使用 `=`，`.cfg` 文件及默认情况使用 `:`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Delimiter {
    /// `key=value`
    Equals,
    /// `key:value`
    #[default]
    Colon,
}

impl Delimiter {
    /// 从文件扩展名获取分隔符（不区分大小写）
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "ini" => Some(Delimiter::Equals),
            "cfg" => Some(Delimiter::Colon),
            _ => None,
        }
    }

    /// 校验文件名并根据扩展名选择分隔符
    pub fn for_path(path: &Path) -> Result<Self> {
        let extension = validate_file_name(path)?;
        Ok(Self::from_extension(&extension).unwrap_or_default())
    }

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Equals => '=',
            Delimiter::Colon => ':',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::Equals => "=",
            Delimiter::Colon => ":",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 判断字符是否为任意一种分隔符
pub(crate) fn is_delimiter_char(c: char) -> bool {
    c == '=' || c == ':'
}
