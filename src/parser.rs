/// 行解析器
///
/// 将字节流逐行解析为 `Store`，并记录每个节内容的起始字节偏移。
/// 偏移按物理行的实际字节数累计（包括空行、注释行以及 `\n`/`\r\n` 行尾），
/// 所以记录下来的位置就是文件中的真实偏移。
use std::borrow::Cow;
use std::io::Read;

use crate::datatypes::{is_delimiter_char, Delimiter};
use crate::section::Section;
use crate::store::Store;
use crate::utils::{CfgError, IoOp, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 单行的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    Blank,
    Comment,
    Header(&'a str),
    Entry { key: String, value: &'a str },
    /// 看起来像键值行，但找不到当前分隔符
    Malformed,
    Other,
}

/// 从 reader 读取全部内容并解析
pub fn parse<R: Read>(mut reader: R, delimiter: Delimiter) -> Result<Store> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|e| IoOp::Read.wrap(e))?;
    parse_bytes(&data, delimiter)
}

/// 解析内存中的字节数据
pub fn parse_bytes(data: &[u8], delimiter: Delimiter) -> Result<Store> {
    let mut store = Store::new();
    let mut cursor: u64 = 0;
    let mut current: Option<Section> = None;

    let body = match data.strip_prefix(UTF8_BOM) {
        Some(rest) => {
            cursor = UTF8_BOM.len() as u64;
            rest
        }
        None => data,
    };

    for (index, raw) in body.split_inclusive(|&b| b == b'\n').enumerate() {
        let line_no = index + 1;
        cursor += raw.len() as u64;

        let text = decode_line(raw);
        match classify(text.trim(), delimiter) {
            Line::Blank | Line::Comment => {}
            Line::Header(name) => {
                if let Some(section) = current.take() {
                    store.insert(section, None)?;
                }
                if store.contains(name) {
                    return Err(CfgError::DuplicateSection {
                        name: name.to_string(),
                        line: Some(line_no),
                    });
                }
                tracing::debug!(section = name, file_position = cursor, line = line_no, "section header");
                current = Some(Section::new(name.to_string(), cursor));
            }
            Line::Entry { key, value } => match current.as_mut() {
                Some(section) => {
                    section.insert(key, value.to_string());
                }
                None => {
                    tracing::debug!(line = line_no, key = %key, "key/value before any section ignored");
                }
            },
            Line::Malformed => return Err(CfgError::MalformedLine { line: line_no }),
            Line::Other => {
                tracing::debug!(line = line_no, "unrecognised line ignored");
            }
        }
    }

    if let Some(section) = current.take() {
        store.insert(section, None)?;
    }

    Ok(store)
}

/// 去掉行尾并解码（非法 UTF-8 以替换字符代替，偏移仍按原始字节计算）
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

/// 对已去除首尾空白的行进行分类
pub(crate) fn classify(line: &str, delimiter: Delimiter) -> Line<'_> {
    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with('#') {
        return Line::Comment;
    }
    if let Some(name) = section_name(line) {
        return Line::Header(name);
    }
    if !looks_like_entry(line) {
        return Line::Other;
    }

    match split_entry(line, delimiter.as_char()) {
        Some((key, value)) => Line::Entry {
            key,
            value: strip_inline_comment(value.trim()),
        },
        None => Line::Malformed,
    }
}

fn section_name(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// 首字符不是分隔符，且行内含有任一分隔符
fn looks_like_entry(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !is_delimiter_char(c)) && line.contains(is_delimiter_char)
}

/// 在第一个未转义的分隔符处拆分，键中的 `\<delim>` 还原为分隔符
fn split_entry(line: &str, delimiter: char) -> Option<(String, &str)> {
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            let key = line[..i]
                .trim()
                .replace(&format!("\\{delimiter}"), &delimiter.to_string());
            return Some((key, &line[i + c.len_utf8()..]));
        }
    }

    None
}

/// 行内注释：仅当 `;` 前紧跟空白字符时截断
pub(crate) fn strip_inline_comment(value: &str) -> &str {
    for (i, c) in value.char_indices() {
        if c == ';' && value[..i].ends_with(char::is_whitespace) {
            return value[..i].trim_end();
        }
    }
    value
}
