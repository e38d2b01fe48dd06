use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::SUPPORTED_EXTENSIONS;

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum CfgError {
    #[error("File type not supported: {extension:?} (supported: {})", SUPPORTED_EXTENSIONS.join(", "))]
    InvalidFileType { extension: String },

    #[error("File name cannot be empty")]
    EmptyFileName,

    #[error("Duplicate section [{name}]{}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    DuplicateSection { name: String, line: Option<usize> },

    #[error("Malformed key/value line at line {line}")]
    MalformedLine { line: usize },

    #[error("No such section: [{0}]")]
    UnknownSection(String),

    #[error("No such key {key:?} in section [{section}]")]
    UnknownKey { section: String, key: String },

    #[error("Cannot convert {raw:?} to type {target}")]
    Conversion { target: &'static str, raw: String },

    #[error("IO error during {op}: {source}")]
    Io {
        op: IoOp,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid section name: {0:?}")]
    InvalidSectionName(String),

    #[error("Invalid entry {key:?}: {reason}")]
    InvalidEntry { key: String, reason: &'static str },

    #[error("Parser has no backing storage to mutate")]
    NoBackingStorage,
}

/// 库内统一的 Result 类型
pub type Result<T> = std::result::Result<T, CfgError>;

/// 发生 IO 错误时正在进行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Stat,
    Append,
    Write,
    Backup,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoOp::Read => "read",
            IoOp::Stat => "stat",
            IoOp::Append => "append",
            IoOp::Write => "write",
            IoOp::Backup => "backup",
        };
        f.write_str(name)
    }
}

impl IoOp {
    /// 将 std::io::Error 包装为带操作信息的 CfgError
    pub(crate) fn wrap(self, source: std::io::Error) -> CfgError {
        CfgError::Io { op: self, source }
    }
}

/// 获取并校验文件扩展名（小写，不含点）
pub fn validate_file_name(path: &Path) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(CfgError::EmptyFileName);
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CfgError::InvalidFileType { extension });
    }

    Ok(extension)
}

/// 创建文件备份
pub fn create_backup(file_path: &Path) -> Result<PathBuf> {
    if !file_path.exists() {
        return Err(IoOp::Backup.wrap(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在",
        )));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("cfg");
    let backup_path = file_path.with_extension(format!("{}.{}.bak", extension, timestamp));

    std::fs::copy(file_path, &backup_path).map_err(|e| IoOp::Backup.wrap(e))?;

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_file_name() {
        assert_eq!(validate_file_name(Path::new("app.ini")).unwrap(), "ini");
        assert_eq!(validate_file_name(Path::new("APP.CFG")).unwrap(), "cfg");

        assert!(matches!(
            validate_file_name(Path::new("")),
            Err(CfgError::EmptyFileName)
        ));
        assert!(matches!(
            validate_file_name(Path::new("settings.toml")),
            Err(CfgError::InvalidFileType { extension }) if extension == "toml"
        ));
        assert!(matches!(
            validate_file_name(Path::new("noext")),
            Err(CfgError::InvalidFileType { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = CfgError::DuplicateSection { name: "base".to_string(), line: Some(4) };
        assert_eq!(err.to_string(), "Duplicate section [base] at line 4");

        let err = CfgError::DuplicateSection { name: "base".to_string(), line: None };
        assert_eq!(err.to_string(), "Duplicate section [base]");

        let err = CfgError::Conversion { target: "bool", raw: "notabool".to_string() };
        assert_eq!(err.to_string(), "Cannot convert \"notabool\" to type bool");
    }

    #[test]
    fn test_create_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.ini");
        std::fs::write(&path, "[base]\nkey=value\n").unwrap();

        let backup = create_backup(&path).unwrap();
        assert!(backup.exists());
        assert!(backup.to_string_lossy().ends_with(".bak"));
        assert_eq!(std::fs::read(&backup).unwrap(), std::fs::read(&path).unwrap());
    }

    #[test]
    fn test_create_backup_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = create_backup(&temp_dir.path().join("missing.ini"));
        assert!(matches!(result, Err(CfgError::Io { op: IoOp::Backup, .. })));
    }
}
