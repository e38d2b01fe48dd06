use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::convert::{convert, FromCfgValue};
use crate::datatypes::{is_delimiter_char, Delimiter};
use crate::editor::patcher;
use crate::io::{CfgStorage, FileStorage};
use crate::parser;
use crate::section::Section;
use crate::store::Store;
use crate::utils::{CfgError, IoOp, Result};


/// INI/CFG 配置解析器
///
/// 持有内存中的节存储、分隔符以及后备存储。读取接口获取存储的读锁；
/// `add_section`/`set` 先通过变更锁互相串行，IO 成功后在写锁内一次性提交
/// 值和偏移，读者不会看到只更新了一半的偏移表。
///
/// # 使用示例
///
/// ```rust,ignore
/// use cfgparse::CfgParser;
///
/// let mut config = CfgParser::new();
/// config.read_file("config.ini")?;
///
/// let user = config.get("base", "username")?;
/// config.add_section("extra")?;
/// config.set("extra", "city", "pune")?;
/// ```
#[derive(Debug, Default)]
pub struct CfgParser {
    /// 文件路径（仅 `read_file` 加载时有值）
    path: Option<PathBuf>,
    /// 键值分隔符
    delimiter: Delimiter,
    /// 后备存储；`parse` 从任意 reader 加载时为空，此时不可修改
    storage: Option<Box<dyn CfgStorage>>,
    /// 节存储
    store: RwLock<Store>,
    /// 变更锁，串行化 `add_section` 与 `set`
    mutation: Mutex<()>,
}

impl CfgParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定分隔符创建解析器
    pub fn with_delimiter(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }

    /// 读取并解析配置文件
    ///
    /// 校验文件名与扩展名，根据扩展名选择分隔符（`.ini` -> `=`，`.cfg` -> `:`）。
    /// 解析失败时解析器保持原状。
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let delimiter = Delimiter::for_path(path)?;
        let storage = FileStorage::new(path);

        let data = storage.read_all().map_err(|e| IoOp::Read.wrap(e))?;
        let store = parser::parse_bytes(&data, delimiter)?;

        tracing::debug!(path = %path.display(), sections = store.len(), %delimiter, "config file loaded");

        self.path = Some(path.to_path_buf());
        self.delimiter = delimiter;
        self.storage = Some(Box::new(storage));
        self.install(store);
        Ok(())
    }

    /// 从任意存储加载（使用当前分隔符），之后的修改写回该存储
    pub fn open_storage(&mut self, storage: impl CfgStorage + 'static) -> Result<()> {
        let data = storage.read_all().map_err(|e| IoOp::Read.wrap(e))?;
        let store = parser::parse_bytes(&data, self.delimiter)?;

        self.path = None;
        self.storage = Some(Box::new(storage));
        self.install(store);
        Ok(())
    }

    /// 从 reader 解析（使用当前分隔符）
    ///
    /// 没有后备存储，之后调用 `add_section`/`set` 会返回 `NoBackingStorage`。
    pub fn parse<R: Read>(&mut self, reader: R) -> Result<()> {
        let store = parser::parse(reader, self.delimiter)?;

        self.path = None;
        self.storage = None;
        self.install(store);
        Ok(())
    }

    fn install(&mut self, store: Store) {
        *self
            .store
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = store;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// 所有节名称（顺序不保证）
    pub fn get_all_sections(&self) -> Vec<String> {
        self.read_store().section_names()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.read_store().contains(section)
    }

    /// 节内所有键值（原始值，不做插值）
    pub fn items(&self, section: &str) -> Result<HashMap<String, String>> {
        self.read_store().items(section).cloned()
    }

    /// 获取值并展开 `%(key)s` 引用
    pub fn get(&self, section: &str, key: &str) -> Result<String> {
        self.read_store().get(section, key)
    }

    /// 获取值并转换为目标类型
    pub fn get_as<T: FromCfgValue>(&self, section: &str, key: &str) -> Result<T> {
        let value = self.get(section, key)?;
        convert(&value)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool> {
        self.get_as(section, key)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64> {
        self.get_as(section, key)
    }

    pub fn get_float(&self, section: &str, key: &str) -> Result<f64> {
        self.get_as(section, key)
    }

    /// 节内容在文件中的起始偏移
    pub fn file_position(&self, section: &str) -> Result<u64> {
        Ok(self.read_store().section(section)?.file_position())
    }

    /// 当前存储的快照
    pub fn snapshot(&self) -> Store {
        self.read_store().clone()
    }

    /// 在文件末尾追加新节
    ///
    /// 节头写入并刷新成功后才注册到存储；IO 失败时存储不变。
    pub fn add_section(&self, name: &str) -> Result<()> {
        validate_section_name(name)?;
        self.ensure_absent(name)?;

        let _guard = self.lock_mutations();
        // 等待锁期间可能已被其他线程添加
        self.ensure_absent(name)?;

        let storage = self.storage()?;
        let appended = patcher::append_section(storage, name)?;

        self.write_store()
            .insert(Section::new(name.to_string(), appended.file_position), None)?;

        tracing::info!(section = name, file_position = appended.file_position, "section appended");
        Ok(())
    }

    /// 设置键值：在节内容起始处插入 `key<delim>value` 行
    ///
    /// 节不存在时先隐式调用 `add_section`。文件中同名的旧行保持不变，
    /// 内存中只保留最新值。写入成功后其他位于补丁点之后的节整体后移。
    pub fn set(&self, section: &str, key: &str, value: &str) -> Result<()> {
        self.validate_entry(key, value)?;
        let storage = self.storage()?;

        if !self.has_section(section) {
            match self.add_section(section) {
                Ok(()) | Err(CfgError::DuplicateSection { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let _guard = self.lock_mutations();

        let offset = self.file_position(section)?;
        let line = format!("{}{}{}", key, self.delimiter, value);
        let inserted = patcher::insert_line(storage, offset, &line)?;

        let mut store = self.write_store();
        let target = store.section_mut(section)?;
        target.insert(key.to_string(), value.to_string());
        target.set_file_position(inserted.section_position);
        let shifted = store.reindex(section, &inserted.patch);

        tracing::info!(
            section,
            key,
            offset,
            bytes_added = inserted.patch.bytes_added(),
            shifted,
            "entry inserted"
        );
        Ok(())
    }

    fn storage(&self) -> Result<&dyn CfgStorage> {
        self.storage.as_deref().ok_or(CfgError::NoBackingStorage)
    }

    fn ensure_absent(&self, name: &str) -> Result<()> {
        if self.has_section(name) {
            return Err(CfgError::DuplicateSection {
                name: name.to_string(),
                line: None,
            });
        }
        Ok(())
    }

    /// 拒绝会破坏行结构（进而破坏偏移）的键值
    fn validate_entry(&self, key: &str, value: &str) -> Result<()> {
        let reason = if key.is_empty() {
            Some("key cannot be empty")
        } else if key != key.trim() {
            Some("key cannot have leading or trailing whitespace")
        } else if key.contains(self.delimiter.as_char()) {
            Some("key cannot contain the delimiter")
        } else if key.starts_with(is_delimiter_char)
            || key.starts_with(['#', '['])
            || key.ends_with('\\')
        {
            Some("key would not be read back as a key/value line")
        } else if key.contains(['\n', '\r']) || value.contains(['\n', '\r']) {
            Some("key and value cannot contain line breaks")
        } else if value != value.trim() {
            Some("value cannot have leading or trailing whitespace")
        } else if parser::strip_inline_comment(value) != value {
            Some("value would be cut at an inline comment")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CfgError::InvalidEntry {
                key: key.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(|poisoned| {
            tracing::warn!("store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(|poisoned| {
            tracing::warn!("store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("mutation lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

fn validate_section_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains([']', '\n', '\r']) {
        return Err(CfgError::InvalidSectionName(name.to_string()));
    }
    Ok(())
}
