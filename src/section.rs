use std::collections::HashMap;

use serde::Serialize;

/// 配置文件中的一个节（`[name]` 及其键值对）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// 节名称（文件内唯一）
    name: String,
    /// 键值映射，后写入者覆盖
    items: HashMap<String, String>,
    /// 节内容在文件中的起始字节偏移（紧跟 `[name]` 行的行尾之后）
    file_position: u64,
}

impl Section {
    pub(crate) fn new(name: String, file_position: u64) -> Self {
        Self {
            name,
            items: HashMap::new(),
            file_position,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &HashMap<String, String> {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn file_position(&self) -> u64 {
        self.file_position
    }

    pub(crate) fn set_file_position(&mut self, file_position: u64) {
        self.file_position = file_position;
    }

    /// 插入或覆盖一个键值
    pub(crate) fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.items.insert(key, value)
    }
}
