use std::collections::HashMap;

use serde::Serialize;

use crate::editor::offsets::{self, Patch};
use crate::section::Section;
use crate::utils::{CfgError, Result};
use crate::MAX_INTERPOLATION_DEPTH;

/// 内存中的配置存储：节名称 -> 节
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Store {
    sections: HashMap<String, Section>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个节
    ///
    /// 名称已存在时返回 `DuplicateSection`，存储保持不变。
    pub(crate) fn insert(&mut self, section: Section, line: Option<usize>) -> Result<()> {
        if self.sections.contains_key(section.name()) {
            return Err(CfgError::DuplicateSection {
                name: section.name().to_string(),
                line,
            });
        }
        self.sections.insert(section.name().to_string(), section);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// 所有节名称（顺序不保证）
    pub fn section_names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    pub fn section(&self, name: &str) -> Result<&Section> {
        self.sections
            .get(name)
            .ok_or_else(|| CfgError::UnknownSection(name.to_string()))
    }

    pub(crate) fn section_mut(&mut self, name: &str) -> Result<&mut Section> {
        self.sections
            .get_mut(name)
            .ok_or_else(|| CfgError::UnknownSection(name.to_string()))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn items(&self, section: &str) -> Result<&HashMap<String, String>> {
        Ok(self.section(section)?.items())
    }

    /// 获取未经插值的原始值
    pub fn get_raw(&self, section: &str, key: &str) -> Result<&str> {
        self.section(section)?
            .get(key)
            .ok_or_else(|| CfgError::UnknownKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// 获取值并展开 `%(key)s` 引用
    pub fn get(&self, section: &str, key: &str) -> Result<String> {
        let raw = self.get_raw(section, key)?;
        interpolate(self.section(section)?, raw)
    }

    /// 按补丁重新索引：除 `patched` 外，偏移严格大于补丁位置的节整体后移
    pub(crate) fn reindex(&mut self, patched: &str, patch: &Patch) -> usize {
        offsets::shift_after(self.sections.values_mut(), patched, patch)
    }
}

/// 有界深度的插值
///
/// 每一轮把当前值中所有 `%(ref)s` 替换为同一节中 `ref` 的原始值，最多
/// `MAX_INTERPOLATION_DEPTH` 轮。轮数耗尽时剩余引用原样保留，不报错，
/// 因此自引用或循环引用也会在有限步内返回。
fn interpolate(section: &Section, value: &str) -> Result<String> {
    let mut current = value.to_string();

    for _ in 0..MAX_INTERPOLATION_DEPTH {
        if !current.contains("%(") {
            break;
        }
        current = expand_once(section, &current)?;
    }

    Ok(current)
}

fn expand_once(section: &Section, value: &str) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("%(") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        // 引用名中不能包含 ')'
        let Some(close) = after.find(')') else {
            result.push_str(&rest[start..]);
            return Ok(result);
        };

        if !after[close..].starts_with(")s") {
            result.push_str("%(");
            rest = after;
            continue;
        }

        let reference = &after[..close];
        let replacement = section.get(reference).ok_or_else(|| CfgError::UnknownKey {
            section: section.name().to_string(),
            key: reference.to_string(),
        })?;
        result.push_str(replacement);
        rest = &after[close + 2..];
    }

    result.push_str(rest);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(entries: &[(&str, &str)]) -> Store {
        let mut section = Section::new("paths".to_string(), 8);
        for (key, value) in entries {
            section.insert(key.to_string(), value.to_string());
        }
        let mut store = Store::new();
        store.insert(section, None).unwrap();
        store
    }

    #[test]
    fn test_lookup_errors() {
        let store = store_with(&[("home", "/home/user")]);

        assert!(matches!(store.get("nope", "home"), Err(CfgError::UnknownSection(s)) if s == "nope"));
        assert!(matches!(
            store.get("paths", "nope"),
            Err(CfgError::UnknownKey { key, .. }) if key == "nope"
        ));
        assert!(matches!(store.items("nope"), Err(CfgError::UnknownSection(_))));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut store = store_with(&[]);
        let result = store.insert(Section::new("paths".to_string(), 99), Some(3));

        assert!(matches!(
            result,
            Err(CfgError::DuplicateSection { name, line: Some(3) }) if name == "paths"
        ));
        assert_eq!(store.section("paths").unwrap().file_position(), 8);
    }

    #[test]
    fn test_interpolation_transitive() {
        let store = store_with(&[
            ("home", "/home/user"),
            ("data", "%(home)s/data"),
            ("cache", "%(data)s/cache and %(home)s"),
        ]);

        assert_eq!(store.get("paths", "data").unwrap(), "/home/user/data");
        assert_eq!(
            store.get("paths", "cache").unwrap(),
            "/home/user/data/cache and /home/user"
        );
        // 原始值保持不变
        assert_eq!(store.get_raw("paths", "cache").unwrap(), "%(data)s/cache and %(home)s");
    }

    #[test]
    fn test_interpolation_self_reference_terminates() {
        let store = store_with(&[("loop", "%(loop)s")]);
        assert_eq!(store.get("paths", "loop").unwrap(), "%(loop)s");
    }

    #[test]
    fn test_interpolation_mutual_cycle_terminates() {
        let store = store_with(&[("a", "x%(b)s"), ("b", "y%(a)s")]);

        let value = store.get("paths", "a").unwrap();
        // 10 轮替换后仍有未展开的引用
        assert!(value.ends_with("%(a)s") || value.ends_with("%(b)s"));
        assert_eq!(value.matches(['x', 'y']).count(), MAX_INTERPOLATION_DEPTH + 1);
    }

    #[test]
    fn test_interpolation_depth_limit() {
        // 12 级链式引用，只能展开 10 级
        let keys: Vec<String> = (0..=12).map(|i| format!("k{i}")).collect();
        let values: Vec<String> = (0..12).map(|i| format!("%(k{})s", i + 1)).collect();
        let mut entries = Vec::new();
        for i in 0..12 {
            entries.push((keys[i].as_str(), values[i].as_str()));
        }
        entries.push((keys[12].as_str(), "end"));

        let store = store_with(&entries);
        assert_eq!(store.get("paths", "k2").unwrap(), "end");
        assert_eq!(store.get("paths", "k0").unwrap(), "%(k11)s");
    }

    #[test]
    fn test_interpolation_missing_reference() {
        let store = store_with(&[("a", "%(missing)s")]);
        assert!(matches!(
            store.get("paths", "a"),
            Err(CfgError::UnknownKey { key, .. }) if key == "missing"
        ));
    }

    #[test]
    fn test_interpolation_ignores_non_tokens() {
        let store = store_with(&[
            ("pct", "100%"),
            ("paren", "%(home)x and %(unclosed"),
            ("home", "/h"),
        ]);

        assert_eq!(store.get("paths", "pct").unwrap(), "100%");
        assert_eq!(store.get("paths", "paren").unwrap(), "%(home)x and %(unclosed");
    }
}
