/// 类型化取值
///
/// 在 `get` 返回的字符串上做转换，失败时返回 `CfgError::Conversion`，
/// 既不 panic 也不修改存储。
use crate::utils::{CfgError, Result};

/// 可以从配置值转换的类型
pub trait FromCfgValue: Sized {
    /// 错误信息中使用的目标类型名
    const TARGET: &'static str;

    fn parse_value(raw: &str) -> Option<Self>;
}

impl FromCfgValue for bool {
    const TARGET: &'static str = "bool";

    fn parse_value(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "1" | "t" | "true" | "yes" | "on" => Some(true),
            "0" | "f" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

impl FromCfgValue for i64 {
    const TARGET: &'static str = "int64";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl FromCfgValue for f64 {
    const TARGET: &'static str = "float64";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// 将原始字符串转换为目标类型
pub fn convert<T: FromCfgValue>(raw: &str) -> Result<T> {
    T::parse_value(raw).ok_or_else(|| CfgError::Conversion {
        target: T::TARGET,
        raw: raw.to_string(),
    })
}
