pub mod datatypes;
pub mod section;
pub mod store;
pub mod parser;
pub mod convert;
pub mod editor;
pub mod io;
pub mod cfg_parser;
pub mod utils;

// 重新导出主要结构
pub use cfg_parser::CfgParser;
pub use datatypes::Delimiter;
pub use section::Section;
pub use store::Store;
pub use convert::FromCfgValue;
pub use io::{CfgStorage, FileStorage, MemoryStorage};
pub use utils::{create_backup, CfgError, IoOp, Result};

// 常量定义
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ini", "cfg"];

/// `%(key)s` 插值的最大替换轮数
pub const MAX_INTERPOLATION_DEPTH: usize = 10;
