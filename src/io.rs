/// IO 抽象层模块
///
/// 该模块提供了配置文件读写的抽象接口，解析与补丁逻辑只依赖 trait，
/// 不直接接触文件系统。支持依赖注入、测试 mock 和替换 IO 实现（如内存 IO）。
///
/// # 架构设计
///
/// - **traits**: 定义 `CfgStorage` trait 接口
/// - **file_io**: 基于文件系统的默认实现，每次调用独立打开、关闭文件句柄
/// - **memory_io**: 内存实现，支持注入写入失败
///
/// # 使用示例
///
/// ```rust,ignore
/// use cfgparse::io::{CfgStorage, FileStorage};
///
/// let storage = FileStorage::new("app.ini");
/// let tail = storage.tail()?;
/// ```
pub mod traits;
pub mod file_io;
pub mod memory_io;

// === 导出 trait 定义 ===
pub use traits::{CfgStorage, FileTail};

// === 导出默认实现 ===
pub use file_io::FileStorage;
pub use memory_io::MemoryStorage;
