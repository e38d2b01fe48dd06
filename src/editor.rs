/// 编辑器层模块
///
/// 该模块负责就地修改配置文件：追加新节、在节内容起始处插入键值行，
/// 并在写入成功后重新索引所有受影响节的字节偏移。
///
/// # 架构设计
///
/// - **offsets**: 偏移重新索引的纯计算逻辑（单一职责，穷尽测试）
/// - **patcher**: 通过 `CfgStorage` 执行实际的追加与覆盖写入
///
/// 补丁器只负责 IO 并返回补丁描述，存储的更新由调用方在写入成功后一次性提交，
/// 失败的写入不会留下部分更新的偏移表。
pub mod offsets;
pub mod patcher;

// === 导出公共接口 ===
pub use offsets::Patch;
