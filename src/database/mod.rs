// 数据库模块
// 包含数据库实体定义和存储操作

pub mod models; // 数据库实体定义
pub mod operations; // 数据库操作实现

// 重新导出常用类型
pub use models::counter::CounterTarget;
pub use operations::counter::CounterOperation;
