pub mod counter; // 计数器存储实现
