pub mod counter; // 计数器目标
