// 计数器目标
// 指向某张表中某一行的某个数值列

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 计数器目标，表名与列名须在服务端存储过程的白名单内
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterTarget {
    /// 表名
    pub table: String,
    /// 列名
    pub column: String,
    /// 行主键
    pub row_id: Uuid,
}

impl CounterTarget {
    pub fn new(table: impl Into<String>, column: impl Into<String>, row_id: Uuid) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            row_id,
        }
    }

    /// 帖子浏览数
    pub fn thread_views(thread_id: Uuid) -> Self {
        Self::new("threads", "view_count", thread_id)
    }

    /// 回复投票数
    pub fn post_votes(post_id: Uuid) -> Self {
        Self::new("posts", "vote_count", post_id)
    }
}
