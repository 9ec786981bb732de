//! 计数列自增
//!
//! 优先调用服务端原子存储过程；失败时退化为读改写，结果不小于 0。
//! 退化路径不是原子的，并发调用可能丢失更新。
//! 所有错误只记日志，不影响调用方的主流程。

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::counter::CounterTarget;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("row not found: {0}")]
    NotFound(Uuid),
}

/// 计数列的存储后端
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// 单次不可分割的自增
    async fn atomic_increment(&self, target: &CounterTarget, amount: i64)
    -> Result<(), CounterError>;

    async fn read_value(&self, target: &CounterTarget) -> Result<i64, CounterError>;

    async fn write_value(&self, target: &CounterTarget, value: i64) -> Result<(), CounterError>;
}

#[derive(Clone)]
pub struct CounterIncrementer {
    store: Arc<dyn CounterStore>,
}

impl CounterIncrementer {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn increment_by_one(&self, target: &CounterTarget) {
        self.increment(target, 1).await
    }

    pub async fn increment(&self, target: &CounterTarget, amount: i64) {
        match self.store.atomic_increment(target, amount).await {
            Ok(()) => {
                tracing::debug!(
                    "Incremented {}.{} for {} by {}",
                    target.table,
                    target.column,
                    target.row_id,
                    amount
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Atomic increment of {}.{} failed, using read-modify-write: {}",
                    target.table,
                    target.column,
                    e
                );
                if let Err(e) = self.read_modify_write(target, amount).await {
                    tracing::error!(
                        "Counter fallback for {}.{} ({}) failed: {}",
                        target.table,
                        target.column,
                        target.row_id,
                        e
                    );
                }
            }
        }
    }

    // 非原子：读与写之间的并发更新会被覆盖
    async fn read_modify_write(
        &self,
        target: &CounterTarget,
        amount: i64,
    ) -> Result<i64, CounterError> {
        let current = self.store.read_value(target).await?;
        let next = current.saturating_add(amount).max(0);
        self.store.write_value(target, next).await?;
        Ok(next)
    }
}
