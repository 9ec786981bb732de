// 计数器存储
// Postgres 上的原子自增与读改写回退

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::counter::{CounterError, CounterStore};
use crate::database::models::counter::CounterTarget;

// increment_counter(text, text, uuid, integer) 自带表名/列名白名单
const INCREMENT_SQL: &str = "SELECT increment_counter($1, $2, $3, $4::integer)";

/// 计数器存储，处理计数列的数据库操作
pub struct CounterOperation {
    db: Arc<PgPool>,
}

impl CounterOperation {
    /// 创建新的计数器存储实例
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

/// 校验并加引号，只允许 `[A-Za-z_][A-Za-z0-9_]*`
pub fn quote_ident(name: &str) -> Result<String, CounterError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(format!("\"{}\"", name))
    } else {
        Err(CounterError::InvalidIdentifier(name.to_string()))
    }
}

#[async_trait]
impl CounterStore for CounterOperation {
    async fn atomic_increment(
        &self,
        target: &CounterTarget,
        amount: i64,
    ) -> Result<(), CounterError> {
        sqlx::query(INCREMENT_SQL)
            .bind(target.table.as_str())
            .bind(target.column.as_str())
            .bind(target.row_id)
            .bind(amount)
            .execute(&*self.db)
            .await?;

        Ok(())
    }

    async fn read_value(&self, target: &CounterTarget) -> Result<i64, CounterError> {
        let sql = format!(
            "SELECT COALESCE({}, 0)::bigint FROM {} WHERE id = $1",
            quote_ident(&target.column)?,
            quote_ident(&target.table)?
        );

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(target.row_id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(CounterError::NotFound(target.row_id))
    }

    async fn write_value(&self, target: &CounterTarget, value: i64) -> Result<(), CounterError> {
        let sql = format!(
            "UPDATE {} SET {} = $1 WHERE id = $2",
            quote_ident(&target.table)?,
            quote_ident(&target.column)?
        );

        let result = sqlx::query(&sql)
            .bind(value)
            .bind(target.row_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CounterError::NotFound(target.row_id));
        }
        Ok(())
    }
}
