//! 进程级配置。数据库名和表名在进程启动时解析一次，之后不可变

use std::sync::LazyLock;

use regex::Regex;

use crate::{error::UdqError, UdqResult};

pub const ENV_EXECUTION_ENV: &str = "AWS_EXECUTION_ENV";
pub const ENV_DATABASE_NAME: &str = "TIMESTREAM_DATABASE_NAME";
pub const ENV_TABLE_NAME: &str = "TIMESTREAM_TABLE_NAME";

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid identifier regex"));

/// Timestream 数据库和表的标识
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderConfig {
    /// 数据库名。未设置时第一次查询会失败
    pub database_name: Option<String>,

    /// 表名。未设置时第一次查询会失败
    pub table_name: Option<String>,
}

impl ReaderConfig {
    pub fn new(database_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            database_name: Some(database_name.into()),
            table_name: Some(table_name.into()),
        }
    }

    /// Build from env values.
    ///
    /// Only when running inside the function runtime (`AWS_EXECUTION_ENV` present) are the
    /// following read:
    ///
    /// - `TIMESTREAM_DATABASE_NAME`
    /// - `TIMESTREAM_TABLE_NAME`
    ///
    /// Otherwise both stay unset, which defers the failure to the first query.
    pub fn from_env() -> Self {
        if std::env::var(ENV_EXECUTION_ENV).is_err() {
            log::info!("{} is not set, timestream database and table are left unconfigured", ENV_EXECUTION_ENV);
            return Self::default();
        }

        Self {
            database_name: std::env::var(ENV_DATABASE_NAME).ok(),
            table_name: std::env::var(ENV_TABLE_NAME).ok(),
        }
    }

    /// 生成 `"db"."table"` 形式的表引用
    pub fn table_ref(&self) -> UdqResult<String> {
        let database_name = self
            .database_name
            .as_deref()
            .ok_or_else(|| UdqError::NotConfigured(format!("{} is not set", ENV_DATABASE_NAME)))?;

        let table_name = self
            .table_name
            .as_deref()
            .ok_or_else(|| UdqError::NotConfigured(format!("{} is not set", ENV_TABLE_NAME)))?;

        for name in [database_name, table_name] {
            if !IDENTIFIER_RE.is_match(name) {
                return Err(UdqError::ValidationFailed(format!("invalid database or table name: {}", name)));
            }
        }

        Ok(format!("\"{}\".\"{}\"", database_name, table_name))
    }
}
