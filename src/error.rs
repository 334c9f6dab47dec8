use std::fmt::{Display, Formatter};

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Timestream 接口返回的错误信息。
///
/// 形如 `{"__type": "com.amazonaws.timestream.v20181101#ValidationException", "message": "..."}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(rename = "__type", default)]
    pub error_type: String,

    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ApiError {
    /// 去掉命名空间前缀的错误码，例如 `ValidationException`
    pub fn code(&self) -> &str {
        match self.error_type.rsplit_once('#') {
            Some((_, code)) => code,
            None => self.error_type.as_str(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "API response error. code: {}, message: {}",
            self.code(),
            self.message.as_deref().unwrap_or("")
        )
    }
}

#[derive(Error, Debug)]
pub enum UdqError {
    #[error("{0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The vehicle identity could not be resolved from the request context.
    #[error("Missing context: {0}")]
    MissingContext(String),

    /// None of the typed `measure_value::*` columns is populated.
    #[error("Unhandled type in timestream row: {0}")]
    UnhandledRowType(String),

    #[error("Unsupported column type: {0}")]
    UnsupportedColumnType(String),

    #[error("Row has {data} data cells but the column schema has {columns} columns")]
    ColumnCountMismatch { columns: usize, data: usize },

    #[error("Column is missing from timestream row: {0}")]
    MissingColumn(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// This is error for Timestream API response.
    #[error("{0}")]
    ApiError(Box<ApiError>),

    #[error("Timestream api response with non-successful code: {0}. response message is: {1}")]
    StatusError(StatusCode, String),
}

impl UdqError {
    /// 是否为查询引擎执行失败（请求被拒绝、网络错误等）
    pub fn is_query_execution(&self) -> bool {
        matches!(self, Self::ApiError(_) | Self::StatusError(_, _) | Self::ReqwestError(_))
    }

    /// 返回给函数运行时的错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ReqwestError(_) | Self::ApiError(_) | Self::StatusError(_, _) => "QueryExecutionError",
            Self::JsonError(_) => "JsonError",
            Self::ValidationFailed(_) => "ValidationError",
            Self::MissingContext(_) => "MissingContextError",
            Self::UnhandledRowType(_) => "UnhandledRowTypeError",
            Self::UnsupportedColumnType(_) => "UnsupportedColumnTypeError",
            Self::ColumnCountMismatch { .. } | Self::MissingColumn(_) | Self::InvalidValue(_) => "RowDecodeError",
            Self::NotConfigured(_) => "NotConfiguredError",
        }
    }
}
