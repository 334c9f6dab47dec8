use serde::Serialize;

use crate::{add_per_request_options, error::UdqError, model::QueryPage, TimestreamClient, TsOp, TsRequest, UdqResult};

/// 单次查询最多返回的行数上限
pub const MAX_ROWS_LIMIT: u32 = 1000;

/// 执行一条查询语句
///
/// 官方文档：<https://docs.aws.amazon.com/timestream/latest/developerguide/API_query_Query.html>
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryRequest {
    /// 查询语句
    pub query_string: String,

    /// 翻页查询的标识
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,

    /// 本页最多返回的行数。取值范围 `1..=1000`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u32>,
}

impl QueryRequest {
    pub fn new(query_string: impl Into<String>) -> Self {
        Self {
            query_string: query_string.into(),
            ..Default::default()
        }
    }

    /// 设置查询语句
    pub fn query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// 设置翻页 Token
    pub fn next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    /// 设置本页最多返回的行数
    pub fn max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub(crate) fn validate(&self) -> UdqResult<()> {
        if self.query_string.trim().is_empty() {
            return Err(UdqError::ValidationFailed("query statement can not be empty".to_string()));
        }

        if let Some(n) = self.max_rows {
            if n == 0 || n > MAX_ROWS_LIMIT {
                return Err(UdqError::ValidationFailed(format!("max rows must be in 1..={}, got {}", MAX_ROWS_LIMIT, n)));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct QueryOperation {
    client: TimestreamClient,
    request: QueryRequest,
}

add_per_request_options!(QueryOperation);

impl QueryOperation {
    pub(crate) fn new(client: TimestreamClient, request: QueryRequest) -> Self {
        Self { client, request }
    }

    pub async fn send(self) -> UdqResult<QueryPage> {
        self.request.validate()?;

        let Self { client, request } = self;

        log::debug!("query string: {}", request.query_string);

        let req = TsRequest {
            operation: TsOp::Query,
            body: serde_json::to_vec(&request)?,
            ..Default::default()
        };

        let resp = client.send(req).await?;
        let page: QueryPage = serde_json::from_slice(&resp.bytes().await?)?;

        log::debug!(
            "query {} returned {} rows, has next token: {}",
            page.query_id.as_deref().unwrap_or("-"),
            page.rows.len(),
            page.next_token.is_some()
        );

        Ok(page)
    }
}
