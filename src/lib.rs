use std::{
    collections::HashMap,
    fmt::Display,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use error::{ApiError, UdqError};
use model::QueryPage;
use query::{DescribeEndpointsOperation, QueryOperation, QueryRequest};
use reqwest::{
    Response, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use url::Url;
use util::{get_amz_date_string, get_amz_date_time_string, hmac_sha256, sha256_hex};

pub mod config;
pub mod error;
pub mod macros;
pub mod model;
pub mod query;
pub mod reader;
pub mod runtime;
pub mod schema;
pub mod udq;
pub mod util;

#[cfg(test)]
pub mod test_util;

const USER_AGENT: &str = "twinfleet-udq/0.1.0";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const HEADER_AMZ_DATE: &str = "x-amz-date";
const HEADER_AMZ_TARGET: &str = "x-amz-target";
const HEADER_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";
const HEADER_AUTHORIZATION: &str = "authorization";

const TARGET_PREFIX: &str = "Timestream_20181101";
const SIGNING_SERVICE: &str = "timestream";
const SIGNING_ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub type UdqResult<T> = Result<T, UdqError>;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsOp {
    #[default]
    Undefined,

    DescribeEndpoints,
    Query,
}

impl From<TsOp> for String {
    fn from(value: TsOp) -> Self {
        value.to_string()
    }
}

impl Display for TsOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TsOp::Undefined => "_Undefined_",
            TsOp::DescribeEndpoints => "DescribeEndpoints",
            TsOp::Query => "Query",
        };

        write!(f, "{}", s)
    }
}

impl TsOp {
    /// 检测一个操作是否是幂等的
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::DescribeEndpoints | Self::Query)
    }
}

/// The request to send to Timestream query service
#[derive(Debug, Clone, Default)]
pub struct TsRequest {
    operation: TsOp,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

/// 执行查询语句的抽象。读取数据和推断 schema 都只依赖这个 trait，测试中可以替换为脚本化的实现
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// 执行一次查询，返回一页结果
    async fn execute(&self, request: QueryRequest) -> UdqResult<QueryPage>;
}

pub trait RetryPolicy: std::fmt::Debug + Send + Sync {
    /// 是否需要重试。参数分别表示重试次数、操作和发生的错误
    fn should_retry(&self, retried: u32, op: TsOp, error: &UdqError) -> bool;

    /// 如果需要重试，重试之前等待的时间
    fn delay_ms(&self) -> u32;

    /// 每次操作都会克隆客户端，克隆出来的策略需要保留调用方的设置
    fn clone_box(&self) -> Box<dyn RetryPolicy>;
}

impl Clone for Box<dyn RetryPolicy> {
    fn clone(&self) -> Box<dyn RetryPolicy> {
        self.clone_box()
    }
}

/// 默认重试机制，最多重试 3 次（加上最开始的 1 次，总计就是发送 4 次请求）。
/// 两次重试之间休眠 500 毫秒。函数本身有调用超时，所以不能等太久
#[derive(Debug, Copy, Clone)]
pub struct DefaultRetryPolicy {
    pub max_retry_times: u32,
}

impl Default for DefaultRetryPolicy {
    fn default() -> Self {
        Self { max_retry_times: 3 }
    }
}

impl DefaultRetryPolicy {
    /// 无论是什么操作，只要是这些错误码，就重试
    const RETRY_NO_MATTER_ACTIONS_ERR_CODES: &[&'static str] = &["ThrottlingException", "RequestLimitExceeded"];

    // 仅针对幂等的操作，如果遇到这些错误码，重试
    const RETRY_FOR_IDEMPOTENT_ACTIONS_ERR_CODES: &[&'static str] = &["InternalServerException", "ServiceUnavailable"];

    fn should_retry_inner(&self, retried: u32, op: TsOp, error: &UdqError) -> bool {
        if retried >= self.max_retry_times {
            log::info!("max retry reached {} times for operation {} with error {}", self.max_retry_times, op, error);
            return false;
        }

        match error {
            // 网络请求错误，重试
            UdqError::ReqwestError(_) => true,

            // 5xx 的状态码 + 幂等操作，重试
            UdqError::StatusError(code, _) => code.is_server_error() && op.is_idempotent(),

            UdqError::ApiError(api_error) => {
                let code = api_error.code();
                Self::RETRY_NO_MATTER_ACTIONS_ERR_CODES.contains(&code)
                    || (op.is_idempotent() && Self::RETRY_FOR_IDEMPOTENT_ACTIONS_ERR_CODES.contains(&code))
            }

            _ => false,
        }
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn should_retry(&self, retried: u32, op: TsOp, error: &UdqError) -> bool {
        self.should_retry_inner(retried, op, error)
    }

    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(*self)
    }

    fn delay_ms(&self) -> u32 {
        500
    }
}

#[derive(Debug, Clone)]
pub struct TsClientOptions {
    pub timeout_ms: Option<u64>,
    pub retry_policy: Box<dyn RetryPolicy>,
}

impl TsClientOptions {
    pub fn new() -> Self {
        Self {
            retry_policy: Box::new(DefaultRetryPolicy::default()),
            timeout_ms: None,
        }
    }

    pub fn retry_policy_mut(&mut self) -> &mut Box<dyn RetryPolicy> {
        &mut self.retry_policy
    }
}

impl Default for TsClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct CachedEndpoint {
    address: String,
    expires_at: DateTime<Utc>,
}

/// Amazon Timestream query client
#[derive(Clone, Default)]
pub struct TimestreamClient {
    access_key_id: String,
    access_key_secret: String,
    session_token: Option<String>,
    region: String,

    /// 用于发现查询地址的入口，例如 `https://query.timestream.us-east-1.amazonaws.com`
    discovery_endpoint: String,

    /// 设置之后不再做地址发现，直接向此地址发送查询
    endpoint_override: Option<String>,

    http_client: reqwest::Client,
    options: TsClientOptions,
    endpoint_cache: Arc<Mutex<Option<CachedEndpoint>>>,
}

impl std::fmt::Debug for TimestreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestreamClient")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("discovery_endpoint", &self.discovery_endpoint)
            .field("endpoint_override", &self.endpoint_override)
            .field("http_client", &self.http_client)
            .field("options", &self.options)
            .finish()
    }
}

impl TimestreamClient {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();

        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            session_token: None,
            discovery_endpoint: format!("https://query.timestream.{}.amazonaws.com", region),
            region,
            endpoint_override: None,
            http_client: reqwest::Client::new(),
            options: TsClientOptions::default(),
            endpoint_cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Build a client from env values. The following env vars are required:
    ///
    /// - `AWS_ACCESS_KEY_ID`: The access key id.
    /// - `AWS_SECRET_ACCESS_KEY`: The access key secret
    /// - `AWS_REGION` or `AWS_DEFAULT_REGION`: e.g. `us-east-1`
    ///
    /// `AWS_SESSION_TOKEN` is picked up when present, which is always the case inside the function runtime.
    pub fn from_env() -> UdqResult<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").map_err(|_| UdqError::NotConfigured("env var AWS_ACCESS_KEY_ID is missing".to_string()))?;
        let access_key_secret =
            std::env::var("AWS_SECRET_ACCESS_KEY").map_err(|_| UdqError::NotConfigured("env var AWS_SECRET_ACCESS_KEY is missing".to_string()))?;
        let region = std::env::var("AWS_REGION")
            .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
            .map_err(|_| UdqError::NotConfigured("env var AWS_REGION is missing".to_string()))?;

        let mut client = Self::new(access_key_id, access_key_secret, region);
        client.session_token = std::env::var("AWS_SESSION_TOKEN").ok().filter(|s| !s.is_empty());

        Ok(client)
    }

    /// 设置临时凭证的 session token
    pub fn session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// 跳过地址发现，直接使用指定的查询地址。例如 `https://query-cell2.timestream.us-east-1.amazonaws.com`
    pub fn endpoint_override(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    pub fn options(mut self, options: TsClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn prepare_headers(&self, req: &mut TsRequest, host: &str, now: &DateTime<Utc>) {
        let headers = &mut req.headers;
        headers.insert("user-agent".to_string(), USER_AGENT.to_string());
        headers.insert("content-type".to_string(), CONTENT_TYPE.to_string());
        headers.insert("host".to_string(), host.to_string());
        headers.insert(HEADER_AMZ_DATE.to_string(), get_amz_date_time_string(now));
        headers.insert(HEADER_AMZ_TARGET.to_string(), format!("{}.{}", TARGET_PREFIX, req.operation));

        if let Some(s) = &self.session_token {
            headers.insert(HEADER_AMZ_SECURITY_TOKEN.to_string(), s.to_string());
        }
    }

    /// AWS Signature Version 4
    fn header_sign(&self, req: &mut TsRequest, host: &str, now: &DateTime<Utc>) {
        self.prepare_headers(req, host, now);

        let mut signed: Vec<(String, String)> = req
            .headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
            .filter(|(k, _)| k != "user-agent" && k != HEADER_AUTHORIZATION)
            .collect();
        signed.sort();

        let canonical_headers = signed.iter().map(|(k, v)| format!("{}:{}\n", k, v)).collect::<String>();
        let signed_headers = signed.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>().join(";");

        let canonical_request = format!("POST\n/\n\n{}\n{}\n{}", canonical_headers, signed_headers, sha256_hex(&req.body));
        log::debug!("canonical request: ({})", canonical_request);

        let date = get_amz_date_string(now);
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SIGNING_SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            get_amz_date_time_string(now),
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let k_date = hmac_sha256(format!("AWS4{}", self.access_key_secret).as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, SIGNING_SERVICE.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let sig = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        log::debug!("signature = {}", sig);

        req.headers.insert(
            HEADER_AUTHORIZATION.to_string(),
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                SIGNING_ALGORITHM, self.access_key_id, scope, signed_headers, sig
            ),
        );
    }

    /// 缓存中未过期的查询地址
    pub(crate) fn cached_endpoint(&self) -> Option<String> {
        let cache = self.endpoint_cache.lock().ok()?;
        cache.as_ref().filter(|c| c.expires_at > Utc::now()).map(|c| c.address.clone())
    }

    pub(crate) fn cache_endpoint(&self, address: &str, cache_period_in_minutes: i64) {
        if let Ok(mut cache) = self.endpoint_cache.lock() {
            *cache = Some(CachedEndpoint {
                address: address.to_string(),
                expires_at: Utc::now() + TimeDelta::minutes(cache_period_in_minutes),
            });
        }
    }

    /// 查询地址已经失效（`InvalidEndpointException` 或者 421）时清掉缓存，返回是否需要重新发现
    pub(crate) fn evict_endpoint(&self, error: &UdqError) -> bool {
        if self.endpoint_override.is_some() || !is_invalid_endpoint(error) {
            return false;
        }

        if let Ok(mut cache) = self.endpoint_cache.lock() {
            *cache = None;
        }

        true
    }

    /// 获取查询地址。优先使用缓存，过期之后重新发现
    async fn resolve_endpoint(&self) -> UdqResult<String> {
        if let Some(s) = &self.endpoint_override {
            return Ok(s.clone());
        }

        if let Some(address) = self.cached_endpoint() {
            return Ok(address);
        }

        let resp = self.describe_endpoints().send().await?;
        let endpoint = resp
            .endpoints
            .into_iter()
            .next()
            .ok_or_else(|| UdqError::ValidationFailed("timestream returned no query endpoint".to_string()))?;

        let address = format!("https://{}", endpoint.address);
        log::info!("discovered timestream query endpoint {} (cache {} minutes)", address, endpoint.cache_period_in_minutes);
        self.cache_endpoint(&address, endpoint.cache_period_in_minutes);

        Ok(address)
    }

    /// 发送请求到发现之后的查询地址。地址失效时重新发现一次再发送
    pub async fn send(&self, req: TsRequest) -> UdqResult<Response> {
        let endpoint = self.resolve_endpoint().await?;

        match self.send_to(&endpoint, req.clone()).await {
            Err(e) if self.evict_endpoint(&e) => {
                log::warn!("query endpoint {} is no longer valid, rediscover: {}", endpoint, e);
                let endpoint = self.resolve_endpoint().await?;
                self.send_to(&endpoint, req).await
            }
            result => result,
        }
    }

    pub(crate) async fn send_to(&self, endpoint: &str, req: TsRequest) -> UdqResult<Response> {
        let url = Url::parse(endpoint).map_err(|e| UdqError::ValidationFailed(format!("invalid endpoint {}: {}", endpoint, e)))?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{}:{}", h, p),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(UdqError::ValidationFailed(format!("endpoint has no host: {}", endpoint))),
        };

        let operation = req.operation;
        let request_body = Bytes::from(req.body.clone());
        let mut retried = 0u32;

        loop {
            // 每次重试都需要重新签名，签名中包含时间
            let mut signed_req = req.clone();
            self.header_sign(&mut signed_req, &host, &Utc::now());

            let mut header_map = HeaderMap::new();
            for (k, v) in &signed_req.headers {
                if k == "host" {
                    continue;
                }
                let name = HeaderName::from_str(k).map_err(|e| UdqError::ValidationFailed(format!("invalid header name {}: {}", k, e)))?;
                let value = HeaderValue::from_str(v).map_err(|e| UdqError::ValidationFailed(format!("invalid header value for {}: {}", k, e)))?;
                header_map.insert(name, value);
            }

            let mut request_builder = self
                .http_client
                .post(url.clone())
                .headers(header_map)
                .body(request_body.clone());

            // Handle per-request options
            if let Some(ms) = self.options.timeout_ms {
                request_builder = request_builder.timeout(Duration::from_millis(ms));
            }

            let e = match request_builder.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();

                    match serde_json::from_str::<ApiError>(&text) {
                        Ok(api_error) if !api_error.error_type.is_empty() => UdqError::ApiError(Box::new(api_error)),
                        _ => UdqError::StatusError(status, text),
                    }
                }
                Err(e) => UdqError::ReqwestError(e),
            };

            log::error!("api call failed, check retry against retry policy for operation {} and error {}", operation, e);
            let should_retry = self.options.retry_policy.should_retry(retried, operation, &e);
            log::info!("should retry {} for operation {} with error {}", should_retry, operation, e);

            if !should_retry {
                return Err(e);
            }

            let next_delay = self.options.retry_policy.delay_ms();
            log::info!("delay for {} ms to retry", next_delay);
            tokio::time::sleep(Duration::from_millis(next_delay as u64)).await;

            retried += 1;
        }
    }

    /// 发现查询服务的地址
    pub fn describe_endpoints(&self) -> DescribeEndpointsOperation {
        DescribeEndpointsOperation::new(self.clone(), &self.discovery_endpoint)
    }

    /// 执行查询语句
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> twinfleet_udq::UdqResult<()> {
    /// use twinfleet_udq::{query::QueryRequest, TimestreamClient};
    ///
    /// let client = TimestreamClient::from_env()?;
    /// let page = client
    ///     .query(QueryRequest::new("SELECT * FROM \"fw_ev_sim_db\".\"fw_ev_sim_table\" LIMIT 10").max_rows(10))
    ///     .send()
    ///     .await?;
    /// println!("{} rows", page.rows.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn query(&self, request: QueryRequest) -> QueryOperation {
        QueryOperation::new(self.clone(), request)
    }
}

fn is_invalid_endpoint(error: &UdqError) -> bool {
    match error {
        UdqError::ApiError(e) => e.code() == "InvalidEndpointException",
        UdqError::StatusError(code, _) => *code == StatusCode::MISDIRECTED_REQUEST,
        _ => false,
    }
}

#[async_trait]
impl QueryEngine for TimestreamClient {
    async fn execute(&self, request: QueryRequest) -> UdqResult<QueryPage> {
        self.query(request).send().await
    }
}
