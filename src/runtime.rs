//! 函数运行时。通过 Lambda Runtime API 循环获取调用事件，交给处理器，再把结果或者错误发送回去

use async_trait::async_trait;
use serde::Serialize;

use crate::{error::UdqError, reader::TimestreamReader, schema::SchemaInitializer, QueryEngine, UdqResult};

pub const ENV_RUNTIME_API: &str = "AWS_LAMBDA_RUNTIME_API";

const RUNTIME_API_VERSION: &str = "2018-06-01";
const HEADER_REQUEST_ID: &str = "lambda-runtime-aws-request-id";
const HEADER_FUNCTION_ERROR_TYPE: &str = "lambda-runtime-function-error-type";

/// 处理一次函数调用
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: serde_json::Value) -> UdqResult<serde_json::Value>;
}

#[async_trait]
impl<E> EventHandler for TimestreamReader<E>
where
    E: QueryEngine,
{
    async fn handle(&self, event: serde_json::Value) -> UdqResult<serde_json::Value> {
        self.process_query(event).await
    }
}

#[async_trait]
impl<E> EventHandler for SchemaInitializer<E>
where
    E: QueryEngine,
{
    async fn handle(&self, event: serde_json::Value) -> UdqResult<serde_json::Value> {
        self.initialize(event).await
    }
}

/// 报告给运行时的错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationError {
    pub error_message: String,
    pub error_type: String,
}

impl From<&UdqError> for InvocationError {
    fn from(e: &UdqError) -> Self {
        Self {
            error_message: e.to_string(),
            error_type: e.error_type().to_string(),
        }
    }
}

/// 一次函数调用。事件在处理时才解析，解析失败会报告到这次调用上
#[derive(Debug, Clone)]
pub struct Invocation {
    pub request_id: String,
    pub payload: bytes::Bytes,
}

impl Invocation {
    pub fn new(request_id: impl Into<String>, payload: impl Into<bytes::Bytes>) -> Self {
        Self {
            request_id: request_id.into(),
            payload: payload.into(),
        }
    }

    pub fn event(&self) -> UdqResult<serde_json::Value> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl RuntimeClient {
    /// `runtime_api` 形如 `127.0.0.1:9001`
    pub fn new(runtime_api: &str) -> Self {
        Self {
            base_url: format!("http://{}/{}/runtime", runtime_api, RUNTIME_API_VERSION),
            // 运行时接口在本机，不走代理
            http_client: reqwest::Client::builder().no_proxy().build().unwrap_or_default(),
        }
    }

    pub fn from_env() -> UdqResult<Self> {
        let api = std::env::var(ENV_RUNTIME_API).map_err(|_| UdqError::NotConfigured(format!("{} is not set", ENV_RUNTIME_API)))?;
        Ok(Self::new(&api))
    }

    pub fn next_invocation_url(&self) -> String {
        format!("{}/invocation/next", self.base_url)
    }

    pub fn response_url(&self, request_id: &str) -> String {
        format!("{}/invocation/{}/response", self.base_url, request_id)
    }

    pub fn error_url(&self, request_id: &str) -> String {
        format!("{}/invocation/{}/error", self.base_url, request_id)
    }

    async fn check(response: reqwest::Response) -> UdqResult<bytes::Bytes> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UdqError::StatusError(status, text));
        }

        Ok(response.bytes().await?)
    }

    /// 阻塞等待下一次调用
    pub async fn next_invocation(&self) -> UdqResult<Invocation> {
        let response = self.http_client.get(self.next_invocation_url()).send().await?;

        let request_id = response
            .headers()
            .get(HEADER_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let payload = Self::check(response).await?;
        let request_id = request_id.ok_or_else(|| UdqError::ValidationFailed(format!("runtime response has no {} header", HEADER_REQUEST_ID)))?;

        Ok(Invocation::new(request_id, payload))
    }

    pub async fn send_response(&self, request_id: &str, result: &serde_json::Value) -> UdqResult<()> {
        let response = self
            .http_client
            .post(self.response_url(request_id))
            .header("content-type", "application/json")
            .body(serde_json::to_vec(result)?)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    pub async fn send_error(&self, request_id: &str, error: &InvocationError) -> UdqResult<()> {
        let response = self
            .http_client
            .post(self.error_url(request_id))
            .header("content-type", "application/json")
            .header(HEADER_FUNCTION_ERROR_TYPE, error.error_type.as_str())
            .body(serde_json::to_vec(error)?)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

/// 处理一次调用并把结果发送给运行时
pub async fn handle_invocation<H>(client: &RuntimeClient, handler: &H, invocation: Invocation) -> UdqResult<()>
where
    H: EventHandler + ?Sized,
{
    let request_id = invocation.request_id.as_str();
    log::info!("handle invocation {}", request_id);

    let result = match invocation.event() {
        Ok(event) => handler.handle(event).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(result) => client.send_response(request_id, &result).await,
        Err(e) => {
            log::error!("invocation {} failed: {}", request_id, e);
            client.send_error(request_id, &InvocationError::from(&e)).await
        }
    }
}

/// 安装日志。级别取自 `RUST_LOG`，默认 `INFO`，使用 UTC 时间
pub fn init_logger() -> Result<(), log::SetLoggerError> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .with_utc_timestamps()
        .init()
}

/// 运行时主循环。只有和运行时本身通信失败时才会返回
pub async fn run<H>(handler: H) -> UdqResult<()>
where
    H: EventHandler,
{
    let client = RuntimeClient::from_env()?;
    log::info!("function runtime started, polling {}", client.next_invocation_url());

    loop {
        let invocation = client.next_invocation().await?;
        handle_invocation(&client, &handler, invocation).await?;
    }
}
