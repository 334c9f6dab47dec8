use serde::Deserialize;

/// 查询服务的一个可用地址
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    /// 不带协议的主机名，例如 `query-cell2.timestream.us-east-1.amazonaws.com`
    pub address: String,

    /// 地址可以缓存的时间，单位为分钟
    pub cache_period_in_minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeEndpointsResponse {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}
