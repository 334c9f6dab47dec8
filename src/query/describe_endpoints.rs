use crate::{add_per_request_options, model::DescribeEndpointsResponse, TimestreamClient, TsOp, TsRequest, UdqResult};

/// 发现查询服务的可用地址
///
/// 官方文档：<https://docs.aws.amazon.com/timestream/latest/developerguide/API_query_DescribeEndpoints.html>
#[derive(Debug, Default, Clone)]
pub struct DescribeEndpointsOperation {
    client: TimestreamClient,
    discovery_endpoint: String,
}

add_per_request_options!(DescribeEndpointsOperation);

impl DescribeEndpointsOperation {
    pub(crate) fn new(client: TimestreamClient, discovery_endpoint: &str) -> Self {
        Self {
            client,
            discovery_endpoint: discovery_endpoint.to_string(),
        }
    }

    pub async fn send(self) -> UdqResult<DescribeEndpointsResponse> {
        let Self { client, discovery_endpoint } = self;

        let req = TsRequest {
            operation: TsOp::DescribeEndpoints,
            body: b"{}".to_vec(),
            ..Default::default()
        };

        let resp = client.send_to(&discovery_endpoint, req).await?;

        Ok(serde_json::from_slice(&resp.bytes().await?)?)
    }
}
