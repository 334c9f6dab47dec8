use crate::{
    config::ReaderConfig,
    query::fetch_page,
    udq::{PropertyValuesResponse, QueryResponse, UdqComponentTypeRequest, UdqEntityRequest, UdqRequest},
    QueryEngine, UdqResult,
};

use super::{build_property_query, decode_page, QueryScope, ReferenceScope};

/// Timestream 上的 UDQ 数据读取实现。支持单实体查询和组件类型查询
#[derive(Debug, Clone)]
pub struct TimestreamReader<E> {
    engine: E,
    config: ReaderConfig,
}

impl<E> TimestreamReader<E>
where
    E: QueryEngine,
{
    pub fn new(engine: E, config: ReaderConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// 单实体查询。实体和组件已经由平台解析为外部标识，通过上下文中的 `vehicleName` 传入
    pub async fn entity_query(&self, request: &UdqEntityRequest) -> UdqResult<QueryResponse> {
        log::info!(
            "entity query: entity = {}, component = {}, properties = {:?}",
            request.entity_id,
            request.component_name,
            request.query.selected_properties
        );

        let vehicle_name = request.udq_context.vehicle_name()?;
        let query_string = build_property_query(&self.config, QueryScope::Vehicle(vehicle_name), &request.query)?;
        log::debug!("query string: {}", query_string);

        let page = fetch_page(&self.engine, &query_string, request.query.next_token.as_deref(), request.query.max_rows).await?;

        decode_page(
            page,
            ReferenceScope::EntityComponent {
                entity_id: &request.entity_id,
                component_name: &request.component_name,
            },
        )
    }

    /// 组件类型查询。不限定车辆，结果通过 `vehicleName` 外部标识引用
    pub async fn component_type_query(&self, request: &UdqComponentTypeRequest) -> UdqResult<QueryResponse> {
        log::info!(
            "component type query: component type = {}, properties = {:?}",
            request.component_type_id,
            request.query.selected_properties
        );

        let query_string = build_property_query(&self.config, QueryScope::AllVehicles, &request.query)?;
        log::debug!("query string: {}", query_string);

        let page = fetch_page(&self.engine, &query_string, request.query.next_token.as_deref(), request.query.max_rows).await?;

        decode_page(page, ReferenceScope::ExternalId)
    }

    /// 解析平台传入的事件并执行查询，返回平台期望的按属性分组的格式
    pub async fn process_query(&self, event: serde_json::Value) -> UdqResult<serde_json::Value> {
        let response = match UdqRequest::from_event(event)? {
            UdqRequest::Entity(req) => self.entity_query(&req).await?,
            UdqRequest::ComponentType(req) => self.component_type_query(&req).await?,
        };

        log::info!("query returned {} rows, has next token: {}", response.rows.len(), response.next_token.is_some());

        Ok(serde_json::to_value(PropertyValuesResponse::from(response))?)
    }
}
