use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::UdqError, UdqResult};

/// 上下文中标识车辆的属性名
pub const VEHICLE_NAME_PROPERTY: &str = "vehicleName";

/// 查询结果按时间排序的方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderBy {
    #[default]
    Ascending,
    Descending,
}

impl OrderBy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// 平台的属性值。只会设置其中一个字段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub string_value: Option<String>,
    pub double_value: Option<f64>,
    pub boolean_value: Option<bool>,
    pub integer_value: Option<i64>,
    pub long_value: Option<i64>,
}

impl DataValue {
    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Default::default()
        }
    }
}

/// 上下文中的一个属性。只关心它的值，定义部分忽略
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContextProperty {
    #[serde(default)]
    pub value: Option<DataValue>,
}

/// 请求携带的上下文，包含实体组件上已经解析好的属性值
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UdqContext {
    #[serde(default)]
    pub properties: HashMap<String, ContextProperty>,
}

impl UdqContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置一个字符串属性
    pub fn string_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(
            name.into(),
            ContextProperty {
                value: Some(DataValue::from_string(value)),
            },
        );
        self
    }

    /// 读取字符串属性，空字符串视为不存在
    pub fn get_string_property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|p| p.value.as_ref())
            .and_then(|v| v.string_value.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// 解析车辆标识：`properties.vehicleName.value.stringValue`
    pub fn vehicle_name(&self) -> UdqResult<&str> {
        self.get_string_property(VEHICLE_NAME_PROPERTY)
            .ok_or_else(|| UdqError::MissingContext("udq_context.properties.vehicleName.value.stringValue".to_string()))
    }
}

/// 过滤条件的值。只支持数值和布尔值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterValue {
    Double(f64),
    Integer(i64),
    Boolean(bool),
}

impl FilterValue {
    /// 渲染成 SQL 字面量
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Double(d) => d.to_string(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
        }
    }
}

impl TryFrom<DataValue> for FilterValue {
    type Error = UdqError;

    fn try_from(value: DataValue) -> Result<Self, Self::Error> {
        let DataValue {
            string_value,
            double_value,
            boolean_value,
            integer_value,
            long_value,
        } = value;

        match (double_value, boolean_value, integer_value.or(long_value)) {
            (Some(d), _, _) if d.is_finite() => Ok(Self::Double(d)),
            (Some(d), _, _) => Err(UdqError::ValidationFailed(format!("filter value must be finite, got {}", d))),
            (None, Some(b), _) => Ok(Self::Boolean(b)),
            (None, None, Some(n)) => Ok(Self::Integer(n)),
            (None, None, None) if string_value.is_some() => Err(UdqError::ValidationFailed("string filter values are not supported".to_string())),
            (None, None, None) => Err(UdqError::ValidationFailed("filter value is empty".to_string())),
        }
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl FilterOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
        }
    }
}

impl std::str::FromStr for FilterOperator {
    type Err = UdqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Self::Equal),
            "!=" | "<>" => Ok(Self::NotEqual),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterEqual),
            _ => Err(UdqError::ValidationFailed(format!("unsupported filter operator: {}", s))),
        }
    }
}

/// 对某个度量值的过滤条件
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    /// 平台属性名（使用 `_` 分隔）
    pub property_name: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl PropertyFilter {
    pub fn new(property_name: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            property_name: property_name.into(),
            operator,
            value,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPropertyFilter {
    property_name: String,
    operator: String,
    #[serde(default)]
    value: DataValue,
}

impl RawPropertyFilter {
    fn into_filter(self) -> UdqResult<PropertyFilter> {
        let Self { property_name, operator, value } = self;

        Ok(PropertyFilter {
            property_name,
            operator: operator.parse()?,
            value: value.try_into()?,
        })
    }
}

/// 查询的时间范围：不包含开始时间，包含结束时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 解析 ISO-8601 格式的时间
    pub fn parse(start: &str, end: &str) -> UdqResult<Self> {
        Ok(Self::new(parse_iso8601(start)?, parse_iso8601(end)?))
    }

    pub(crate) fn validate(&self) -> UdqResult<()> {
        if self.start > self.end {
            return Err(UdqError::ValidationFailed(format!(
                "start time {} is after end time {}",
                format_iso8601(&self.start),
                format_iso8601(&self.end)
            )));
        }
        Ok(())
    }
}

pub fn parse_iso8601(s: &str) -> UdqResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| UdqError::ValidationFailed(format!("invalid ISO-8601 time {}: {}", s, e)))
}

/// 例如 `2024-01-01T00:00:00Z`，有小数秒时按需输出 3/6/9 位
pub fn format_iso8601(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// 读取属性历史数据的查询条件，两种请求共用
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyQuery {
    /// 要读取的平台属性名（使用 `_` 分隔）
    pub selected_properties: Vec<String>,

    /// 最多一个过滤条件
    pub property_filter: Option<PropertyFilter>,

    pub time_range: TimeRange,

    pub order_by: OrderBy,

    /// 翻页 token
    pub next_token: Option<String>,

    /// 最多返回的行数
    pub max_rows: Option<u32>,
}

impl PropertyQuery {
    pub fn new(selected_properties: impl IntoIterator<Item = impl Into<String>>, time_range: TimeRange) -> Self {
        Self {
            selected_properties: selected_properties.into_iter().map(Into::into).collect(),
            property_filter: None,
            time_range,
            order_by: OrderBy::Ascending,
            next_token: None,
            max_rows: None,
        }
    }

    pub fn property_filter(mut self, filter: PropertyFilter) -> Self {
        self.property_filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }
}

/// 单个实体组件的属性查询
#[derive(Debug, Clone, PartialEq)]
pub struct UdqEntityRequest {
    pub workspace_id: Option<String>,
    pub entity_id: String,
    pub component_name: String,
    pub udq_context: UdqContext,
    pub query: PropertyQuery,
}

impl UdqEntityRequest {
    pub fn new(entity_id: impl Into<String>, component_name: impl Into<String>, query: PropertyQuery) -> Self {
        Self {
            workspace_id: None,
            entity_id: entity_id.into(),
            component_name: component_name.into(),
            udq_context: UdqContext::default(),
            query,
        }
    }

    pub fn udq_context(mut self, context: UdqContext) -> Self {
        self.udq_context = context;
        self
    }
}

/// 按组件类型跨实体的属性查询
#[derive(Debug, Clone, PartialEq)]
pub struct UdqComponentTypeRequest {
    pub workspace_id: Option<String>,
    pub component_type_id: String,
    pub query: PropertyQuery,
}

impl UdqComponentTypeRequest {
    pub fn new(component_type_id: impl Into<String>, query: PropertyQuery) -> Self {
        Self {
            workspace_id: None,
            component_type_id: component_type_id.into(),
            query,
        }
    }
}

/// 数据读取函数收到的请求
#[derive(Debug, Clone, PartialEq)]
pub enum UdqRequest {
    Entity(UdqEntityRequest),
    ComponentType(UdqComponentTypeRequest),
}

/// 平台调用数据读取函数时传入的原始事件
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UdqEvent {
    workspace_id: Option<String>,
    entity_id: Option<String>,
    component_name: Option<String>,
    component_type_id: Option<String>,
    selected_properties: Option<Vec<String>>,
    property_filters: Option<Vec<RawPropertyFilter>>,
    start_time: Option<String>,
    end_time: Option<String>,
    start_date_time: Option<i64>,
    end_date_time: Option<i64>,
    #[serde(alias = "orderBy")]
    order_by_time: Option<OrderBy>,
    next_token: Option<String>,
    max_results: Option<u32>,
    udq_context: Option<UdqContext>,
    properties: Option<HashMap<String, ContextProperty>>,
}

fn resolve_time(iso: Option<&str>, epoch_seconds: Option<i64>, field: &str) -> UdqResult<DateTime<Utc>> {
    match (iso, epoch_seconds) {
        (Some(s), _) => parse_iso8601(s),
        (None, Some(secs)) => DateTime::from_timestamp(secs, 0).ok_or_else(|| UdqError::ValidationFailed(format!("invalid {}: {}", field, secs))),
        (None, None) => Err(UdqError::ValidationFailed(format!("{} is required", field))),
    }
}

impl UdqEvent {
    fn into_property_query(self) -> UdqResult<PropertyQuery> {
        let start = resolve_time(self.start_time.as_deref(), self.start_date_time, "startTime")?;
        let end = resolve_time(self.end_time.as_deref(), self.end_date_time, "endTime")?;

        let mut filters = self.property_filters.unwrap_or_default();
        if filters.len() > 1 {
            return Err(UdqError::ValidationFailed(format!("at most one property filter is supported, got {}", filters.len())));
        }

        Ok(PropertyQuery {
            selected_properties: self.selected_properties.unwrap_or_default(),
            property_filter: filters.pop().map(RawPropertyFilter::into_filter).transpose()?,
            time_range: TimeRange::new(start, end),
            order_by: self.order_by_time.unwrap_or_default(),
            next_token: self.next_token.filter(|s| !s.is_empty()),
            max_rows: self.max_results.filter(|n| *n > 0),
        })
    }
}

impl UdqRequest {
    /// 从平台传入的 JSON 事件解析请求。带 `entityId` 的是单实体请求，带 `componentTypeId` 的是组件类型请求
    pub fn from_event(event: serde_json::Value) -> UdqResult<Self> {
        let mut event: UdqEvent = serde_json::from_value(event)?;

        let workspace_id = event.workspace_id.take();

        if let Some(entity_id) = event.entity_id.take() {
            let component_name = event
                .component_name
                .take()
                .ok_or_else(|| UdqError::ValidationFailed("componentName is required for entity queries".to_string()))?;

            let udq_context = match (event.udq_context.take(), event.properties.take()) {
                (Some(ctx), _) => ctx,
                (None, Some(properties)) => UdqContext { properties },
                (None, None) => UdqContext::default(),
            };

            return Ok(Self::Entity(UdqEntityRequest {
                workspace_id,
                entity_id,
                component_name,
                udq_context,
                query: event.into_property_query()?,
            }));
        }

        if let Some(component_type_id) = event.component_type_id.take() {
            return Ok(Self::ComponentType(UdqComponentTypeRequest {
                workspace_id,
                component_type_id,
                query: event.into_property_query()?,
            }));
        }

        Err(UdqError::ValidationFailed("request has neither entityId nor componentTypeId".to_string()))
    }
}
