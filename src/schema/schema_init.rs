use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    config::ReaderConfig,
    error::UdqError,
    model::{ColumnInfo, Row},
    query::fetch_page,
    reader::{parse_row, COLUMN_BOOLEAN, COLUMN_DOUBLE, COLUMN_MEASURE_NAME},
    udq::{
        rules::{canonicalize_property_name, quote_literal},
        UdqContext,
    },
    QueryEngine, UdqResult,
};

use super::DEFAULT_PROPERTIES;

/// 推断 schema 时最多取样的行数
pub const SCHEMA_SAMPLE_SIZE: u32 = 100;

/// 平台支持的属性数据类型，这里只会用到其中三种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Double,
    Boolean,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataTypeDefinition {
    #[serde(rename = "type")]
    pub data_type: DataType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub data_type: DataTypeDefinition,
    pub is_time_series: bool,

    /// 只有默认 schema 会设置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_imported: Option<bool>,
}

/// 一个属性的定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertySchemaEntry {
    pub definition: PropertyDefinition,
}

impl PropertySchemaEntry {
    /// 从数据中推断出的时间序列属性
    pub fn time_series(data_type: DataType) -> Self {
        Self {
            definition: PropertyDefinition {
                data_type: DataTypeDefinition { data_type },
                is_time_series: true,
                is_imported: None,
            },
        }
    }

    /// 默认 schema 中的时间序列属性
    pub fn imported_time_series(data_type: DataType) -> Self {
        let mut entry = Self::time_series(data_type);
        entry.definition.is_imported = Some(true);
        entry
    }

    pub fn data_type(&self) -> DataType {
        self.definition.data_type.data_type
    }
}

/// 返回给平台的属性 schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaResponse {
    pub properties: BTreeMap<String, PropertySchemaEntry>,
}

impl SchemaResponse {
    /// 固定的默认 schema
    pub fn default_schema() -> Self {
        Self {
            properties: DEFAULT_PROPERTIES
                .iter()
                .map(|(name, data_type)| (name.to_string(), PropertySchemaEntry::imported_time_series(*data_type)))
                .collect(),
        }
    }
}

/// 推断单行的属性名和类型。度量值都为空的行返回 `None`
pub fn infer_property(columns: &[ColumnInfo], row: &Row) -> UdqResult<Option<(String, DataType)>> {
    let values = parse_row(columns, row)?;

    let measure_name = values
        .get(COLUMN_MEASURE_NAME)
        .and_then(|v| v.as_deref())
        .ok_or_else(|| UdqError::MissingColumn(COLUMN_MEASURE_NAME.to_string()))?;

    let is_set = |column: &str| values.get(column).is_some_and(|v| v.is_some());

    let data_type = if is_set(COLUMN_DOUBLE) {
        DataType::Double
    } else if is_set(COLUMN_BOOLEAN) {
        DataType::Boolean
    } else {
        log::warn!("measure {} has neither double nor boolean value, skipped", measure_name);
        return Ok(None);
    };

    Ok(Some((canonicalize_property_name(measure_name), data_type)))
}

/// 根据车辆最近的数据推断组件的属性 schema。
/// 查询失败或者没有数据时返回默认 schema，不会让实体创建失败
#[derive(Debug, Clone)]
pub struct SchemaInitializer<E> {
    engine: E,
    config: ReaderConfig,
}

impl<E> SchemaInitializer<E>
where
    E: QueryEngine,
{
    pub fn new(engine: E, config: ReaderConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// 按时间倒序取样车辆最近的数据
    pub fn sample_query(&self, vehicle_name: &str) -> UdqResult<String> {
        Ok(format!(
            "SELECT DISTINCT vehicleName, measure_name, measure_value::double, measure_value::boolean, time \
             FROM {} WHERE vehicleName = {} ORDER BY time DESC LIMIT {}",
            self.config.table_ref()?,
            quote_literal(vehicle_name),
            SCHEMA_SAMPLE_SIZE
        ))
    }

    async fn try_discover(&self, vehicle_name: &str) -> UdqResult<BTreeMap<String, PropertySchemaEntry>> {
        let query_string = self.sample_query(vehicle_name)?;
        log::debug!("schema query string: {}", query_string);

        let page = fetch_page(&self.engine, &query_string, None, None).await?;
        let mut properties = BTreeMap::new();

        for row in &page.rows {
            match infer_property(&page.column_info, row) {
                Ok(Some((name, data_type))) => {
                    properties.insert(name, PropertySchemaEntry::time_series(data_type));
                }
                Ok(None) => {}
                Err(e) => log::warn!("skip row that can not be decoded: {}", e),
            }
        }

        Ok(properties)
    }

    /// 推断 schema。失败时不会返回错误
    pub async fn discover(&self, vehicle_name: &str) -> SchemaResponse {
        log::info!("discover schema for vehicle: {}", vehicle_name);

        match self.try_discover(vehicle_name).await {
            Ok(properties) if !properties.is_empty() => SchemaResponse { properties },
            Ok(_) => {
                log::info!("no rows for vehicle {}, using default schema", vehicle_name);
                SchemaResponse::default_schema()
            }
            Err(e) => {
                log::info!("schema query failed: {}, using default schema", e);
                SchemaResponse::default_schema()
            }
        }
    }

    /// 处理平台传入的事件：`{"properties": {"vehicleName": {"value": {"stringValue": "..."}}}}`
    pub async fn initialize(&self, event: serde_json::Value) -> UdqResult<serde_json::Value> {
        let context: UdqContext = serde_json::from_value(event)?;
        let vehicle_name = context.vehicle_name()?;

        let schema = self.discover(vehicle_name).await;

        Ok(serde_json::to_value(schema)?)
    }
}
