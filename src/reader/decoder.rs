use std::collections::HashMap;

use crate::{
    error::UdqError,
    model::{ColumnInfo, QueryPage, Row},
    udq::{rules::to_property_name, CanonicalRow, PropertyReference, PropertyValue, QueryResponse, VEHICLE_NAME_PROPERTY},
    UdqResult,
};

pub const COLUMN_MEASURE_NAME: &str = "measure_name";
pub const COLUMN_TIME: &str = "time";
pub const COLUMN_VARCHAR: &str = "measure_value::varchar";
pub const COLUMN_DOUBLE: &str = "measure_value::double";
pub const COLUMN_BIGINT: &str = "measure_value::bigint";
pub const COLUMN_BOOLEAN: &str = "measure_value::boolean";

/// 一行数据中多个度量值列同时有值时，按这个顺序选择第一个
pub const VALUE_COLUMN_PRIORITY: [&str; 4] = [COLUMN_VARCHAR, COLUMN_DOUBLE, COLUMN_BIGINT, COLUMN_BOOLEAN];

/// 列名到值的映射，`None` 表示 null
pub type RowValues = HashMap<String, Option<String>>;

/// 决定结果行的属性引用如何生成
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScope<'a> {
    /// 使用请求中的实体和组件
    EntityComponent { entity_id: &'a str, component_name: &'a str },

    /// 使用行中的 `vehicleName` 作为外部标识
    ExternalId,
}

/// 按位置把列定义和数据对应起来。只支持标量列
pub fn parse_row(columns: &[ColumnInfo], row: &Row) -> UdqResult<RowValues> {
    if columns.len() != row.data.len() {
        return Err(UdqError::ColumnCountMismatch {
            columns: columns.len(),
            data: row.data.len(),
        });
    }

    let mut values = RowValues::with_capacity(columns.len());

    for (info, datum) in columns.iter().zip(row.data.iter()) {
        if datum.is_null() {
            values.insert(info.name().to_string(), None);
            continue;
        }

        if !info.r#type.is_scalar() {
            return Err(UdqError::UnsupportedColumnType(format!("{}: {}", info.name(), info.r#type.describe())));
        }

        values.insert(info.name().to_string(), datum.scalar_value.clone());
    }

    Ok(values)
}

fn non_null<'a>(values: &'a RowValues, column: &str) -> Option<&'a str> {
    values.get(column).and_then(|v| v.as_deref())
}

fn parse_f64(column: &str, s: &str) -> UdqResult<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| UdqError::InvalidValue(format!("{} = {:?}: {}", column, s, e)))
}

/// 取出度量值。
///
/// - 字符串原样返回
/// - 双精度和整数转换为双精度
/// - 布尔值转换为 `1.0` / `0.0`，只有 `"true"` 视为真
pub fn decode_value(values: &RowValues) -> UdqResult<PropertyValue> {
    let Some((column, raw)) = VALUE_COLUMN_PRIORITY.iter().find_map(|c| non_null(values, c).map(|v| (*c, v))) else {
        let mut names = values.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        return Err(UdqError::UnhandledRowType(format!("no measure value in columns [{}]", names.join(", "))));
    };

    match column {
        COLUMN_VARCHAR => Ok(PropertyValue::String(raw.to_string())),
        COLUMN_DOUBLE | COLUMN_BIGINT => parse_f64(column, raw).map(PropertyValue::Double),
        _ => Ok(PropertyValue::Double(if raw == "true" { 1.0 } else { 0.0 })),
    }
}

/// `2024-01-01 00:30:00.000000000` -> `2024-01-01T00:30:00.000000000Z`
pub fn decode_timestamp(raw: &str) -> String {
    format!("{}Z", raw.replacen(' ', "T", 1))
}

fn required<'a>(values: &'a RowValues, column: &str) -> UdqResult<&'a str> {
    non_null(values, column).ok_or_else(|| UdqError::MissingColumn(column.to_string()))
}

/// 把一行数据解码为 [`CanonicalRow`]
pub fn decode_row(columns: &[ColumnInfo], row: &Row, scope: ReferenceScope<'_>) -> UdqResult<CanonicalRow> {
    let values = parse_row(columns, row)?;

    let property_name = to_property_name(required(&values, COLUMN_MEASURE_NAME)?);
    let timestamp = decode_timestamp(required(&values, COLUMN_TIME)?);
    let value = decode_value(&values)?;

    let entity_property_reference = match scope {
        ReferenceScope::EntityComponent { entity_id, component_name } => PropertyReference::entity_component(entity_id, component_name, property_name),
        ReferenceScope::ExternalId => PropertyReference::external_id(VEHICLE_NAME_PROPERTY, required(&values, VEHICLE_NAME_PROPERTY)?, property_name),
    };

    Ok(CanonicalRow {
        entity_property_reference,
        timestamp,
        value,
    })
}

/// 解码一页结果，保持引擎返回的顺序，并带上引擎返回的翻页 token
pub fn decode_page(page: QueryPage, scope: ReferenceScope<'_>) -> UdqResult<QueryResponse> {
    let QueryPage {
        column_info, rows, next_token, ..
    } = page;

    let rows = rows.iter().map(|row| decode_row(&column_info, row, scope)).collect::<UdqResult<Vec<_>>>()?;

    Ok(QueryResponse { rows, next_token })
}
