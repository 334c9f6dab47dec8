use crate::{
    config::ReaderConfig,
    error::UdqError,
    udq::{
        format_iso8601,
        rules::{quote_literal, to_measure_name, validate_property_name},
        PropertyFilter, PropertyQuery, TimeRange,
    },
    UdqResult,
};

/// 数据读取查询固定返回的列。所有类型的度量值列都会返回，解码时再判断哪一列有值
pub const READER_PROJECTION: &str =
    "vehicleName, campaignName, measure_name, time, measure_value::boolean, measure_value::double, measure_value::varchar, measure_value::bigint";

/// 查询的实体范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope<'a> {
    /// 单个车辆
    Vehicle(&'a str),

    /// 组件类型查询，不限定车辆
    AllVehicles,
}

fn checked_measure_name(property_name: &str) -> UdqResult<String> {
    if !validate_property_name(property_name) {
        return Err(UdqError::ValidationFailed(format!(
            "invalid property name: {:?}. only [A-Za-z0-9_] is allowed",
            property_name
        )));
    }

    Ok(to_measure_name(property_name))
}

/// `time > from_iso8601_timestamp('<start>') AND time <= from_iso8601_timestamp('<end>')`
pub fn time_bound_clause(range: &TimeRange) -> UdqResult<String> {
    range.validate()?;

    Ok(format!(
        "time > from_iso8601_timestamp('{}') AND time <= from_iso8601_timestamp('{}')",
        format_iso8601(&range.start),
        format_iso8601(&range.end)
    ))
}

/// `measure_name = 'a' OR measure_name = 'b'`
pub fn measure_name_clause(selected_properties: &[String]) -> UdqResult<String> {
    if selected_properties.is_empty() {
        return Err(UdqError::ValidationFailed("selectedProperties can not be empty".to_string()));
    }

    let parts = selected_properties
        .iter()
        .map(|p| checked_measure_name(p).map(|m| format!("measure_name = {}", quote_literal(&m))))
        .collect::<UdqResult<Vec<_>>>()?;

    Ok(parts.join(" OR "))
}

/// `AND measure_name = '<name>' AND measure_value::double <op> <value>`
pub fn filter_clause(filter: Option<&PropertyFilter>) -> UdqResult<String> {
    let Some(filter) = filter else {
        return Ok(String::new());
    };

    let measure_name = checked_measure_name(&filter.property_name)?;

    Ok(format!(
        "AND measure_name = {} AND measure_value::double {} {}",
        quote_literal(&measure_name),
        filter.operator.as_sql(),
        filter.value.to_sql_literal()
    ))
}

/// 生成读取属性历史数据的查询语句
///
/// ```text
/// SELECT <projection> FROM "db"."table"
///   WHERE time > from_iso8601_timestamp('<start>') AND time <= from_iso8601_timestamp('<end>')
///   [AND vehicleName = '<vehicle>'] AND (<measure names>) [<filter>]
///   ORDER BY time ASC|DESC
/// ```
///
/// 不设置 `LIMIT`，由翻页处理行数。
pub fn build_property_query(config: &ReaderConfig, scope: QueryScope<'_>, query: &PropertyQuery) -> UdqResult<String> {
    let table = config.table_ref()?;

    let mut clauses = vec![
        format!("SELECT {} FROM {}", READER_PROJECTION, table),
        format!("WHERE {}", time_bound_clause(&query.time_range)?),
    ];

    if let QueryScope::Vehicle(vehicle_name) = scope {
        clauses.push(format!("AND vehicleName = {}", quote_literal(vehicle_name)));
    }

    clauses.push(format!("AND ({})", measure_name_clause(&query.selected_properties)?));

    let filter = filter_clause(query.property_filter.as_ref())?;
    if !filter.is_empty() {
        clauses.push(filter);
    }

    clauses.push(format!("ORDER BY time {}", query.order_by.as_sql()));

    Ok(clauses.join(" "))
}
