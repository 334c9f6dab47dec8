//! UDQ 数据读取：把平台的属性查询翻译成 Timestream 查询，并把结果解码成平台的格式

mod decoder;
mod timestream_reader;
mod translator;

pub use decoder::*;
pub use timestream_reader::*;
pub use translator::*;

#[cfg(test)]
mod test_reader {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use crate::{
        config::ReaderConfig,
        error::{ApiError, UdqError},
        model::{ColumnInfo, ColumnType, Datum, QueryPage, Row, ScalarType},
        query::QueryRequest,
        test_util::{reader_columns, reader_row, setup, MockEngine},
        udq::{
            FilterOperator, FilterValue, OrderBy, PropertyFilter, PropertyQuery, PropertyReference, PropertyValue, TimeRange, UdqComponentTypeRequest,
            UdqContext, UdqEntityRequest,
        },
    };

    use super::{build_property_query, decode_row, decode_value, parse_row, QueryScope, ReferenceScope, TimestreamReader};

    const VEHICLE7_QUERY: &str = "SELECT vehicleName, campaignName, measure_name, time, measure_value::boolean, measure_value::double, \
                                  measure_value::varchar, measure_value::bigint FROM \"fw_ev_sim_db\".\"fw_ev_sim_table\" \
                                  WHERE time > from_iso8601_timestamp('2024-01-01T00:00:00Z') AND time <= from_iso8601_timestamp('2024-01-01T01:00:00Z') \
                                  AND vehicleName = 'Vehicle7' AND (measure_name = 'Vehicle.Speed') ORDER BY time ASC";

    fn config() -> ReaderConfig {
        ReaderConfig::new("fw_ev_sim_db", "fw_ev_sim_table")
    }

    fn one_hour() -> TimeRange {
        TimeRange::parse("2024-01-01T00:00:00Z", "2024-01-01T01:00:00Z").unwrap()
    }

    fn vehicle7_request(query: PropertyQuery) -> UdqEntityRequest {
        UdqEntityRequest::new("Vehicle7-entity", "EVDataComponent", query).udq_context(UdqContext::new().string_property("vehicleName", "Vehicle7"))
    }

    #[test]
    fn test_build_query() {
        let query = PropertyQuery::new(["Vehicle_Speed"], one_hour());
        let sql = build_property_query(&config(), QueryScope::Vehicle("Vehicle7"), &query).unwrap();
        assert_eq!(VEHICLE7_QUERY, sql);
    }

    #[test]
    fn test_build_query_with_filter_and_order() {
        let query = PropertyQuery::new(["Vehicle_Speed", "Vehicle_Powertrain_Battery_StateOfHealth"], one_hour())
            .property_filter(PropertyFilter::new("Vehicle_Speed", FilterOperator::GreaterThan, FilterValue::Double(10.5)))
            .order_by(OrderBy::Descending);

        let sql = build_property_query(&config(), QueryScope::Vehicle("Vehicle7"), &query).unwrap();

        assert!(sql.contains(
            "AND (measure_name = 'Vehicle.Speed' OR measure_name = 'Vehicle.Powertrain.Battery.StateOfHealth') \
             AND measure_name = 'Vehicle.Speed' AND measure_value::double > 10.5 ORDER BY time DESC"
        ));
    }

    #[test]
    fn test_build_query_time_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(500);
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();
        let query = PropertyQuery::new(["Vehicle_Speed"], TimeRange::new(start, end));

        let sql = build_property_query(&config(), QueryScope::Vehicle("Vehicle7"), &query).unwrap();

        // 不包含开始时间，包含结束时间
        assert!(sql.contains(
            "WHERE time > from_iso8601_timestamp('2024-01-01T00:00:00.500Z') AND time <= from_iso8601_timestamp('2024-01-01T00:00:01Z')"
        ));
    }

    #[test]
    fn test_build_query_without_vehicle() {
        let query = PropertyQuery::new(["Vehicle_Speed"], one_hour());
        let sql = build_property_query(&config(), QueryScope::AllVehicles, &query).unwrap();

        assert!(!sql.contains("vehicleName ="));
        assert!(sql.contains("from_iso8601_timestamp('2024-01-01T01:00:00Z') AND (measure_name = 'Vehicle.Speed') ORDER BY time ASC"));
    }

    #[test]
    fn test_build_query_hardening() {
        let cfg = config();

        let query = PropertyQuery::new(["Vehicle_Speed"], one_hour());
        let sql = build_property_query(&cfg, QueryScope::Vehicle("O'Brien"), &query).unwrap();
        assert!(sql.contains("AND vehicleName = 'O''Brien' AND"));

        let query = PropertyQuery::new(["x' OR '1'='1"], one_hour());
        assert!(matches!(
            build_property_query(&cfg, QueryScope::Vehicle("Vehicle7"), &query),
            Err(UdqError::ValidationFailed(_))
        ));

        let query = PropertyQuery::new(["Vehicle_Speed"], one_hour()).property_filter(PropertyFilter::new(
            "Speed) OR (1=1",
            FilterOperator::Equal,
            FilterValue::Integer(1),
        ));
        assert!(matches!(
            build_property_query(&cfg, QueryScope::Vehicle("Vehicle7"), &query),
            Err(UdqError::ValidationFailed(_))
        ));

        let query = PropertyQuery::new(Vec::<String>::new(), one_hour());
        assert!(matches!(
            build_property_query(&cfg, QueryScope::Vehicle("Vehicle7"), &query),
            Err(UdqError::ValidationFailed(_))
        ));

        let reversed = TimeRange::parse("2024-01-01T01:00:00Z", "2024-01-01T00:00:00Z").unwrap();
        let query = PropertyQuery::new(["Vehicle_Speed"], reversed);
        assert!(matches!(
            build_property_query(&cfg, QueryScope::Vehicle("Vehicle7"), &query),
            Err(UdqError::ValidationFailed(_))
        ));

        let query = PropertyQuery::new(["Vehicle_Speed"], one_hour());
        assert!(matches!(
            build_property_query(&ReaderConfig::default(), QueryScope::Vehicle("Vehicle7"), &query),
            Err(UdqError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_value_priority() {
        let columns = reader_columns();
        let decode = |values: [Option<&str>; 4]| {
            let row = reader_row("Vehicle7", "Vehicle.Speed", "2024-01-01 00:30:00.000000000", values);
            decode_value(&parse_row(&columns, &row).unwrap())
        };

        // varchar > double > bigint > boolean
        assert_eq!(PropertyValue::Double(3.5), decode([Some("true"), Some("3.5"), None, None]).unwrap());
        assert_eq!(PropertyValue::String("D".to_string()), decode([Some("true"), Some("3.5"), Some("D"), Some("7")]).unwrap());
        assert_eq!(PropertyValue::Double(3.5), decode([None, Some("3.5"), None, Some("7")]).unwrap());
        assert_eq!(PropertyValue::Double(7.0), decode([Some("false"), None, None, Some("7")]).unwrap());
    }

    #[test]
    fn test_boolean_coercion() {
        let columns = reader_columns();
        let decode = |b: &str| {
            let row = reader_row("Vehicle7", "Vehicle.Powertrain.Battery.FanRunning", "2024-01-01 00:30:00.000000000", [Some(b), None, None, None]);
            decode_value(&parse_row(&columns, &row).unwrap()).unwrap()
        };

        assert_eq!(PropertyValue::Double(1.0), decode("true"));
        assert_eq!(PropertyValue::Double(0.0), decode("false"));
        assert_eq!(PropertyValue::Double(0.0), decode("TRUE"));
        assert_eq!(PropertyValue::Double(0.0), decode("yes"));
    }

    #[test]
    fn test_decode_errors() {
        let columns = reader_columns();
        let scope = ReferenceScope::EntityComponent {
            entity_id: "e1",
            component_name: "c1",
        };

        let row = reader_row("Vehicle7", "Vehicle.Speed", "2024-01-01 00:30:00.000000000", [None, None, None, None]);
        assert!(matches!(decode_row(&columns, &row, scope), Err(UdqError::UnhandledRowType(_))));

        let row = Row::new([Datum::scalar("Vehicle7"), Datum::scalar("c"), Datum::scalar("Vehicle.Speed")]);
        assert!(matches!(
            decode_row(&columns, &row, scope),
            Err(UdqError::ColumnCountMismatch { columns: 8, data: 3 })
        ));

        let row = reader_row("Vehicle7", "Vehicle.Speed", "2024-01-01 00:30:00.000000000", [None, Some("fast"), None, None]);
        assert!(matches!(decode_row(&columns, &row, scope), Err(UdqError::InvalidValue(_))));

        let array_columns = vec![ColumnInfo::new(
            "arr",
            ColumnType {
                array_column_info: Some(Box::new(ColumnInfo::scalar("item", ScalarType::Double))),
                ..Default::default()
            },
        )];
        let row = Row::new([Datum {
            array_value: Some(vec![Datum::scalar("1.0")]),
            ..Default::default()
        }]);
        assert!(matches!(parse_row(&array_columns, &row), Err(UdqError::UnsupportedColumnType(_))));

        // null 的非标量列不会报错
        let row = Row::new([Datum::null()]);
        assert_eq!(Some(&None), parse_row(&array_columns, &row).unwrap().get("arr"));
    }

    async fn test_entity_query_end_to_end_impl() {
        setup();

        let engine = MockEngine::new().page(QueryPage::new(reader_columns()).row(reader_row(
            "Vehicle7",
            "Vehicle.Speed",
            "2024-01-01 00:30:00.000000000",
            [None, Some("42.0"), None, None],
        )));

        let reader = TimestreamReader::new(engine, config());
        let resp = reader.entity_query(&vehicle7_request(PropertyQuery::new(["Vehicle_Speed"], one_hour()))).await.unwrap();

        assert_eq!(1, resp.rows.len());
        assert_eq!(None, resp.next_token);

        let row = &resp.rows[0];
        assert_eq!(PropertyValue::Double(42.0), row.value);
        assert_eq!("2024-01-01T00:30:00.000000000Z", row.timestamp);
        assert_eq!(
            PropertyReference::entity_component("Vehicle7-entity", "EVDataComponent", "Vehicle_Speed"),
            row.entity_property_reference
        );

        assert_eq!(vec![QueryRequest::new(VEHICLE7_QUERY)], reader.engine_requests());
    }

    #[tokio::test]
    async fn test_entity_query_end_to_end() {
        test_entity_query_end_to_end_impl().await;
    }

    async fn test_entity_query_missing_context_impl() {
        setup();

        let reader = TimestreamReader::new(MockEngine::new(), config());
        let request = UdqEntityRequest::new("e1", "c1", PropertyQuery::new(["Vehicle_Speed"], one_hour()));

        let e = reader.entity_query(&request).await.unwrap_err();
        assert!(matches!(e, UdqError::MissingContext(_)));
        assert!(reader.engine_requests().is_empty());
    }

    #[tokio::test]
    async fn test_entity_query_missing_context() {
        test_entity_query_missing_context_impl().await;
    }

    async fn test_component_type_query_impl() {
        setup();

        let engine = MockEngine::new().page(
            QueryPage::new(reader_columns())
                .row(reader_row("Vehicle7", "Vehicle.Speed", "2024-01-01 00:30:00.000000000", [None, Some("42.0"), None, None]))
                .row(reader_row("Vehicle9", "Vehicle.Speed", "2024-01-01 00:30:01.000000000", [None, Some("17.5"), None, None]))
                .next_token("more"),
        );

        let reader = TimestreamReader::new(engine, config());
        let request = UdqComponentTypeRequest::new("com.user.evtwindata", PropertyQuery::new(["Vehicle_Speed"], one_hour()).max_rows(2));
        let resp = reader.component_type_query(&request).await.unwrap();

        assert_eq!(Some("more".to_string()), resp.next_token);
        assert_eq!(
            PropertyReference::external_id("vehicleName", "Vehicle9", "Vehicle_Speed"),
            resp.rows[1].entity_property_reference
        );

        let requests = reader.engine_requests();
        assert_eq!(1, requests.len());
        assert_eq!(Some(2), requests[0].max_rows);
        assert!(!requests[0].query_string.contains("vehicleName ="));
    }

    #[tokio::test]
    async fn test_component_type_query() {
        test_component_type_query_impl().await;
    }

    async fn test_process_query_impl() {
        setup();

        let engine = MockEngine::new().page(
            QueryPage::new(reader_columns())
                .row(reader_row("Vehicle7", "Vehicle.Speed", "2024-01-01 00:59:00.000000000", [None, Some("50"), None, None]))
                .row(reader_row(
                    "Vehicle7",
                    "Vehicle.Powertrain.Battery.FanRunning",
                    "2024-01-01 00:58:00.000000000",
                    [Some("true"), None, None, None],
                ))
                .row(reader_row("Vehicle7", "Vehicle.Speed", "2024-01-01 00:57:00.000000000", [None, None, None, Some("48")]))
                .next_token("t2"),
        );

        let reader = TimestreamReader::new(engine, config());

        let event = json!({
            "workspaceId": "EVFleetWorkspace",
            "entityId": "Vehicle7-entity",
            "componentName": "EVDataComponent",
            "selectedProperties": ["Vehicle_Speed", "Vehicle_Powertrain_Battery_FanRunning"],
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": "2024-01-01T01:00:00Z",
            "orderByTime": "DESCENDING",
            "nextToken": "t1",
            "maxResults": 10,
            "properties": {"vehicleName": {"value": {"stringValue": "Vehicle7"}}}
        });

        let resp = reader.process_query(event).await.unwrap();

        assert_eq!(
            json!({
                "propertyValues": [
                    {
                        "entityPropertyReference": {"entityId": "Vehicle7-entity", "componentName": "EVDataComponent", "propertyName": "Vehicle_Speed"},
                        "values": [
                            {"time": "2024-01-01T00:59:00.000000000Z", "value": {"doubleValue": 50.0}},
                            {"time": "2024-01-01T00:57:00.000000000Z", "value": {"doubleValue": 48.0}}
                        ]
                    },
                    {
                        "entityPropertyReference": {"entityId": "Vehicle7-entity", "componentName": "EVDataComponent", "propertyName": "Vehicle_Powertrain_Battery_FanRunning"},
                        "values": [
                            {"time": "2024-01-01T00:58:00.000000000Z", "value": {"doubleValue": 1.0}}
                        ]
                    }
                ],
                "nextToken": "t2"
            }),
            resp
        );

        let requests = reader.engine_requests();
        assert_eq!(1, requests.len());
        assert_eq!(Some("t1".to_string()), requests[0].next_token);
        assert_eq!(Some(10), requests[0].max_rows);
        assert!(requests[0].query_string.ends_with("ORDER BY time DESC"));
    }

    #[tokio::test]
    async fn test_process_query() {
        test_process_query_impl().await;
    }

    async fn test_process_query_engine_error_impl() {
        setup();

        let engine = MockEngine::new().error(UdqError::ApiError(Box::new(ApiError {
            error_type: "com.amazonaws.timestream.v20181101#ThrottlingException".to_string(),
            message: Some("Rate exceeded".to_string()),
        })));
        let reader = TimestreamReader::new(engine, config());

        let event = json!({
            "entityId": "Vehicle7-entity",
            "componentName": "EVDataComponent",
            "selectedProperties": ["Vehicle_Speed"],
            "startTime": "2024-01-01T00:00:00Z",
            "endTime": "2024-01-01T01:00:00Z",
            "udqContext": {"properties": {"vehicleName": {"value": {"stringValue": "Vehicle7"}}}}
        });

        let e = reader.process_query(event).await.unwrap_err();
        assert!(e.is_query_execution());
        assert_eq!("QueryExecutionError", e.error_type());
    }

    #[tokio::test]
    async fn test_process_query_engine_error() {
        test_process_query_engine_error_impl().await;
    }

    impl TimestreamReader<MockEngine> {
        fn engine_requests(&self) -> Vec<QueryRequest> {
            self.engine().requests()
        }
    }
}
