use std::{
    collections::VecDeque,
    sync::{Mutex, Once},
};

use async_trait::async_trait;

use crate::{
    error::UdqError,
    model::{ColumnInfo, Datum, QueryPage, Row, ScalarType},
    query::QueryRequest,
    QueryEngine, UdqResult,
};

static INIT: Once = Once::new();

pub(crate) fn setup() {
    INIT.call_once(|| {
        simple_logger::init_with_level(log::Level::Debug).unwrap();
        dotenvy::dotenv().ok();
    });
}

/// 按顺序回放预先准备好的结果，并记录收到的每个查询
#[derive(Debug, Default)]
pub(crate) struct MockEngine {
    responses: Mutex<VecDeque<UdqResult<QueryPage>>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, page: QueryPage) -> Self {
        self.responses.lock().unwrap().push_back(Ok(page));
        self
    }

    pub(crate) fn error(self, error: UdqError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryEngine for MockEngine {
    async fn execute(&self, request: QueryRequest) -> UdqResult<QueryPage> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UdqError::ValidationFailed("mock engine has no more responses".to_string())))
    }
}

/// 数据读取查询返回的列
pub(crate) fn reader_columns() -> Vec<ColumnInfo> {
    vec![
        ColumnInfo::scalar("vehicleName", ScalarType::Varchar),
        ColumnInfo::scalar("campaignName", ScalarType::Varchar),
        ColumnInfo::scalar("measure_name", ScalarType::Varchar),
        ColumnInfo::scalar("time", ScalarType::Timestamp),
        ColumnInfo::scalar("measure_value::boolean", ScalarType::Boolean),
        ColumnInfo::scalar("measure_value::double", ScalarType::Double),
        ColumnInfo::scalar("measure_value::varchar", ScalarType::Varchar),
        ColumnInfo::scalar("measure_value::bigint", ScalarType::Bigint),
    ]
}

/// 按 [`reader_columns`] 的顺序构造一行。`values` 依次是 boolean, double, varchar, bigint
pub(crate) fn reader_row(vehicle: &str, measure: &str, time: &str, values: [Option<&str>; 4]) -> Row {
    let mut data = vec![
        Datum::scalar(vehicle),
        Datum::scalar("ev_campaign"),
        Datum::scalar(measure),
        Datum::scalar(time),
    ];

    data.extend(values.into_iter().map(|v| match v {
        Some(s) => Datum::scalar(s),
        None => Datum::null(),
    }));

    Row::new(data)
}
