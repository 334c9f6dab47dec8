use serde::Deserialize;

/// 标量列的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalarType {
    Varchar,
    Boolean,
    Bigint,
    Double,
    Timestamp,
    Date,
    Time,
    IntervalDayToSecond,
    IntervalYearToMonth,
    Integer,

    #[serde(other)]
    Unknown,
}

/// 列的类型。四种形态只会出现一种
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnType {
    pub scalar_type: Option<ScalarType>,
    pub array_column_info: Option<Box<ColumnInfo>>,
    pub time_series_measure_value_column_info: Option<Box<ColumnInfo>>,
    pub row_column_info: Option<Vec<ColumnInfo>>,
}

impl ColumnType {
    pub fn scalar(scalar_type: ScalarType) -> Self {
        Self {
            scalar_type: Some(scalar_type),
            ..Default::default()
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar_type.is_some()
    }

    /// 用于错误信息中的类型描述
    pub fn describe(&self) -> &'static str {
        if self.scalar_type.is_some() {
            "ScalarType"
        } else if self.array_column_info.is_some() {
            "ArrayColumnInfo"
        } else if self.time_series_measure_value_column_info.is_some() {
            "TimeSeriesMeasureValueColumnInfo"
        } else if self.row_column_info.is_some() {
            "RowColumnInfo"
        } else {
            "Empty"
        }
    }
}

/// 结果集中一列的定义
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnInfo {
    /// 列名。嵌套类型的列可能没有名字
    #[serde(default)]
    pub name: Option<String>,

    pub r#type: ColumnType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: Some(name.into()),
            r#type: column_type,
        }
    }

    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self::new(name, ColumnType::scalar(scalar_type))
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// 单元格数据
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Datum {
    pub scalar_value: Option<String>,
    pub null_value: Option<bool>,
    pub array_value: Option<Vec<Datum>>,
    pub time_series_value: Option<Vec<serde_json::Value>>,
    pub row_value: Option<Row>,
}

impl Datum {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self {
            scalar_value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn null() -> Self {
        Self {
            null_value: Some(true),
            ..Default::default()
        }
    }

    pub fn is_null(&self) -> bool {
        self.null_value.unwrap_or(false)
    }
}

/// 一行数据，按位置和 [`ColumnInfo`] 对应
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Row {
    #[serde(default)]
    pub data: Vec<Datum>,
}

impl Row {
    pub fn new(data: impl IntoIterator<Item = Datum>) -> Self {
        Self {
            data: data.into_iter().collect(),
        }
    }
}

/// 查询引擎返回的一页结果
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryPage {
    #[serde(default)]
    pub query_id: Option<String>,

    #[serde(default)]
    pub column_info: Vec<ColumnInfo>,

    #[serde(default)]
    pub rows: Vec<Row>,

    /// 仅在可能还有更多数据时出现
    #[serde(default)]
    pub next_token: Option<String>,
}

impl QueryPage {
    pub fn new(column_info: Vec<ColumnInfo>) -> Self {
        Self {
            column_info,
            ..Default::default()
        }
    }

    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    pub fn next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }
}
