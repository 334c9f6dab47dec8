use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// 平台对一个属性数据流的寻址方式
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PropertyReference {
    /// 实体 + 组件 + 属性
    EntityComponent {
        #[serde(rename = "entityId")]
        entity_id: String,

        #[serde(rename = "componentName")]
        component_name: String,

        #[serde(rename = "propertyName")]
        property_name: String,
    },

    /// 外部标识 + 属性，用于组件类型查询
    ExternalId {
        #[serde(rename = "externalIdProperty")]
        external_id_property: BTreeMap<String, String>,

        #[serde(rename = "propertyName")]
        property_name: String,
    },
}

impl PropertyReference {
    pub fn entity_component(entity_id: impl Into<String>, component_name: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self::EntityComponent {
            entity_id: entity_id.into(),
            component_name: component_name.into(),
            property_name: property_name.into(),
        }
    }

    pub fn external_id(id_property: impl Into<String>, id_value: impl Into<String>, property_name: impl Into<String>) -> Self {
        Self::ExternalId {
            external_id_property: BTreeMap::from([(id_property.into(), id_value.into())]),
            property_name: property_name.into(),
        }
    }

    pub fn property_name(&self) -> &str {
        match self {
            Self::EntityComponent { property_name, .. } | Self::ExternalId { property_name, .. } => property_name,
        }
    }
}

/// 解码之后的值。数值统一为双精度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyValue {
    #[serde(rename = "doubleValue")]
    Double(f64),

    #[serde(rename = "stringValue")]
    String(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::String(_) => None,
        }
    }
}

/// 解码之后的一条观测数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRow {
    pub entity_property_reference: PropertyReference,

    /// ISO-8601 UTC 时间，保留引擎返回的小数秒精度
    pub timestamp: String,

    pub value: PropertyValue,
}

/// 属性查询的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub rows: Vec<CanonicalRow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyValueEntry {
    pub time: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValueHistory {
    pub entity_property_reference: PropertyReference,
    pub values: Vec<PropertyValueEntry>,
}

/// 平台期望的响应格式：按属性分组的时间序列
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValuesResponse {
    pub property_values: Vec<PropertyValueHistory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl From<QueryResponse> for PropertyValuesResponse {
    /// 按引用分组，分组的顺序是每个引用第一次出现的顺序，组内保持原有顺序
    fn from(value: QueryResponse) -> Self {
        let QueryResponse { rows, next_token } = value;

        let mut index: HashMap<PropertyReference, usize> = HashMap::new();
        let mut property_values: Vec<PropertyValueHistory> = vec![];

        for row in rows {
            let CanonicalRow {
                entity_property_reference,
                timestamp,
                value,
            } = row;

            let entry = PropertyValueEntry { time: timestamp, value };

            match index.get(&entity_property_reference) {
                Some(&i) => property_values[i].values.push(entry),
                None => {
                    index.insert(entity_property_reference.clone(), property_values.len());
                    property_values.push(PropertyValueHistory {
                        entity_property_reference,
                        values: vec![entry],
                    });
                }
            }
        }

        Self { property_values, next_token }
    }
}
