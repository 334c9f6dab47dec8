//! 组件 schema 初始化：根据已有数据推断属性定义

mod default_schema;
mod schema_init;

pub use default_schema::*;
pub use schema_init::*;
