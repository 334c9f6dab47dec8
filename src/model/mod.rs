//! 查询引擎（Timestream）返回结果的数据模型

mod endpoint;
mod page;

pub use endpoint::*;
pub use page::*;
