//! 查询引擎的操作：地址发现、执行查询以及翻页

mod describe_endpoints;
mod paginate;
mod query;

pub use describe_endpoints::*;
pub use paginate::*;
pub use query::*;
