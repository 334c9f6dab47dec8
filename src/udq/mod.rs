//! 数字孪生平台 UDQ（Unified Data Query）协议的数据模型

mod request;
mod response;
pub mod rules;

pub use request::*;
pub use response::*;
