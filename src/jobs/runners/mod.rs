//! Built-in task runners

mod constant;
mod http_get;
mod json_parse;
mod multiply;
mod noop;

pub use constant::ConstantRunner;
pub use http_get::HttpGetRunner;
pub use json_parse::JsonParseRunner;
pub use multiply::MultiplyRunner;
pub use noop::NoopRunner;
