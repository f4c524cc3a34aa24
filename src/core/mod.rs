pub mod relay;
pub mod upstream;

pub use crate::domain::model::{ErrorBody, PriceQuote};
pub use crate::domain::ports::{ConfigProvider, PriceSource};
pub use crate::utils::error::{Result, UpstreamResult};
