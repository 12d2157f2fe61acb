mod delay;
mod headers;

pub use delay::retry_delay;
pub use headers::parse_retry_after;
