mod json;
pub use json::*;
#[cfg(any(feature = "request", feature = "request-js"))]
mod request;
#[cfg(any(feature = "request", feature = "request-js"))]
pub use request::*;
