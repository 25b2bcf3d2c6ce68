// crates/core/src/lib.rs
pub mod reply;
pub mod request;
pub mod result;

pub use reply::*;
pub use request::*;
pub use result::*;
