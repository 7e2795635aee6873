//! 공통 타입 정의.

pub mod calendar;
pub mod source;

pub use calendar::*;
pub use source::*;
