//! 도메인 모델.
//!
//! 원시 행 → 정규화 시세 → 종목 데이터셋 → 통합 리포트 순으로 흐릅니다.

pub mod dataset;
pub mod quote;
pub mod source_adapter;

pub use dataset::*;
pub use quote::*;
pub use source_adapter::*;
