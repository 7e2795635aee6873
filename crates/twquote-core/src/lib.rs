//! # TWQuote Core
//!
//! 대만 상장/흥궤(興櫃) 종목 일별 시세 정규화 파이프라인의 핵심 도메인 모델을 제공합니다.
//!
//! 이 크레이트는 I/O 없이 다음을 정의합니다:
//! - 원시 시세 행과 정규화된 시세 레코드
//! - 종목별 데이터셋과 통합 리포트
//! - 데이터 소스 어댑터 / 전송 계층 trait
//! - 에러 분류 체계
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
