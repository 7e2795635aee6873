//! 시세 데이터 수집 및 정규화.
//!
//! 이 crate는 다음을 제공합니다:
//! - 상장(TWSE) / 흥궤(TPEx) 시장 소스 어댑터와 HTTP 전송 계층
//! - 원시 행 정규화 (숫자 문자열 정리, 민국 기년 날짜 변환)
//! - 여러 종목을 하나의 리포트로 통합하는 Reconciler
//! - CSV / 문서용 표 내보내기
//! - 호출자가 관리하는 TTL 데이터셋 캐시
//! - ETF 보유 종목 조회

pub mod cache;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod provider;
pub mod reconciler;

pub use cache::{CacheKey, DatasetCache};
pub use error::{ExportError, Result};
pub use normalizer::{clean_numeric, parse_source_date, NormalizedBatch, RowNormalizer};
pub use provider::{
    EmergingMarketAdapter, EtfHolding, HoldingsClient, HttpTransport, ListedMarketAdapter,
};
pub use reconciler::{Reconciler, ReconcilerBuilder};
