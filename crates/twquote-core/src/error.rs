//! 시세 파이프라인의 에러 타입.
//!
//! - [`FetchError`]: 어댑터 단위 (종목별) 에러
//! - [`NormalizeError`]: 행 단위 에러, Reconciler 밖으로 전파되지 않음

use serde::Serialize;
use thiserror::Error;

/// 업스트림이 스스로 보고한 상태 이상.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UpstreamStatus {
    /// 상태 플래그(`stat`) 자체가 없음
    Missing,
    /// 상태 플래그가 "OK"가 아님
    NotOk(String),
    /// 정상 응답이지만 데이터 배열이 비어 있거나 없음 (거래 없음)
    NoData,
}

impl std::fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "상태 플래그 없음"),
            Self::NotOk(stat) => write!(f, "상태 플래그 '{}'", stat),
            Self::NoData => write!(f, "데이터 없음"),
        }
    }
}

/// 데이터 소스 조회 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// 네트워크/연결/타임아웃 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 업스트림 상태 플래그 이상
    #[error("업스트림 상태 에러: {0}")]
    UpstreamStatus(UpstreamStatus),

    /// 기대한 구조로 파싱할 수 없는 응답 (HTML 에러 페이지 등)
    #[error("잘못된 응답 형식: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 재시도 자체는 호출자(캐시/스케줄러)의 몫입니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }

    /// "거래 없음" 계열 에러인지 확인.
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchError::UpstreamStatus(UpstreamStatus::NoData))
    }
}

/// 행 정규화 에러.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizeError {
    /// 날짜 필드를 해석할 수 없음
    #[error("날짜 파싱 실패: '{raw}'")]
    UnparsableDate { raw: String },

    /// 필드 맵에서 날짜 컬럼을 찾을 수 없음
    #[error("날짜 컬럼 없음")]
    MissingDateColumn,
}

/// 시세 조회 결과 타입.
pub type FetchResult<T> = Result<T, FetchError>;
