//! 데이터 소스 Provider 모듈.
//!
//! ## 시세 어댑터
//! - `ListedMarketAdapter`: 상장 시장(TWSE) `STOCK_DAY`, 헤더 이름 기반 필드 맵
//! - `EmergingMarketAdapter`: 흥궤 시장(TPEx) `aaData`, 위치 기반 필드 맵
//!
//! ## 기타
//! - `HttpTransport`: reqwest 기반 전송 계층 (타임아웃 필수)
//! - `HoldingsClient`: ETF 보유 종목 프록시

pub mod holdings;
pub mod tpex;
pub mod transport;
pub mod twse;

pub use holdings::{top_holdings, EtfHolding, HoldingsClient};
pub use tpex::EmergingMarketAdapter;
pub use transport::HttpTransport;
pub use twse::ListedMarketAdapter;

use serde::de::DeserializeOwned;
use twquote_core::{FetchError, FetchResult, RawQuoteRow};

/// 마크업 응답을 거른 뒤 JSON 역직렬화.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> FetchResult<T> {
    transport::reject_markup(body)?;
    serde_json::from_str(body.trim_start_matches('\u{feff}'))
        .map_err(|e| FetchError::MalformedPayload(format!("JSON 파싱 실패: {}", e)))
}

/// JSON 셀 값을 텍스트로 변환 (숫자/문자열 혼재 대응).
pub(crate) fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn cells_to_row(cells: &[serde_json::Value]) -> RawQuoteRow {
    RawQuoteRow::new(cells.iter().map(value_to_text).collect())
}
