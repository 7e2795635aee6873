//! 데이터 소스 어댑터 추상화.
//!
//! 어댑터는 소스별 원시 스키마를 알고, 전송 계층은 "URL에서 텍스트 가져오기"만 담당합니다.
//! 정규화 로직은 [`FieldMap`]만 보고 동작하므로 실제 네트워크 없이 테스트할 수 있습니다.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::quote::{QuoteField, RawQuoteRow};
use crate::error::FetchResult;
use crate::types::{DateCalendar, SourceKind};

// =============================================================================
// 필드 맵
// =============================================================================

/// 원시 행에서 정규 필드를 찾는 방법.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMap {
    /// 헤더 이름으로 찾기 (상장 시장: `fields` 배열 제공)
    Named {
        /// 응답에 포함된 컬럼 헤더
        header: Vec<String>,
        /// 필드별 헤더 라벨
        labels: Vec<(QuoteField, String)>,
    },
    /// 고정 인덱스로 찾기 (흥궤 시장: 라벨 없는 배열)
    Positional(Vec<(QuoteField, usize)>),
}

/// 필드별로 해석된 컬럼 인덱스.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedFields {
    indices: [Option<usize>; QuoteField::COUNT],
}

impl ResolvedFields {
    /// 필드의 컬럼 인덱스.
    pub fn index_of(&self, field: QuoteField) -> Option<usize> {
        self.indices[field.ordinal()]
    }

    fn set(&mut self, field: QuoteField, index: usize) {
        self.indices[field.ordinal()] = Some(index);
    }
}

impl FieldMap {
    /// 헤더 라벨 기반 필드 맵.
    pub fn named<L, S>(header: Vec<String>, labels: L) -> Self
    where
        L: IntoIterator<Item = (QuoteField, S)>,
        S: Into<String>,
    {
        Self::Named {
            header,
            labels: labels.into_iter().map(|(f, l)| (f, l.into())).collect(),
        }
    }

    /// 인덱스 기반 필드 맵.
    pub fn positional(indices: impl IntoIterator<Item = (QuoteField, usize)>) -> Self {
        Self::Positional(indices.into_iter().collect())
    }

    /// 필드 맵을 컬럼 인덱스로 해석.
    ///
    /// 이름 기반은 정확히 일치하는 헤더를 먼저 찾고, 없으면 라벨을 포함하는 헤더를 찾습니다.
    /// 찾지 못한 필드는 `None`으로 남습니다.
    pub fn resolve(&self) -> ResolvedFields {
        let mut resolved = ResolvedFields::default();
        match self {
            FieldMap::Named { header, labels } => {
                for (field, label) in labels {
                    let label = label.trim();
                    let position = header
                        .iter()
                        .position(|h| h.trim() == label)
                        .or_else(|| header.iter().position(|h| h.contains(label)));
                    if let Some(index) = position {
                        resolved.set(*field, index);
                    }
                }
            }
            FieldMap::Positional(indices) => {
                for (field, index) in indices {
                    resolved.set(*field, *index);
                }
            }
        }
        resolved
    }
}

// =============================================================================
// 원시 배치
// =============================================================================

/// 한 번의 조회로 얻은 원시 행 묶음.
#[derive(Debug, Clone)]
pub struct RawBatch {
    /// 데이터 소스
    pub source: SourceKind,
    /// 날짜 셀의 달력
    pub calendar: DateCalendar,
    /// 필드 맵
    pub field_map: FieldMap,
    /// 원시 행
    pub rows: Vec<RawQuoteRow>,
}

impl RawBatch {
    pub fn new(
        source: SourceKind,
        calendar: DateCalendar,
        field_map: FieldMap,
        rows: Vec<RawQuoteRow>,
    ) -> Self {
        Self {
            source,
            calendar,
            field_map,
            rows,
        }
    }
}

// =============================================================================
// Traits
// =============================================================================

/// 텍스트 응답을 가져오는 전송 계층.
///
/// 구현체는 반드시 타임아웃을 가져야 하며, 연결/타임아웃 실패는
/// `FetchError::Network`로 보고합니다.
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    /// GET 요청 후 본문 텍스트 반환.
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> FetchResult<String>;
}

/// 소스별 원시 시세 어댑터.
///
/// 상태를 갖지 않으며 재시도하지 않습니다.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// 담당 소스.
    fn source(&self) -> SourceKind;

    /// `as_of`가 속한 기간의 원시 시세 조회.
    ///
    /// # Errors
    ///
    /// - `FetchError::Network`: 전송 계층 실패
    /// - `FetchError::UpstreamStatus`: 응답의 상태 플래그 이상 또는 데이터 없음
    /// - `FetchError::MalformedPayload`: HTML 페이지 등 구조 불일치
    async fn fetch_raw(&self, ticker_id: &str, as_of: NaiveDate) -> FetchResult<RawBatch>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        ["日期", "成交股數", "開盤價", "收盤價(元)"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_named_resolution() {
        let map = FieldMap::named(
            header(),
            [
                (QuoteField::Date, "日期"),
                (QuoteField::Open, "開盤價"),
                (QuoteField::Close, "收盤價"),
                (QuoteField::High, "最高價"),
            ],
        );
        let resolved = map.resolve();
        assert_eq!(resolved.index_of(QuoteField::Date), Some(0));
        assert_eq!(resolved.index_of(QuoteField::Open), Some(2));
        assert_eq!(resolved.index_of(QuoteField::Close), Some(3));
        assert_eq!(resolved.index_of(QuoteField::High), None);
    }

    #[test]
    fn test_positional_resolution() {
        let map = FieldMap::positional([(QuoteField::Date, 0), (QuoteField::Close, 6)]);
        let resolved = map.resolve();
        assert_eq!(resolved.index_of(QuoteField::Close), Some(6));
        assert_eq!(resolved.index_of(QuoteField::Open), None);
    }
}
