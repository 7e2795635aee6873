//! 흥궤(興櫃) 시장(TPEx) 일별 시세 어댑터.
//!
//! 응답은 라벨 없는 위치 배열(`aaData`)이며, 조회 월은 민국 기년(`113/01`)으로 지정합니다.
//!
//! | 인덱스 | 의미 |
//! |--------|------|
//! | 0 | 날짜 (민국 기년) |
//! | 1 | 거래량 |
//! | 4 | 최고가 |
//! | 5 | 최저가 |
//! | 6 | 평균가 (종가로 사용) |
//! | 7 | 전일 대비 |
//!
//! 흥궤 시장은 시가를 제공하지 않으므로 `open`은 항상 누락입니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use twquote_core::{
    roc_month_token, DateCalendar, FetchError, FetchResult, FieldMap, QuoteField, QuoteTransport,
    RawBatch, SourceAdapter, SourceKind, UpstreamStatus,
};

use super::{cells_to_row, parse_json};

/// API 경로.
const EM_DAILY_PATH: &str = "/web/emergingstock/historical/daily/EMDaily_result.php";

/// `aaData` 컬럼 위치.
pub const EMERGING_FIELD_INDICES: [(QuoteField, usize); 6] = [
    (QuoteField::Date, 0),
    (QuoteField::Volume, 1),
    (QuoteField::High, 4),
    (QuoteField::Low, 5),
    (QuoteField::Close, 6),
    (QuoteField::Change, 7),
];

#[derive(Debug, Deserialize)]
struct EmergingDailyResponse {
    #[serde(rename = "aaData", default)]
    aa_data: Option<Vec<Vec<serde_json::Value>>>,
}

/// 흥궤 시장 어댑터.
#[derive(Clone)]
pub struct EmergingMarketAdapter {
    transport: Arc<dyn QuoteTransport>,
    base_url: String,
}

impl EmergingMarketAdapter {
    pub fn new(transport: Arc<dyn QuoteTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 응답 본문을 원시 배치로 변환.
    ///
    /// `aaData`가 없거나 비어 있으면 네트워크 실패와 구분되는 `UpstreamStatus::NoData`입니다.
    pub fn parse_payload(body: &str) -> FetchResult<RawBatch> {
        let payload: EmergingDailyResponse = parse_json(body)?;

        let data = payload.aa_data.unwrap_or_default();
        if data.is_empty() {
            return Err(FetchError::UpstreamStatus(UpstreamStatus::NoData));
        }

        let rows = data.iter().map(|cells| cells_to_row(cells)).collect();
        Ok(RawBatch::new(
            SourceKind::Emerging,
            DateCalendar::Roc,
            FieldMap::positional(EMERGING_FIELD_INDICES),
            rows,
        ))
    }
}

#[async_trait]
impl SourceAdapter for EmergingMarketAdapter {
    fn source(&self) -> SourceKind {
        SourceKind::Emerging
    }

    async fn fetch_raw(&self, ticker_id: &str, as_of: NaiveDate) -> FetchResult<RawBatch> {
        let url = format!("{}{}", self.base_url, EM_DAILY_PATH);
        let query = [
            ("l", "zh-tw".to_string()),
            ("d", roc_month_token(as_of)),
            ("stk_no", ticker_id.to_string()),
        ];

        let body = self.transport.get_text(&url, &query).await?;
        let batch = Self::parse_payload(&body)?;
        debug!(ticker = ticker_id, rows = batch.rows.len(), "흥궤 시장 원시 시세 수신");
        Ok(batch)
    }
}
