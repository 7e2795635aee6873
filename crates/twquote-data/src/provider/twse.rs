//! 상장 시장(TWSE) 일별 시세 어댑터.
//!
//! `STOCK_DAY` API는 월 단위로 종목의 일별 시세를 반환합니다.
//!
//! ```json
//! {
//!   "stat": "OK",
//!   "fields": ["日期","成交股數","成交金額","開盤價","最高價","最低價","收盤價","漲跌價差","成交筆數"],
//!   "data": [["113/01/02","26,059,058","15,501,012,382","590.00","593.00","589.00","593.00","+0.00","20,386"]]
//! }
//! ```
//!
//! `stat`이 없거나 "OK"가 아니면 빈 데이터가 아니라 실패로 취급합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use twquote_core::{
    month_start, DateCalendar, FetchError, FetchResult, FieldMap, QuoteField, QuoteTransport,
    RawBatch, RawQuoteRow, SourceAdapter, SourceKind, UpstreamStatus,
};

use super::{cells_to_row, parse_json};

/// API 경로.
const STOCK_DAY_PATH: &str = "/rwd/zh/afterTrading/STOCK_DAY";

/// 정규 필드별 헤더 라벨.
const FIELD_LABELS: [(QuoteField, &str); 7] = [
    (QuoteField::Date, "日期"),
    (QuoteField::Volume, "成交股數"),
    (QuoteField::Open, "開盤價"),
    (QuoteField::High, "最高價"),
    (QuoteField::Low, "最低價"),
    (QuoteField::Close, "收盤價"),
    (QuoteField::Change, "漲跌價差"),
];

/// `fields`가 빠진 응답에 사용할 기본 헤더 (API 문서 순서).
const DEFAULT_HEADER: [&str; 9] = [
    "日期",
    "成交股數",
    "成交金額",
    "開盤價",
    "最高價",
    "最低價",
    "收盤價",
    "漲跌價差",
    "成交筆數",
];

/// STOCK_DAY 응답.
#[derive(Debug, Deserialize)]
struct StockDayResponse {
    #[serde(default)]
    stat: Option<String>,
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    data: Option<Vec<Vec<serde_json::Value>>>,
}

/// 상장 시장 어댑터.
#[derive(Clone)]
pub struct ListedMarketAdapter {
    transport: Arc<dyn QuoteTransport>,
    base_url: String,
}

impl ListedMarketAdapter {
    /// # Arguments
    /// * `transport` - 전송 계층
    /// * `base_url` - API 기본 URL (예: `https://www.twse.com.tw`)
    pub fn new(transport: Arc<dyn QuoteTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// 응답 본문을 원시 배치로 변환.
    pub fn parse_payload(body: &str) -> FetchResult<RawBatch> {
        let payload: StockDayResponse = parse_json(body)?;

        match payload.stat.as_deref().map(str::trim) {
            None => return Err(FetchError::UpstreamStatus(UpstreamStatus::Missing)),
            Some("OK") => {}
            Some(other) => {
                return Err(FetchError::UpstreamStatus(UpstreamStatus::NotOk(
                    other.to_string(),
                )))
            }
        }

        let data = payload.data.unwrap_or_default();
        if data.is_empty() {
            return Err(FetchError::UpstreamStatus(UpstreamStatus::NoData));
        }

        let header = payload.fields.unwrap_or_else(|| {
            debug!("fields 누락, 기본 헤더 사용");
            DEFAULT_HEADER.iter().map(|s| s.to_string()).collect()
        });

        let field_map = FieldMap::named(header, FIELD_LABELS);
        if field_map.resolve().index_of(QuoteField::Date).is_none() {
            return Err(FetchError::MalformedPayload(
                "fields 헤더에 날짜 컬럼이 없습니다".to_string(),
            ));
        }

        let rows: Vec<RawQuoteRow> = data.iter().map(|cells| cells_to_row(cells)).collect();
        Ok(RawBatch::new(SourceKind::Listed, DateCalendar::Roc, field_map, rows))
    }
}

#[async_trait]
impl SourceAdapter for ListedMarketAdapter {
    fn source(&self) -> SourceKind {
        SourceKind::Listed
    }

    async fn fetch_raw(&self, ticker_id: &str, as_of: NaiveDate) -> FetchResult<RawBatch> {
        let url = format!("{}{}", self.base_url, STOCK_DAY_PATH);
        let query = [
            ("date", month_start(as_of).format("%Y%m%d").to_string()),
            ("stockNo", ticker_id.to_string()),
            ("response", "json".to_string()),
        ];

        let body = self.transport.get_text(&url, &query).await?;
        let batch = Self::parse_payload(&body)?;
        debug!(ticker = ticker_id, rows = batch.rows.len(), "상장 시장 원시 시세 수신");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "stat": "OK",
        "date": "20240102",
        "fields": ["日期","成交股數","成交金額","開盤價","最高價","最低價","收盤價","漲跌價差","成交筆數"],
        "data": [
            ["113/01/02","26,059,058","15,501,012,382","590.00","593.00","589.00","593.00","+0.00","20,386"],
            ["113/01/03","37,106,763","21,709,571,378","584.00","585.00","576.00","578.00","-15.00","44,855"]
        ]
    }"#;

    #[test]
    fn test_parse_ok_payload() {
        let batch = ListedMarketAdapter::parse_payload(OK_BODY).unwrap();
        assert_eq!(batch.source, SourceKind::Listed);
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.rows[1].get(7), Some("-15.00"));

        let resolved = batch.field_map.resolve();
        assert_eq!(resolved.index_of(QuoteField::Close), Some(6));
        assert_eq!(resolved.index_of(QuoteField::Volume), Some(1));
    }

    #[test]
    fn test_missing_stat_is_upstream_failure() {
        let body = r#"{"fields": [], "data": [["113/01/02"]]}"#;
        assert_eq!(
            ListedMarketAdapter::parse_payload(body).unwrap_err(),
            FetchError::UpstreamStatus(UpstreamStatus::Missing)
        );
    }

    #[test]
    fn test_not_ok_stat() {
        let body = r#"{"stat": "很抱歉，沒有符合條件的資料!"}"#;
        assert!(matches!(
            ListedMarketAdapter::parse_payload(body).unwrap_err(),
            FetchError::UpstreamStatus(UpstreamStatus::NotOk(s)) if s.contains("沒有符合")
        ));
    }

    #[test]
    fn test_ok_without_rows_is_no_data() {
        let body = r#"{"stat": "OK", "fields": [], "data": []}"#;
        assert!(ListedMarketAdapter::parse_payload(body).unwrap_err().is_no_data());
    }

    #[test]
    fn test_missing_fields_uses_default_header() {
        let body = r#"{"stat": "OK", "data": [["113/01/02","1","1","10","11","9","10.5","+0.5","3"]]}"#;
        let batch = ListedMarketAdapter::parse_payload(body).unwrap();
        assert_eq!(batch.field_map.resolve().index_of(QuoteField::Open), Some(3));
    }

    #[test]
    fn test_header_without_date_column_is_malformed() {
        let body = r#"{"stat": "OK", "fields": ["Date","Open","Close"], "data": [["113/01/02","10","11"]]}"#;
        assert!(matches!(
            ListedMarketAdapter::parse_payload(body),
            Err(FetchError::MalformedPayload(msg)) if msg.contains("날짜")
        ));
    }

    #[test]
    fn test_html_page_is_malformed() {
        let body = "<!DOCTYPE html><html><body>Service Unavailable</body></html>";
        assert!(matches!(
            ListedMarketAdapter::parse_payload(body),
            Err(FetchError::MalformedPayload(_))
        ));
    }
}
