//! ETF 보유 종목 조회.
//!
//! 투신사 사이트를 직접 호출하는 대신, 미리 배포된 프록시(JSON)를 통해
//! 보유 종목 목록을 가져옵니다.
//!
//! ```json
//! {"data": [{"STOCK_ID": "2330", "STOCK_NAME": "台積電", "HOLD_QTY": "1,234,000", "RATIO": "9.87"}]}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use twquote_core::{FetchError, FetchResult, QuoteTransport, UpstreamStatus};

use super::{parse_json, value_to_text};
use crate::normalizer::clean_numeric;

/// 보유 종목 한 건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtfHolding {
    /// 종목 코드
    pub code: String,
    /// 종목명
    pub name: String,
    /// 보유 수량
    pub quantity: Option<Decimal>,
    /// 비중 (%)
    pub weight_pct: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct RawHolding {
    #[serde(rename = "STOCK_ID")]
    code: serde_json::Value,
    #[serde(rename = "STOCK_NAME", default)]
    name: Option<String>,
    #[serde(rename = "HOLD_QTY", default)]
    quantity: serde_json::Value,
    #[serde(rename = "RATIO", default)]
    ratio: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct HoldingsResponse {
    #[serde(default)]
    data: Option<Vec<RawHolding>>,
}

/// ETF 보유 종목 프록시 클라이언트.
#[derive(Clone)]
pub struct HoldingsClient {
    transport: Arc<dyn QuoteTransport>,
    url: String,
}

impl HoldingsClient {
    pub fn new(transport: Arc<dyn QuoteTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// 응답 본문을 비중 내림차순 보유 종목으로 변환.
    pub fn parse_payload(body: &str) -> FetchResult<Vec<EtfHolding>> {
        let payload: HoldingsResponse = parse_json(body)?;
        let raw = payload
            .data
            .ok_or(FetchError::UpstreamStatus(UpstreamStatus::Missing))?;
        if raw.is_empty() {
            return Err(FetchError::UpstreamStatus(UpstreamStatus::NoData));
        }

        let mut holdings: Vec<EtfHolding> = raw
            .into_iter()
            .map(|h| {
                let code = value_to_text(&h.code).trim().to_string();
                EtfHolding {
                    name: h.name.map(|n| n.trim().to_string()).unwrap_or_else(|| code.clone()),
                    code,
                    quantity: clean_numeric(&value_to_text(&h.quantity)),
                    weight_pct: clean_numeric(value_to_text(&h.ratio).trim_end_matches('%')),
                }
            })
            .filter(|h| !h.code.is_empty())
            .collect();

        // 비중 누락 종목은 뒤로
        holdings.sort_by(|a, b| b.weight_pct.cmp(&a.weight_pct));
        Ok(holdings)
    }

    /// 보유 종목 조회.
    pub async fn fetch(&self) -> FetchResult<Vec<EtfHolding>> {
        let body = self.transport.get_text(&self.url, &[]).await?;
        let holdings = Self::parse_payload(&body)?;
        info!(count = holdings.len(), "ETF 보유 종목 조회 완료");
        Ok(holdings)
    }
}

/// 비중 상위 `n`개.
pub fn top_holdings(holdings: &[EtfHolding], n: usize) -> &[EtfHolding] {
    &holdings[..n.min(holdings.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_and_sort_by_weight() {
        let body = r#"{"data": [
            {"STOCK_ID": "2454", "STOCK_NAME": "聯發科", "HOLD_QTY": "500,000", "RATIO": "4.10"},
            {"STOCK_ID": 2330, "STOCK_NAME": "台積電", "HOLD_QTY": 1234000, "RATIO": "9.87%"},
            {"STOCK_ID": "3034", "STOCK_NAME": "聯詠", "HOLD_QTY": "--", "RATIO": null}
        ]}"#;
        let holdings = HoldingsClient::parse_payload(body).unwrap();

        assert_eq!(holdings[0].code, "2330");
        assert_eq!(holdings[0].weight_pct, Some(dec!(9.87)));
        assert_eq!(holdings[0].quantity, Some(dec!(1234000)));
        assert_eq!(holdings[1].code, "2454");
        assert_eq!(holdings[2].weight_pct, None);
        assert_eq!(holdings[2].quantity, None);
        assert_eq!(top_holdings(&holdings, 2).len(), 2);
        assert_eq!(top_holdings(&holdings, 10).len(), 3);
    }

    #[test]
    fn test_missing_and_empty_data() {
        assert_eq!(
            HoldingsClient::parse_payload(r#"{"error": "quota"}"#).unwrap_err(),
            FetchError::UpstreamStatus(UpstreamStatus::Missing)
        );
        assert!(HoldingsClient::parse_payload(r#"{"data": []}"#)
            .unwrap_err()
            .is_no_data());
    }
}
