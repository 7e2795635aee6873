//! ETF 보유 종목 조회.

use anyhow::{Context, Result};
use std::sync::Arc;

use twquote_core::AppConfig;
use twquote_data::export::display_value;
use twquote_data::provider::top_holdings;
use twquote_data::{EtfHolding, HoldingsClient, HttpTransport};

/// 보유 종목 조회 후 상위 `top`개 출력.
///
/// `url`이 없으면 설정의 `holdings.proxy_url`을 사용합니다.
pub async fn run_holdings(config: &AppConfig, url: Option<String>, top: usize) -> Result<()> {
    let url = url
        .or_else(|| config.holdings.proxy_url.clone())
        .context("보유 종목 URL이 없습니다 (--url 또는 설정 holdings.proxy_url)")?;

    let transport = Arc::new(HttpTransport::from_config(&config.sources)?);
    let holdings = HoldingsClient::new(transport, url)
        .fetch()
        .await
        .context("보유 종목 조회 실패")?;

    print!("{}", render_holdings(top_holdings(&holdings, top)));
    Ok(())
}

/// 보유 종목 표.
pub fn render_holdings(holdings: &[EtfHolding]) -> String {
    let mut out = format!(
        "{:>4} {:<8} {:<16} {:>16} {:>8}\n",
        "순위", "종목", "이름", "보유 수량", "비중(%)"
    );
    for (rank, holding) in holdings.iter().enumerate() {
        out.push_str(&format!(
            "{:>4} {:<8} {:<16} {:>16} {:>8}\n",
            rank + 1,
            holding.code,
            holding.name,
            display_value(holding.quantity),
            display_value(holding.weight_pct),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_holdings() {
        let holdings = vec![EtfHolding {
            code: "2330".into(),
            name: "台積電".into(),
            quantity: Some(dec!(1234000)),
            weight_pct: None,
        }];
        let text = render_holdings(&holdings);
        assert!(text.contains("2330"));
        assert!(text.contains("1234000"));
        assert!(text.lines().nth(1).unwrap().trim_end().ends_with('-'));
    }

    #[tokio::test]
    async fn test_missing_url_is_error() {
        let err = run_holdings(&AppConfig::default(), None, 5).await.unwrap_err();
        assert!(err.to_string().contains("URL"));
    }
}
