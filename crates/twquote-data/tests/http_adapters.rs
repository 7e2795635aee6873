//! HTTP 전송 계층 + 소스 어댑터 테스트 (mockito 서버).

use chrono::NaiveDate;
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

use twquote_core::{FetchError, SourceAdapter, UpstreamStatus};
use twquote_data::{EmergingMarketAdapter, HoldingsClient, HttpTransport, ListedMarketAdapter};

fn transport() -> Arc<HttpTransport> {
    Arc::new(HttpTransport::new(Duration::from_secs(5), "twquote-test").unwrap())
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

#[tokio::test]
async fn test_listed_adapter_sends_month_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rwd/zh/afterTrading/STOCK_DAY")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("date".into(), "20240101".into()),
            Matcher::UrlEncoded("stockNo".into(), "2330".into()),
            Matcher::UrlEncoded("response".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"stat":"OK","fields":["日期","成交股數","開盤價","最高價","最低價","收盤價","漲跌價差"],
                "data":[["113/01/02","26,059,058","590.00","593.00","589.00","593.00","+0.00"]]}"#,
        )
        .create_async()
        .await;

    let adapter = ListedMarketAdapter::new(transport(), server.url());
    let batch = adapter.fetch_raw("2330", as_of()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(batch.rows.len(), 1);
    assert_eq!(batch.rows[0].get(0), Some("113/01/02"));
}

#[tokio::test]
async fn test_listed_adapter_not_ok_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rwd/zh/afterTrading/STOCK_DAY")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"stat":"很抱歉，沒有符合條件的資料!"}"#)
        .create_async()
        .await;

    let adapter = ListedMarketAdapter::new(transport(), server.url());
    let err = adapter.fetch_raw("9999", as_of()).await.unwrap_err();

    assert!(matches!(
        err,
        FetchError::UpstreamStatus(UpstreamStatus::NotOk(_))
    ));
}

#[tokio::test]
async fn test_emerging_adapter_sends_roc_month() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/web/emergingstock/historical/daily/EMDaily_result.php")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("l".into(), "zh-tw".into()),
            Matcher::UrlEncoded("d".into(), "113/01".into()),
            Matcher::UrlEncoded("stk_no".into(), "7822".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"aaData":[["113/01/02","12,000","250,800","31","21.50","20.10","20.85","-0.15"]]}"#)
        .create_async()
        .await;

    let adapter = EmergingMarketAdapter::new(transport(), server.url());
    let batch = adapter.fetch_raw("7822", as_of()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(batch.rows.len(), 1);
}

#[tokio::test]
async fn test_html_error_page_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/web/emergingstock/historical/daily/EMDaily_result.php")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>系統維護中</body></html>")
        .create_async()
        .await;

    let adapter = EmergingMarketAdapter::new(transport(), server.url());
    let err = adapter.fetch_raw("7822", as_of()).await.unwrap_err();

    assert!(matches!(err, FetchError::MalformedPayload(_)));
}

#[tokio::test]
async fn test_server_error_is_network_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rwd/zh/afterTrading/STOCK_DAY")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let adapter = ListedMarketAdapter::new(transport(), server.url());
    let err = adapter.fetch_raw("2330", as_of()).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_request_timeout_is_network_failure() {
    // 연결만 받고 응답하지 않는 서버
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let transport =
        Arc::new(HttpTransport::new(Duration::from_millis(100), "twquote-test").unwrap());
    let adapter = ListedMarketAdapter::new(transport, format!("http://{}", addr));
    let err = adapter.fetch_raw("2330", as_of()).await.unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
    assert!(err.is_retryable());
    server.abort();
}

#[tokio::test]
async fn test_holdings_client_fetch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/holdings")
        .with_status(200)
        .with_body(
            r#"{"data":[
                {"STOCK_ID":"2454","STOCK_NAME":"聯發科","HOLD_QTY":"500,000","RATIO":"4.10"},
                {"STOCK_ID":"2330","STOCK_NAME":"台積電","HOLD_QTY":"1,234,000","RATIO":"9.87"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = HoldingsClient::new(transport(), format!("{}/holdings", server.url()));
    let holdings = client.fetch().await.unwrap();

    assert_eq!(holdings.len(), 2);
    assert_eq!(holdings[0].code, "2330");
}
