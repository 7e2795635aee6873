//! reqwest 기반 HTTP 전송 계층.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use twquote_core::{FetchError, FetchResult, QuoteTransport, SourcesConfig};

/// 타임아웃이 설정된 HTTP GET 전송 계층.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// 새 전송 계층 생성.
    ///
    /// # Errors
    ///
    /// TLS 백엔드 초기화 실패 시 `FetchError::Network`.
    pub fn new(timeout: Duration, user_agent: &str) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;
        Ok(Self { client })
    }

    /// `[sources]` 설정으로 생성.
    pub fn from_config(config: &SourcesConfig) -> FetchResult<Self> {
        Self::new(config.request_timeout(), &config.user_agent)
    }
}

fn network_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Network(format!("요청 타임아웃 ({})", url))
    } else if err.is_connect() {
        FetchError::Network(format!("연결 실패 ({}): {}", url, err))
    } else {
        FetchError::Network(format!("요청 실패 ({}): {}", url, err))
    }
}

#[async_trait]
impl QuoteTransport for HttpTransport {
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> FetchResult<String> {
        debug!(url = %url, ?query, "HTTP GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json, text/plain, */*")
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {} ({})", status, url)));
        }

        response.text().await.map_err(|e| network_error(url, e))
    }
}

/// 응답이 HTML 같은 마크업 문서인지 확인.
///
/// BOM과 앞쪽 공백을 건너뛴 첫 글자가 `<`이면 마크업으로 봅니다.
pub(crate) fn looks_like_markup(body: &str) -> bool {
    body.trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with('<')
}

/// 마크업 응답이면 `MalformedPayload` 반환.
pub(crate) fn reject_markup(body: &str) -> FetchResult<()> {
    if looks_like_markup(body) {
        let preview: String = body.trim().chars().take(60).collect();
        return Err(FetchError::MalformedPayload(format!(
            "JSON 대신 마크업 응답: {}",
            preview
        )));
    }
    Ok(())
}
