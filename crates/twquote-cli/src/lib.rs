//! twquote CLI 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 한 번의 시세 통합 실행 및 CSV/JSON 출력
//! - 캐시를 사용하는 주기적 갱신
//! - ETF 보유 종목 조회

pub mod commands;
