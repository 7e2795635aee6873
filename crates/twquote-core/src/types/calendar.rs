//! 거래소 현지 달력 유틸리티.

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Asia::Taipei;

/// 민국(民國) 기년 오프셋.
pub const ROC_EPOCH_OFFSET: i32 = 1911;

/// 거래소 현지 시각(Asia/Taipei) 기준 오늘 날짜.
pub fn exchange_today() -> NaiveDate {
    Utc::now().with_timezone(&Taipei).date_naive()
}

/// 서기 연도를 민국 연도로 변환.
pub fn to_roc_year(year: i32) -> i32 {
    year - ROC_EPOCH_OFFSET
}

/// 민국 연도를 서기 연도로 변환.
pub fn from_roc_year(roc_year: i32) -> i32 {
    roc_year + ROC_EPOCH_OFFSET
}

/// 흥궤 시장 조회용 월 토큰 (`113/01`).
pub fn roc_month_token(date: NaiveDate) -> String {
    format!("{}/{:02}", to_roc_year(date.year()), date.month())
}

/// 해당 월의 1일.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roc_year() {
        assert_eq!(to_roc_year(2024), 113);
        assert_eq!(from_roc_year(113), 2024);
    }

    #[test]
    fn test_roc_month_token() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(roc_month_token(date), "113/03");

        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(roc_month_token(date), "114/12");
    }

    #[test]
    fn test_month_start() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
