//! 원시 시세 행과 정규화된 시세 레코드.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 정규화 대상 필드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteField {
    Date,
    Open,
    High,
    Low,
    Close,
    Change,
    Volume,
}

impl QuoteField {
    /// 전체 필드 수.
    pub const COUNT: usize = 7;

    /// 정규 컬럼 순서.
    pub const ALL: [QuoteField; Self::COUNT] = [
        QuoteField::Date,
        QuoteField::Open,
        QuoteField::High,
        QuoteField::Low,
        QuoteField::Close,
        QuoteField::Change,
        QuoteField::Volume,
    ];

    /// 숫자 필드 목록 (날짜 제외).
    pub const NUMERIC: [QuoteField; 6] = [
        QuoteField::Open,
        QuoteField::High,
        QuoteField::Low,
        QuoteField::Close,
        QuoteField::Change,
        QuoteField::Volume,
    ];

    /// 배열 인덱스.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// 컬럼 이름.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Change => "change",
            Self::Volume => "volume",
        }
    }
}

/// 업스트림에서 받은 하루치 원시 행.
///
/// 각 셀의 의미는 소스의 필드 맵에 따라 결정됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawQuoteRow {
    cells: Vec<String>,
}

impl RawQuoteRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// 인덱스의 셀 텍스트.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for RawQuoteRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// 정규화된 일별 시세.
///
/// 숫자 필드는 유효한 Decimal이거나 `None`(누락)입니다.
/// 쉼표, `+` 부호, 센티널 문자가 남아 있는 값은 존재하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuote {
    /// 거래일 (서기)
    pub date: NaiveDate,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 종가 (흥궤 시장은 평균가)
    pub close: Option<Decimal>,
    /// 전일 대비
    pub change: Option<Decimal>,
    /// 거래량
    pub volume: Option<Decimal>,
}

impl NormalizedQuote {
    /// 날짜만 있고 모든 값이 누락된 레코드.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            change: None,
            volume: None,
        }
    }

    /// 숫자 필드 값 조회.
    pub fn value(&self, field: QuoteField) -> Option<Decimal> {
        match field {
            QuoteField::Date => None,
            QuoteField::Open => self.open,
            QuoteField::High => self.high,
            QuoteField::Low => self.low,
            QuoteField::Close => self.close,
            QuoteField::Change => self.change,
            QuoteField::Volume => self.volume,
        }
    }

    /// 숫자 필드 값 설정.
    pub fn set_value(&mut self, field: QuoteField, value: Option<Decimal>) {
        match field {
            QuoteField::Date => {}
            QuoteField::Open => self.open = value,
            QuoteField::High => self.high = value,
            QuoteField::Low => self.low = value,
            QuoteField::Close => self.close = value,
            QuoteField::Change => self.change = value,
            QuoteField::Volume => self.volume = value,
        }
    }

    /// 가격 필드가 모두 누락된 비거래일 자리표시 행인지 확인.
    pub fn is_placeholder(&self) -> bool {
        self.open.is_none() && self.high.is_none() && self.low.is_none() && self.close.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_field_ordinals_follow_canonical_order() {
        for (i, field) in QuoteField::ALL.iter().enumerate() {
            assert_eq!(field.ordinal(), i);
        }
    }

    #[test]
    fn test_placeholder() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut quote = NormalizedQuote::empty(date);
        quote.volume = Some(dec!(0));
        assert!(quote.is_placeholder());

        quote.set_value(QuoteField::Close, Some(dec!(593.00)));
        assert!(!quote.is_placeholder());
        assert_eq!(quote.value(QuoteField::Close), Some(dec!(593)));
    }

    #[test]
    fn test_raw_row_collect() {
        let row: RawQuoteRow = ["113/01/02", "1,000"].into_iter().collect();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(1), Some("1,000"));
        assert_eq!(row.get(5), None);
    }
}
