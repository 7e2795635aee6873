//! 데이터 소스 및 종목 지정 타입.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 업스트림 데이터 소스 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 상장 시장 일별 시세 (TWSE)
    Listed,
    /// 흥궤/장외 시장 일별 시세 (TPEx)
    Emerging,
}

impl SourceKind {
    /// 소스 식별 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listed => "listed",
            Self::Emerging => "emerging",
        }
    }

    /// 소스가 사용하는 날짜 달력.
    pub fn native_calendar(&self) -> DateCalendar {
        match self {
            Self::Listed | Self::Emerging => DateCalendar::Roc,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "listed" | "twse" | "tse" => Ok(Self::Listed),
            "emerging" | "tpex" | "otc" | "esb" => Ok(Self::Emerging),
            other => Err(format!("Unknown source kind: {}", other)),
        }
    }
}

/// 날짜 문자열이 표기된 달력.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateCalendar {
    /// 민국(民國) 기년: 서기 - 1911 (예: `113/01/02`)
    Roc,
    /// 서기 (예: `2024-01-02`, `2024/01/02`, `20240102`)
    Gregorian,
}

/// 조회 대상 종목 한 건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSpec {
    /// 종목 코드 (예: "2330", "00929")
    pub id: String,
    /// 표시 이름
    #[serde(default)]
    pub name: String,
    /// 데이터 소스
    pub source: SourceKind,
}

impl TickerSpec {
    /// 새 종목 지정 생성.
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: SourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source,
        }
    }

    /// 표시 이름 (비어 있으면 종목 코드).
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl std::str::FromStr for TickerSpec {
    type Err = String;

    /// `ID[:NAME[:SOURCE]]` 형식 파싱. 소스 기본값은 `listed`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let id = parts.next().map(str::trim).unwrap_or_default();
        if id.is_empty() {
            return Err(format!("종목 코드가 비어 있습니다: '{}'", s));
        }
        let name = parts.next().map(str::trim).unwrap_or_default();
        let source = match parts.next() {
            Some(src) => src.parse()?,
            None => SourceKind::Listed,
        };
        Ok(Self::new(id, name, source))
    }
}
