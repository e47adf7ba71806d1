//! 로그 레벨 정의와 이름 해석

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LogError;
use crate::logging::diagnostics::Diagnostics;

/// 로그 레벨 열거형
///
/// 서수 값은 낮을수록 덜 중요합니다: `DEBUG < INFO < WARNING < ERROR < CRITICAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// 디버깅 정보
    Debug = 10,
    /// 일반 정보
    Info = 20,
    /// 경고 상황
    Warning = 30,
    /// 오류 상황
    Error = 40,
    /// 시스템 중단 수준 오류
    Critical = 50,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    /// 로그 레벨을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// 내부 서수 값
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// `tracing` 레벨에서 변환 (TRACE는 DEBUG로 합쳐짐)
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }

    /// `tracing` 필터 지시어로 쓸 이름
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(LogError::UnknownLevel(s.to_string())),
        }
    }
}

/// 레벨 이름을 해석합니다.
///
/// 알 수 없는 이름이면 진단 채널에 한 번 알리고 `INFO`를 반환합니다.
/// 부트스트랩 도중 호출되므로 실패하지 않습니다.
pub fn resolve_level(name: &str, diagnostics: &dyn Diagnostics) -> LogLevel {
    match name.parse::<LogLevel>() {
        Ok(level) => level,
        Err(_) => {
            diagnostics.emit(&format!("⚠️ 알 수 없는 로그 레벨: {}, 기본값 INFO 사용", name));
            LogLevel::Info
        }
    }
}
