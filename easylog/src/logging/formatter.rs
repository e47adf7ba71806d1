//! 로그 포매터
//!
//! 로그 레코드를 템플릿에 맞춰 한 줄 문자열로 만듭니다.
//!
//! 지원하는 자리표시자: `{timestamp}`, `{name}`, `{level}`, `{message}`, `{thread}`.
//! 알 수 없는 자리표시자는 그대로 출력됩니다.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::Write as _;

use crate::error::{LogError, LogResult};
use crate::logging::config::{DEFAULT_DATE_FORMAT, DEFAULT_FORMAT};
use crate::logging::level::LogLevel;

/// 로그 레코드
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// 생성 시각 (로컬 시간)
    pub timestamp: DateTime<Local>,
    /// 로그 레벨
    pub level: LogLevel,
    /// 로거 이름
    pub name: String,
    /// 로그 메시지
    pub message: String,
    /// 스레드 이름 또는 ID
    pub thread: String,
}

impl LogRecord {
    /// 새 로그 레코드 생성
    pub fn new<N: Into<String>, M: Into<String>>(level: LogLevel, name: N, message: M) -> Self {
        let current = std::thread::current();
        let thread = current
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", current.id()));

        Self {
            timestamp: Local::now(),
            level,
            name: name.into(),
            message: message.into(),
            thread,
        }
    }

    /// 타임스탬프 지정 (테스트 및 재생용)
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Timestamp,
    Name,
    Level,
    Message,
    Thread,
}

/// 템플릿 기반 로그 포매터
///
/// 템플릿은 생성 시 한 번만 해석되며 이후 여러 싱크가 공유합니다.
#[derive(Debug, Clone)]
pub struct LogFormatter {
    template: String,
    date_format: String,
    segments: Vec<Segment>,
}

impl LogFormatter {
    /// 새 포매터 생성
    ///
    /// 날짜 형식이 chrono strftime 규칙에 맞지 않으면 `InvalidFormat`을 반환합니다.
    pub fn new<T: Into<String>, D: Into<String>>(template: T, date_format: D) -> LogResult<Self> {
        let template = template.into();
        let date_format = date_format.into();
        validate_date_format(&date_format)?;

        let segments = parse_template(&template);
        Ok(Self {
            template,
            date_format,
            segments,
        })
    }

    /// 메시지 템플릿
    pub fn template(&self) -> &str {
        &self.template
    }

    /// 타임스탬프 형식
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// 레코드를 문자열로 포매팅 (개행 없음)
    pub fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message.len() + 32);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Timestamp => {
                    let _ = write!(out, "{}", record.timestamp.format(&self.date_format));
                }
                Segment::Name => out.push_str(&record.name),
                Segment::Level => out.push_str(record.level.as_str()),
                Segment::Message => out.push_str(&record.message),
                Segment::Thread => out.push_str(&record.thread),
            }
        }

        out
    }
}

impl Default for LogFormatter {
    fn default() -> Self {
        Self {
            template: DEFAULT_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            segments: parse_template(DEFAULT_FORMAT),
        }
    }
}

/// chrono strftime 형식 검증
pub fn validate_date_format(date_format: &str) -> LogResult<()> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(LogError::InvalidFormat(date_format.to_string()));
    }
    Ok(())
}

fn parse_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        literal.push_str(&rest[..start]);
        let after = &rest[start..];

        let Some(end) = after.find('}') else {
            break;
        };

        let placeholder = match &after[1..end] {
            "timestamp" => Some(Segment::Timestamp),
            "name" => Some(Segment::Name),
            "level" => Some(Segment::Level),
            "message" => Some(Segment::Message),
            "thread" => Some(Segment::Thread),
            _ => None,
        };

        match placeholder {
            Some(segment) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            None => literal.push_str(&after[..=end]),
        }
        rest = &after[end + 1..];
    }

    // 닫히지 않은 '{' 이후는 리터럴로 취급
    if let Some(start) = rest.find('{') {
        literal.push_str(&rest[start..]);
    } else {
        literal.push_str(rest);
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}
