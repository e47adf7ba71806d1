//! 로그 싱크
//!
//! 포매팅된 레코드를 받는 출력 대상들입니다. 각 싱크는 자체 최소 레벨을 가지며
//! 여러 스레드에서 동시에 호출될 수 있습니다.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::logging::formatter::{LogFormatter, LogRecord};
use crate::logging::level::LogLevel;

/// 로그 싱크 공통 인터페이스
pub trait Sink: Send + Sync {
    /// 이 싱크의 최소 레벨
    fn level(&self) -> LogLevel;

    /// 레코드 한 건 출력
    fn emit(&self, record: &LogRecord) -> Result<()>;

    /// 버퍼 플러시
    fn flush(&self) -> Result<()>;

    /// 리소스 정리, 이후 emit은 무시됨
    fn close(&self) {}

    /// 진단 메시지용 설명
    fn describe(&self) -> String;

    /// 레벨 조건을 만족하는지 여부
    fn accepts(&self, record: &LogRecord) -> bool {
        record.level >= self.level()
    }
}

/// 콘솔 출력 스트림
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

impl ConsoleTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleTarget::Stdout => "stdout",
            ConsoleTarget::Stderr => "stderr",
        }
    }
}

/// 콘솔 싱크
pub struct ConsoleSink {
    target: ConsoleTarget,
    formatter: Arc<LogFormatter>,
    level: LogLevel,
    closed: AtomicBool,
}

impl ConsoleSink {
    /// 새 콘솔 싱크 생성
    ///
    /// 스트림을 한 번 플러시해 보고 사용할 수 없으면 에러를 반환합니다.
    pub fn new(target: ConsoleTarget, formatter: Arc<LogFormatter>, level: LogLevel) -> Result<Self> {
        match target {
            ConsoleTarget::Stdout => std::io::stdout().flush(),
            ConsoleTarget::Stderr => std::io::stderr().flush(),
        }
        .with_context(|| format!("콘솔 스트림 사용 불가: {}", target.as_str()))?;

        Ok(Self {
            target,
            formatter,
            level,
            closed: AtomicBool::new(false),
        })
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }
}

impl Sink for ConsoleSink {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        let line = self.formatter.format(record);
        match self.target {
            ConsoleTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", line).context("stdout 쓰기 실패")?;
            }
            ConsoleTarget::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{}", line).context("stderr 쓰기 실패")?;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().flush(),
            ConsoleTarget::Stderr => std::io::stderr().flush(),
        }
        .context("콘솔 플러시 실패")
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.flush();
        }
    }

    fn describe(&self) -> String {
        format!("console({})", self.target.as_str())
    }
}

/// 메모리 내 싱크 (테스트용)
pub struct MemorySink {
    formatter: Arc<LogFormatter>,
    level: LogLevel,
    lines: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new(formatter: Arc<LogFormatter>, level: LogLevel) -> Self {
        Self {
            formatter,
            level,
            lines: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// 모든 로그 줄 반환
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Sink for MemorySink {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        if !self.is_closed() {
            self.lines.lock().push(self.formatter.format(record));
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
