//! 사이드 채널 진단 출력
//!
//! 부트스트랩 중에는 로깅 파이프라인이 아직 없으므로, 디렉토리 시도/폴백/레벨 파싱 실패 같은
//! 메시지는 파이프라인을 거치지 않고 원시 스트림으로 바로 출력합니다.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// 사이드 채널 진단 출력 대상
pub trait Diagnostics: Send + Sync {
    /// 진단 메시지 한 줄 출력
    fn emit(&self, message: &str);
}

/// 표준 에러 스트림으로 출력하는 기본 진단 채널
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {
    fn emit(&self, message: &str) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(handle, "[easylog] {}", message);
    }
}

/// 메모리에 진단 메시지를 모아두는 채널 (테스트용)
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 지금까지 수집된 메시지 복사본
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// 주어진 문자열을 포함하는 메시지 개수
    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn emit(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// 기본 진단 채널 (stderr)
pub fn default_diagnostics() -> Arc<dyn Diagnostics> {
    Arc::new(StderrDiagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_diagnostics_collects_messages() {
        let diag = MemoryDiagnostics::new();
        assert!(diag.is_empty());

        diag.emit("📁 first");
        diag.emit("📁 second");

        assert_eq!(diag.len(), 2);
        assert_eq!(diag.count_containing("second"), 1);

        diag.clear();
        assert!(diag.is_empty());
    }
}
