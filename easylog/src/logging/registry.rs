//! 프로세스 전역 로거 레지스트리
//!
//! 점(`.`)으로 구분된 이름 계층을 가진 로거들을 관리합니다. 레코드는 먼저 자기 로거의
//! 싱크로 가고, `propagate`가 켜져 있으면 부모(가장 가까운 등록된 조상, 최종적으로 루트)의
//! 싱크로 전달됩니다.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::logging::diagnostics::{default_diagnostics, Diagnostics};
use crate::logging::formatter::LogRecord;
use crate::logging::level::LogLevel;
use crate::logging::writer::Sink;

/// 루트 로거 이름
pub const ROOT_LOGGER_NAME: &str = "root";

/// 아무 설정도 없을 때 루트 로거 레벨
const DEFAULT_ROOT_LEVEL: LogLevel = LogLevel::Warning;

struct LoggerNode {
    name: String,
    level: RwLock<Option<LogLevel>>,
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    propagate: AtomicBool,
}

impl LoggerNode {
    fn new(name: &str, level: Option<LogLevel>) -> Self {
        Self {
            name: name.to_string(),
            level: RwLock::new(level),
            sinks: RwLock::new(Vec::new()),
            propagate: AtomicBool::new(true),
        }
    }
}

struct RegistryInner {
    root: Arc<LoggerNode>,
    loggers: DashMap<String, Arc<LoggerNode>>,
    diagnostics: Arc<dyn Diagnostics>,
}

/// 로거 레지스트리
///
/// 복제해도 같은 레지스트리를 가리킵니다.
#[derive(Clone)]
pub struct LoggerRegistry {
    inner: Arc<RegistryInner>,
}

static GLOBAL_REGISTRY: OnceLock<LoggerRegistry> = OnceLock::new();

impl LoggerRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::with_diagnostics(default_diagnostics())
    }

    /// 싱크 쓰기 실패를 보고할 진단 채널을 지정해 생성
    pub fn with_diagnostics(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                root: Arc::new(LoggerNode::new(ROOT_LOGGER_NAME, Some(DEFAULT_ROOT_LEVEL))),
                loggers: DashMap::new(),
                diagnostics,
            }),
        }
    }

    /// 프로세스 전역 레지스트리
    pub fn global() -> &'static LoggerRegistry {
        GLOBAL_REGISTRY.get_or_init(LoggerRegistry::new)
    }

    /// 루트 로거
    pub fn root(&self) -> Logger {
        Logger {
            node: self.inner.root.clone(),
            registry: self.clone(),
        }
    }

    /// 이름으로 로거를 가져오거나 새로 등록
    ///
    /// 빈 문자열과 `"root"`는 루트 로거를 뜻합니다.
    pub fn get(&self, name: &str) -> Logger {
        if is_root_name(name) {
            return self.root();
        }

        let node = self
            .inner
            .loggers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(LoggerNode::new(name, None)))
            .clone();

        Logger {
            node,
            registry: self.clone(),
        }
    }

    /// 해당 이름의 로거가 이미 등록되어 있는지 여부
    pub fn contains(&self, name: &str) -> bool {
        is_root_name(name) || self.inner.loggers.contains_key(name)
    }

    /// 등록된 로거 이름 목록 (루트 제외, 정렬됨)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.loggers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// 두 핸들이 같은 레지스트리를 가리키는지 여부
    pub fn same_as(&self, other: &LoggerRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 가장 가까운 등록된 조상, 없으면 루트
    fn parent_of(&self, node: &LoggerNode) -> Option<Arc<LoggerNode>> {
        if std::ptr::eq(node, self.inner.root.as_ref()) {
            return None;
        }

        let mut name = node.name.as_str();
        while let Some(pos) = name.rfind('.') {
            name = &name[..pos];
            if let Some(parent) = self.inner.loggers.get(name) {
                return Some(parent.clone());
            }
        }
        Some(self.inner.root.clone())
    }

    fn report_failure(&self, sink: &dyn Sink, error: &anyhow::Error) {
        self.inner
            .diagnostics
            .emit(&format!("로그 기록 실패 ({}): {:#}", sink.describe(), error));
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.names())
            .finish()
    }
}

fn is_root_name(name: &str) -> bool {
    name.is_empty() || name == ROOT_LOGGER_NAME
}

/// 이름 있는 로거 핸들
///
/// 같은 이름으로 얻은 핸들은 모두 같은 로거를 가리킵니다.
#[derive(Clone)]
pub struct Logger {
    node: Arc<LoggerNode>,
    registry: LoggerRegistry,
}

impl Logger {
    /// 로거 이름
    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn is_root(&self) -> bool {
        Arc::ptr_eq(&self.node, &self.registry.inner.root)
    }

    /// 이 로거에 직접 설정된 레벨
    pub fn level(&self) -> Option<LogLevel> {
        *self.node.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.node.level.write() = Some(level);
    }

    /// 조상까지 올라가며 찾은 실제 적용 레벨
    pub fn effective_level(&self) -> LogLevel {
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            if let Some(level) = *node.level.read() {
                return level;
            }
            current = self.registry.parent_of(&node);
        }
        DEFAULT_ROOT_LEVEL
    }

    /// 해당 레벨의 레코드를 처리할지 여부
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        level >= self.effective_level()
    }

    pub fn propagate(&self) -> bool {
        self.node.propagate.load(Ordering::Acquire)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.node.propagate.store(propagate, Ordering::Release);
    }

    /// 싱크 추가
    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.node.sinks.write().push(sink);
    }

    /// 현재 연결된 싱크 목록
    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.node.sinks.read().clone()
    }

    /// 모든 싱크를 떼어내고 반환 (닫지는 않음)
    pub fn take_sinks(&self) -> Vec<Arc<dyn Sink>> {
        std::mem::take(&mut *self.node.sinks.write())
    }

    /// 모든 싱크를 떼어내고 닫음
    pub fn clear_sinks(&self) {
        for sink in self.take_sinks() {
            let _ = sink.flush();
            sink.close();
        }
    }

    /// 같은 로거를 가리키는지 여부
    pub fn same_as(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// 레코드 기록
    ///
    /// 실패하지 않습니다. 싱크 쓰기 오류는 진단 채널로 보고됩니다.
    pub fn log<M: Into<String>>(&self, level: LogLevel, message: M) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = LogRecord::new(level, self.node.name.clone(), message);
        self.handle(&record);
    }

    /// 이미 만들어진 레코드를 이 로거에서부터 전달 (레벨 검사 포함)
    pub fn log_record(&self, record: &LogRecord) {
        if self.is_enabled_for(record.level) {
            self.handle(record);
        }
    }

    fn handle(&self, record: &LogRecord) {
        let mut current = Some(self.node.clone());
        while let Some(node) = current {
            let sinks = node.sinks.read().clone();
            for sink in sinks.iter().filter(|s| s.accepts(record)) {
                if let Err(e) = sink.emit(record) {
                    self.registry.report_failure(sink.as_ref(), &e);
                }
            }

            if !node.propagate.load(Ordering::Acquire) {
                break;
            }
            current = self.registry.parent_of(&node);
        }
    }

    pub fn debug<M: Into<String>>(&self, message: M) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info<M: Into<String>>(&self, message: M) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning<M: Into<String>>(&self, message: M) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error<M: Into<String>>(&self, message: M) {
        self.log(LogLevel::Error, message);
    }

    pub fn critical<M: Into<String>>(&self, message: M) {
        self.log(LogLevel::Critical, message);
    }

    /// 이 로거에 직접 연결된 싱크 플러시
    pub fn flush(&self) {
        for sink in self.sinks() {
            if let Err(e) = sink.flush() {
                self.registry.report_failure(sink.as_ref(), &e);
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.node.name)
            .field("level", &self.level())
            .field("sinks", &self.node.sinks.read().len())
            .field("propagate", &self.propagate())
            .finish()
    }
}
