//! tracing 연동
//!
//! `tracing` 매크로로 남긴 이벤트를 로거 레지스트리로 전달하는 레이어입니다.
//! 이벤트 target의 `::` 구분자는 `.`로 바뀌어 계층 로거 이름이 됩니다
//! (`my_app::db` → `my_app.db`).

use std::fmt::Write as FmtWrite;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::{LogError, LogResult};
use crate::logging::formatter::LogRecord;
use crate::logging::level::LogLevel;
use crate::logging::manager::LoggerManager;
use crate::logging::registry::LoggerRegistry;

/// 레지스트리로 이벤트를 보내는 tracing 레이어
pub struct RegistryLayer {
    registry: LoggerRegistry,
}

impl RegistryLayer {
    pub fn new(registry: LoggerRegistry) -> Self {
        Self { registry }
    }
}

impl<S> Layer<S> for RegistryLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = LogLevel::from_tracing(metadata.level());
        let logger = self.registry.get(&logger_name(metadata.target()));
        if !logger.is_enabled_for(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        logger.log_record(&LogRecord::new(level, logger.name(), visitor.finish()));
    }
}

/// tracing target을 점 구분 로거 이름으로 변환
pub fn logger_name(target: &str) -> String {
    target.replace("::", ".")
}

/// 메시지와 나머지 필드를 `message key=value ...` 형태로 모음
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }
}

/// 전역 tracing 구독자로 레지스트리 레이어 설치
///
/// `RUST_LOG`이 있으면 그 필터를, 없으면 매니저의 루트 레벨을 사용합니다.
/// 매니저가 초기화되지 않았으면 기본 설정으로 먼저 초기화합니다.
pub fn install_tracing_bridge(manager: &LoggerManager) -> LogResult<()> {
    let level = manager.root_logger().effective_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(RegistryLayer::new(manager.registry().clone()))
        .try_init()
        .map_err(|e| LogError::Config {
            message: format!("tracing 구독자 설치 실패: {}", e),
        })
}
