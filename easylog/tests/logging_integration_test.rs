//! 로깅 부트스트랩 통합 테스트
//!
//! 매니저를 통해 디렉토리 결정, 파일 순환, 계층 로거, 외부 프레임워크 연동을 함께 검증합니다.

use anyhow::Result;
use easylog::logging::{
    configure, get_log_directory, get_logger, ConfigOverrides, ConsoleTarget, LogLevel,
    LoggerManager, LoggerRegistry, MemoryDiagnostics,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn isolated_manager(temp_dir: &TempDir) -> (LoggerManager, Arc<MemoryDiagnostics>) {
    let diag = MemoryDiagnostics::new();
    let manager = LoggerManager::builder()
        .registry(LoggerRegistry::new())
        .diagnostics(diag.clone())
        .home_dir(Some(temp_dir.path().join("home")))
        .temp_dir(temp_dir.path().join("tmp"))
        .console_target(ConsoleTarget::Stderr)
        .defaults(
            ConfigOverrides::new()
                .with_project_root(temp_dir.path().join("project"))
                .with_console_output(false),
        )
        .build();
    (manager, diag)
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// 전역 매니저: 명시적 초기화 후 같은 인스턴스와 같은 로거를 돌려줘야 함
#[test]
fn test_global_manager_is_singleton() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let project = temp_dir.path().join("global_project");

    configure(
        ConfigOverrides::new()
            .with_project_root(&project)
            .with_console_output(false)
            .with_log_level("DEBUG"),
    )?;
    // 두 번째 호출은 경고만 남기고 무시
    configure(ConfigOverrides::new().with_log_level("CRITICAL"))?;

    assert!(std::ptr::eq(LoggerManager::global(), LoggerManager::global()));
    assert!(get_logger("singleton").same_as(&get_logger("singleton")));
    assert_eq!(get_log_directory(), fs::canonicalize(project.join("logs"))?);
    assert_eq!(
        LoggerManager::global().config().map(|c| c.level),
        Some(LogLevel::Debug)
    );

    get_logger("singleton").debug("전역 디버그 메시지");
    LoggerManager::global().flush();
    let content = read_log(&get_log_directory().join("app.log"));
    assert!(content.contains("singleton - DEBUG - 전역 디버그 메시지"));
    assert!(content.contains("이미 초기화됨"));

    Ok(())
}

/// 여러 스레드에서 동시에 전역 매니저를 얻어도 모두 같은 인스턴스여야 함
#[test]
fn test_global_manager_same_instance_across_threads() -> Result<()> {
    let barrier = Arc::new(std::sync::Barrier::new(10));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                LoggerManager::global() as *const LoggerManager as usize
            })
        })
        .collect();

    let mut addresses = Vec::new();
    for handle in handles {
        addresses.push(handle.join().map_err(|_| anyhow::anyhow!("스레드 패닉"))?);
    }

    assert_eq!(addresses.len(), 10);
    assert!(addresses.iter().all(|&addr| addr == addresses[0]));
    assert_eq!(addresses[0], LoggerManager::global() as *const LoggerManager as usize);

    Ok(())
}

/// 크기 기반 순환: backup_count를 넘는 백업은 남지 않아야 함
#[test]
fn test_rotation_through_manager() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    manager.initialize(
        ConfigOverrides::new()
            .with_max_bytes(200)
            .with_backup_count(2)
            .with_format("{name} {message}"),
    )?;

    let logger = manager.get_logger("rot");
    for i in 0..40 {
        logger.warning(format!("rotation line number {:02}", i));
    }
    manager.flush();

    let dir = manager.get_log_directory();
    let active = dir.join("app.log");
    assert!(active.exists());
    assert!(dir.join("app.log.1").exists());
    assert!(dir.join("app.log.2").exists());
    assert!(!dir.join("app.log.3").exists());

    for path in [active.clone(), dir.join("app.log.1"), dir.join("app.log.2")] {
        assert!(fs::metadata(&path)?.len() <= 200, "{} 크기 초과", path.display());
    }
    assert!(read_log(&active).contains("rotation line number 39"));

    Ok(())
}

/// 계층 로거는 루트 싱크로 전파되고, 자식 레벨 설정이 적용되어야 함
#[test]
fn test_module_loggers_share_root_sinks() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    manager.initialize(ConfigOverrides::new().with_log_filename("my_app.log"))?;

    manager.get_logger("module.a").info("모듈A: 작업A 실행");
    manager.get_logger("module.b").info("모듈B: 작업B 실행");
    manager.get_logger("module.b").warning("모듈B: 자원 부족 임박");
    manager.get_logger("module").set_level(LogLevel::Error);
    manager.get_logger("module.a").warning("필터링되어야 함");

    let content = read_log(&manager.get_log_directory().join("my_app.log"));
    assert!(content.contains("module.a - INFO - 모듈A: 작업A 실행"));
    assert!(content.contains("module.b - WARNING - 모듈B: 자원 부족 임박"));
    assert!(!content.contains("필터링되어야 함"));

    Ok(())
}

/// 상대 경로 로그 디렉토리는 프로젝트 루트 기준으로 해석되어야 함
#[test]
fn test_relative_log_dir_resolves_under_project_root() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    manager.initialize(ConfigOverrides::new().with_log_dir("./custom"))?;

    assert_eq!(
        manager.get_log_directory(),
        fs::canonicalize(temp_dir.path().join("project").join("custom"))?
    );

    Ok(())
}

/// 하위 경로가 있는 파일 이름을 열 수 없으면 임시 파일은 로그 디렉토리에 만들어져야 함
#[test]
fn test_nested_filename_falls_back_to_temp_file_in_log_dir() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, diag) = isolated_manager(&temp_dir);
    manager.initialize(ConfigOverrides::new().with_log_filename("sub/app.log"))?;

    let log_dir = manager.get_log_directory();
    let path = manager.log_file_path().expect("임시 파일 싱크");
    assert_eq!(path.parent(), Some(log_dir.as_path()));
    assert!(path.to_string_lossy().ends_with(".tmp.log"));
    assert_eq!(diag.count_containing("임시 로그 파일 사용"), 1);

    manager.get_logger("nested").warning("임시 파일에 기록");
    manager.flush();
    assert!(read_log(&path).contains("임시 파일에 기록"));

    Ok(())
}

/// 빈 파일 이름은 파일 싱크를 끄고, 콘솔까지 끄면 싱크가 없어야 함
#[test]
fn test_empty_filename_disables_file_sink() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    manager.initialize(ConfigOverrides::new().with_log_filename(""))?;

    manager.get_logger("nowhere").error("버려지는 메시지");

    assert!(manager.active_sinks().is_empty());
    assert!(manager.log_file_path().is_none());
    assert!(!manager.get_log_directory().join("app.log").exists());

    Ok(())
}

/// 여러 스레드가 동시에 처음 사용해도 초기화는 한 번만 일어나야 함
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_initializes_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, diag) = isolated_manager(&temp_dir);
    let manager = Arc::new(manager);

    let mut handles = Vec::new();
    for i in 0..10 {
        let manager = manager.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let logger = manager.get_logger(&format!("worker.{}", i));
            logger.warning(format!("worker {} ready", i));
            manager.get_log_directory()
        }));
    }

    let mut dirs = Vec::new();
    for handle in handles {
        dirs.push(handle.await?);
    }

    assert!(dirs.windows(2).all(|w| w[0] == w[1]));
    assert!(manager.is_initialized());
    assert_eq!(manager.registry().root().sinks().len(), 1);
    assert_eq!(diag.count_containing("이미 초기화됨"), 0);
    assert_eq!(diag.count_containing("로그 디렉토리 준비됨"), 1);

    manager.flush();
    let content = read_log(&dirs[0].join("app.log"));
    for i in 0..10 {
        assert!(content.contains(&format!("worker {} ready", i)));
    }

    Ok(())
}

/// 외부 프레임워크 로거는 루트로 전파하지 않고 공유 파일 싱크에 한 번만 기록해야 함
#[test]
fn test_external_framework_loggers_are_reconfigured() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    // 프레임워크가 자신의 로거를 먼저 등록한 상황
    manager.registry().get("uvicorn.error");

    manager.initialize(
        ConfigOverrides::new()
            .with_external_logging(true)
            .with_external_log_level("WARNING"),
    )?;

    for name in ["uvicorn", "uvicorn.error", "uvicorn.access"] {
        let logger = manager.registry().get(name);
        assert!(!logger.propagate());
        assert_eq!(logger.level(), Some(LogLevel::Warning));
        assert_eq!(logger.sinks().len(), 1);
    }

    manager.registry().get("uvicorn.access").info("필터링됨");
    manager.registry().get("uvicorn.access").error("GET /health 500");
    manager.flush();

    let content = read_log(&manager.get_log_directory().join("app.log"));
    assert_eq!(content.matches("GET /health 500").count(), 1);
    assert!(!content.contains("필터링됨"));

    Ok(())
}

/// 프레임워크가 없으면 아무 로거도 건드리지 않아야 함
#[test]
fn test_external_framework_absent_is_skipped() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    manager.initialize(
        ConfigOverrides::new()
            .with_external_logging(true)
            .with_log_level("DEBUG"),
    )?;

    assert!(!manager.registry().contains("uvicorn.access"));
    manager.flush();
    let content = read_log(&manager.get_log_directory().join("app.log"));
    assert!(content.contains("root - DEBUG"));

    Ok(())
}

/// 외부 설정 문서의 JSON 형태
#[test]
fn test_external_log_config_json_shape() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, _) = isolated_manager(&temp_dir);
    manager.initialize(
        ConfigOverrides::new()
            .with_log_level("WARNING")
            .with_external_log_level("ERROR"),
    )?;

    let json = manager.get_external_framework_log_config().to_json();

    assert_eq!(json["version"], 1);
    assert_eq!(json["disable_existing_loggers"], false);
    assert_eq!(json["formatters"]["custom"]["()"], "logging.Formatter");
    assert_eq!(
        json["formatters"]["custom"]["fmt"],
        "{timestamp} - {name} - {level} - {message}"
    );
    assert_eq!(json["formatters"]["custom"]["datefmt"], "%Y-%m-%d %H:%M:%S");
    assert_eq!(json["handlers"]["default"]["class"], "logging.StreamHandler");
    assert_eq!(json["handlers"]["default"]["stream"], "ext://sys.stderr");
    assert_eq!(json["loggers"][""]["level"], "WARNING");
    assert!(json["loggers"][""].get("propagate").is_none());
    for name in ["uvicorn", "uvicorn.error", "uvicorn.access"] {
        assert_eq!(json["loggers"][name]["level"], "ERROR");
        assert_eq!(json["loggers"][name]["propagate"], false);
        assert_eq!(json["loggers"][name]["handlers"][0], "default");
    }

    Ok(())
}

/// JSON 문서와 환경변수 형태의 설정 로드
#[test]
fn test_overrides_from_json_and_lookup() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, diag) = isolated_manager(&temp_dir);

    let from_json = ConfigOverrides::from_json_str(
        r#"{"log_level": "DEBUG", "log_filename": "json_app.log", "backup_count": 1}"#,
    )?;
    let from_env = ConfigOverrides::from_lookup(|key| match key {
        "EASYLOG_LOG_LEVEL" => Some("invalid".to_string()),
        "EASYLOG_MAX_BYTES" => Some("4096".to_string()),
        _ => None,
    });

    manager.initialize(from_env.overlay(from_json))?;

    let config = manager.config().expect("초기화된 설정");
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.max_bytes, 4096);
    assert_eq!(config.backup_count, 1);
    assert_eq!(config.log_filename.as_deref(), Some("json_app.log"));
    // 덮어쓰인 잘못된 레벨은 진단을 남기지 않음
    assert_eq!(diag.count_containing("invalid"), 0);

    manager.get_logger("json").debug("json 설정 적용");
    manager.flush();
    assert!(read_log(&manager.get_log_directory().join("json_app.log")).contains("json 설정 적용"));

    Ok(())
}

/// 잘못된 레벨 이름은 INFO로 대체되고 진단을 정확히 한 번 남겨야 함
#[test]
fn test_invalid_level_falls_back_to_info() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (manager, diag) = isolated_manager(&temp_dir);
    manager.initialize(ConfigOverrides::new().with_log_level("invalid"))?;

    assert_eq!(manager.registry().root().level(), Some(LogLevel::Info));
    assert_eq!(diag.count_containing("invalid"), 1);

    Ok(())
}
