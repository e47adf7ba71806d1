//! easylog 사용 예제
//!
//! 1. 사용자 설정으로 초기화
//! 2. 레벨별 로그 출력
//! 3. 여러 모듈에서 로거 사용
//! 4. 여러 비동기 작업에서 동시에 기록
//! 5. tracing 이벤트 연동
//! 6. 외부 프레임워크용 설정 문서 출력

use anyhow::{Context, Result};
use std::time::Duration;
use easylog::logging::{
    configure, get_external_framework_log_config, get_log_directory, get_logger,
    install_tracing_bridge, shutdown, ConfigOverrides, LoggerManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    let overrides = ConfigOverrides::new()
        .with_log_level("DEBUG")
        .with_log_filename("my_app.log")
        .with_log_dir("./app_logs")
        .with_max_bytes(10 * 1024 * 1024)
        .with_backup_count(5)
        .with_console_output(true);

    configure(overrides).context("로깅 초기화 실패")?;

    let logger = get_logger("my_application");
    logger.debug("디버그 메시지");
    logger.info("애플리케이션 시작");
    logger.warning("경고 메시지");
    logger.error("에러 메시지");
    logger.critical("치명적 에러 메시지");

    println!("로그 디렉토리: {}", get_log_directory().display());

    module_a();
    module_b();

    run_workers(3).await.context("작업 실행 실패")?;

    install_tracing_bridge(LoggerManager::global()).context("tracing 연동 실패")?;
    tracing::info!(user = "demo", "tracing 이벤트도 같은 파일에 기록됨");

    let document = get_external_framework_log_config()
        .to_json_pretty()
        .context("설정 문서 직렬화 실패")?;
    println!("외부 프레임워크 로그 설정:\n{}", document);

    shutdown();
    Ok(())
}

/// 워커 작업들이 각자 이름 있는 로거로 동시에 기록
async fn run_workers(count: usize) -> Result<()> {
    let mut handles = Vec::with_capacity(count);
    for id in 0..count {
        handles.push(tokio::spawn(async move {
            let logger = get_logger(&format!("worker.{}", id));
            logger.info(format!("워커 {} 시작", id));
            tokio::time::sleep(Duration::from_millis(10 * (id as u64 + 1))).await;
            logger.info(format!("워커 {} 완료", id));
        }));
    }

    for handle in handles {
        handle.await?;
    }
    Ok(())
}

fn module_a() {
    let logger = get_logger("module.a");
    logger.info("모듈A: 작업A 실행");
}

fn module_b() {
    let logger = get_logger("module.b");
    logger.info("모듈B: 작업B 실행");
    logger.warning("모듈B: 자원 부족 임박");
}
