//! Advocate - 多角色辩论智能体
//!
//! 入口：初始化日志、加载配置、启动编排运行时与 TUI，并运行主循环。

use anyhow::Context;
use advocate::config::{load_config, AppConfig};
use advocate::core::create_debate;
use advocate::observability;
use advocate::ui::run_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // TUI 占用终端，日志写文件；RUST_LOG 可调整级别
    if let Err(e) = observability::init_to_file("advocate.log") {
        observability::init();
        tracing::warn!("Cannot open advocate.log ({}), logging to stderr", e);
    }

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    // 后台任务随进程退出；不等待进行中的回合
    let (handle, _runtime) = create_debate(&cfg);

    run_app(handle.clone()).await.context("App run failed")?;

    handle.quit();
    Ok(())
}
