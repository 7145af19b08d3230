//! vaultdesk - Agentic Vault 终端客户端
//!
//! 入口：初始化日志、创建客户端运行时与 TUI，并运行主循环。

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vaultdesk::{core::create_client, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    // 创建运行时：返回命令发送端、状态接收端
    let (cmd_tx, state_rx) = create_client(None)
        .await
        .context("Failed to create client runtime")?;

    // 启动 TUI 主循环（消费 state，向 cmd_tx 发送用户命令）
    run_app(state_rx, cmd_tx).await.context("App run failed")?;

    Ok(())
}
