//! vaultdesk - Agentic Vault 终端客户端
//!
//! 模块划分：
//! - **auth**: 登录与会话（Session 的唯一写入者）
//! - **chat**: 对话历史与乐观追加
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、视图路由、状态投影、命令运行时
//! - **directory**: 员工目录（服务端真相的全量替换缓存）
//! - **transport**: HTTP 传输与 Mock 传输
//! - **ui**: Ratatui TUI 界面
//! - **vault**: 服务密钥的只写提交

pub mod auth;
pub mod chat;
pub mod config;
pub mod core;
pub mod directory;
pub mod transport;
pub mod ui;
pub mod vault;
