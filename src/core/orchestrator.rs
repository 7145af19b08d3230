//! 客户端运行时：主控循环
//!
//! 负责：加载配置、创建传输与各组件、建立 cmd/state 两通道，
//! 并在后台任务中串行消费用户命令、驱动组件调用并向 UI 投影状态快照。
//!
//! 命令在单任务里一条条处理，同一时刻至多一个请求在途、完成顺序即提交顺序；
//! 处理期间快照带 input_locked，UI 据此锁输入（串行化决策见 DESIGN.md）。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::auth::AuthController;
use crate::chat::ConversationManager;
use crate::config::{load_config, AppConfig};
use crate::core::state::STATUS_READY;
use crate::core::{ClientError, UiState, View, ViewRouter};
use crate::directory::EmployeeDirectory;
use crate::transport::{HttpTransport, Transport, TransportError};
use crate::vault::{SaveOutcome, VaultConfigurator};

/// 从 UI 发往运行时的用户命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 提交登录凭据
    Login { username: String, password: String },
    /// 保存一条服务密钥
    SaveKey { service: String, api_key: String },
    /// 发送一条对话消息
    SendMessage(String),
    /// 用户主动切换视图（进入 Crud 会触发目录刷新）
    Navigate(View),
    /// 创建员工记录（salary 为原始输入，发送前解析）
    CreateEmployee {
        name: String,
        role: String,
        department: String,
        salary: String,
    },
    /// 按 id 删除员工记录
    DeleteEmployee(i64),
    /// 退出应用
    Quit,
}

/// 把组件错误转成状态行文字；登录失败时服务端 detail 原样展示
fn failure_status(e: &ClientError) -> String {
    match e {
        ClientError::Validation(m) => format!("Error: {} ⚠️", m),
        ClientError::Transport(TransportError::Network(_)) => "Connection Failed ❌".to_string(),
        ClientError::Transport(TransportError::Server {
            detail: Some(d), ..
        }) => format!("{} ❌", d),
        ClientError::Transport(TransportError::Server { .. })
        | ClientError::Transport(TransportError::Decode(_)) => "Server Error ❌".to_string(),
        ClientError::Domain(m) => format!("{} ❌", m),
    }
}

/// 命令在途期间的状态行文字；纯本地命令返回 None（不发锁定快照）
fn pending_status(cmd: &Command) -> Option<&'static str> {
    match cmd {
        Command::Login { .. } => Some("Signing in..."),
        Command::SaveKey { .. } => Some("Saving..."),
        Command::SendMessage(_) => Some("Thinking..."),
        Command::CreateEmployee { .. } | Command::DeleteEmployee(_) => Some("Working..."),
        Command::Navigate(View::Crud) => Some("Loading..."),
        Command::Navigate(_) | Command::Quit => None,
    }
}

/// 运行时：持有全部权威状态（会话、对话、目录缓存、视图），一次处理一条命令
pub struct ClientRuntime {
    auth: AuthController,
    vault: VaultConfigurator,
    conversation: ConversationManager,
    directory: EmployeeDirectory,
    router: ViewRouter,
    status: String,
    vault_save_seq: u64,
    employee_create_seq: u64,
}

impl ClientRuntime {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            auth: AuthController::new(transport.clone()),
            vault: VaultConfigurator::new(transport.clone()),
            conversation: ConversationManager::new(transport.clone()),
            directory: EmployeeDirectory::new(transport),
            router: ViewRouter::new(),
            status: STATUS_READY.to_string(),
            vault_save_seq: 0,
            employee_create_seq: 0,
        }
    }

    /// 当前状态的 UI 投影
    pub fn snapshot(&self) -> UiState {
        UiState {
            view: self.router.active(),
            username: self.auth.username().map(str::to_string),
            status: self.status.clone(),
            conversation: self.conversation.messages().to_vec(),
            employees: self.directory.employees().to_vec(),
            input_locked: false,
            vault_save_seq: self.vault_save_seq,
            employee_create_seq: self.employee_create_seq,
        }
    }

    fn snapshot_pending(&self, status: &str) -> UiState {
        let mut s = self.snapshot();
        s.status = status.to_string();
        s.input_locked = true;
        s
    }

    /// 处理一条命令并更新内部状态；所有失败都收敛在这里，不向外传播
    pub async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Login { username, password } => {
                match self.auth.login(&username, &password).await {
                    Ok(dest) => {
                        self.router.navigate(dest);
                        self.status = STATUS_READY.to_string();
                    }
                    // 失败留在 Login，状态行给出原因
                    Err(e) => self.status = failure_status(&e),
                }
            }

            Command::SaveKey { service, api_key } => {
                let username = self.auth.username().unwrap_or_default().to_string();
                match self.vault.save(&username, &service, &api_key).await {
                    Ok(SaveOutcome::Saved(msg)) => {
                        self.status = msg;
                        self.vault_save_seq += 1;
                    }
                    // 空 key：静默守卫，不发请求也不改状态行
                    Ok(SaveOutcome::EmptyKey) => {}
                    // 原设计的状态行只在成功时更新，失败仅记日志
                    Err(e) => tracing::warn!(error = %e, "vault save failed"),
                }
            }

            Command::SendMessage(text) => {
                let username = self.auth.username().unwrap_or_default().to_string();
                match self.conversation.send(&username, &text).await {
                    Ok(()) => self.status = STATUS_READY.to_string(),
                    // 用户消息已乐观落地，这里只更新状态行
                    Err(e) => self.status = failure_status(&e),
                }
            }

            Command::Navigate(target) => {
                if self.router.navigate(target) && target == View::Crud {
                    // 目录刷新是「进入 Crud」这个转移本身的副作用
                    match self.directory.refresh().await {
                        Ok(()) => self.status = STATUS_READY.to_string(),
                        Err(e) => self.status = failure_status(&e),
                    }
                }
            }

            Command::CreateEmployee {
                name,
                role,
                department,
                salary,
            } => {
                match self
                    .directory
                    .create(&name, &role, &department, &salary)
                    .await
                {
                    Ok(()) => {
                        self.status = STATUS_READY.to_string();
                        self.employee_create_seq += 1;
                    }
                    // 本地校验失败要提示（请求根本没发）
                    Err(e @ ClientError::Validation(_)) => self.status = failure_status(&e),
                    // 远端失败：缓存与表单原样不动，仅记日志（观察到的缺口，见 DESIGN.md）
                    Err(e) => tracing::warn!(error = %e, "employee create failed"),
                }
            }

            Command::DeleteEmployee(id) => {
                // 删除失败的信号是刷新后记录仍在列表里
                if let Err(e) = self.directory.delete(id).await {
                    tracing::warn!(error = %e, id, "employee delete failed");
                }
            }

            Command::Quit => {}
        }
    }
}

/// 创建客户端运行时：返回命令发送端与状态接收端；后台任务消费命令并更新 state
pub async fn create_client(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<UiState>)> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    tracing::info!(base_url = %cfg.backend.base_url, "Using backend");

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&cfg.backend.base_url));
    let mut runtime = ClientRuntime::new(transport);

    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(runtime.snapshot());

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if matches!(cmd, Command::Quit) {
                break;
            }
            if let Some(pending) = pending_status(&cmd) {
                let _ = state_tx.send(runtime.snapshot_pending(pending));
            }
            runtime.handle(cmd).await;
            let _ = state_tx.send(runtime.snapshot());
        }
    });

    Ok((cmd_tx, state_rx))
}
