//! 状态投影：UI 渲染所需的快照
//!
//! UI 只拿轻量的 UiState；完整状态（会话、各组件）由 ClientRuntime 维护并投影过来。

use serde::Serialize;

use crate::chat::Message;
use crate::core::View;
use crate::directory::Employee;

/// UI 看到的「投影」状态
#[derive(Clone, Debug, Serialize)]
pub struct UiState {
    /// 当前活动视图，任一时刻恰好一个
    pub view: View,
    pub username: Option<String>,
    /// 状态行文字（"Ready 🟢"、"Connection Failed ❌" 等）
    pub status: String,
    pub conversation: Vec<Message>,
    pub employees: Vec<Employee>,
    /// 命令处理期间锁输入（同一时刻至多一个请求在途）
    pub input_locked: bool,
    /// 密钥保存成功的单调计数，UI 据此清空 key 输入框
    pub vault_save_seq: u64,
    /// 员工创建成功的单调计数，UI 据此清空表单
    pub employee_create_seq: u64,
}

/// 状态行的就绪文案（沿用原前端的写法）
pub const STATUS_READY: &str = "Ready 🟢";

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: View::Login,
            username: None,
            status: STATUS_READY.to_string(),
            conversation: Vec::new(),
            employees: Vec::new(),
            input_locked: false,
            vault_save_seq: 0,
            employee_create_seq: 0,
        }
    }
}
