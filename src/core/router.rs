//! 视图路由：四个视图的有限状态机
//!
//! 任一时刻恰好一个视图处于活动状态。合法边：Login→{Setup, Chat}（登录后分流）、
//! Setup↔Chat（跳过 / 回到密钥配置）、Chat↔Crud（员工目录）。其余转移一律拒绝
//! （包括回到 Login——没有登出语义）。进入 Crud 时的目录刷新由编排器在转移成功后执行。

use serde::Serialize;

/// 活动视图
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum View {
    Login,
    Setup,
    Chat,
    Crud,
}

/// 视图状态机：持有当前视图，navigate 校验并执行转移
#[derive(Debug)]
pub struct ViewRouter {
    active: View,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            active: View::Login,
        }
    }

    pub fn active(&self) -> View {
        self.active
    }

    /// 尝试转移到 target；非法转移是 no-op 并返回 false
    pub fn navigate(&mut self, target: View) -> bool {
        if self.allowed(target) {
            self.active = target;
            true
        } else {
            false
        }
    }

    fn allowed(&self, target: View) -> bool {
        matches!(
            (self.active, target),
            (View::Login, View::Setup)
                | (View::Login, View::Chat)
                | (View::Setup, View::Chat)
                | (View::Chat, View::Setup)
                | (View::Chat, View::Crud)
                | (View::Crud, View::Chat)
        )
    }
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}
