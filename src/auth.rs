//! 认证控制：登录与登录后分流
//!
//! 登录成功后立即查询该用户是否已配置过 vault 密钥，据此决定进入 Setup 还是 Chat。
//! Session.username 只在这里写入；再次登录直接覆盖（单进程单会话模型）。

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use crate::core::{ClientError, View};
use crate::transport::Transport;

/// 当前会话：登录时创建，进程结束时消亡（没有登出语义）
#[derive(Clone, Debug)]
pub struct Session {
    pub username: String,
    pub has_vault_keys: bool,
}

/// 认证控制器：唯一的 Session 写入者
pub struct AuthController {
    transport: Arc<dyn Transport>,
    session: Option<Session>,
}

impl AuthController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.username.as_str())
    }

    /// 提交凭据；成功后查询 check-keys 并返回应进入的视图
    ///
    /// 有意不做本地空字段校验：与观察到的行为一致，空提交由服务端报错。
    /// check-keys 失败时会话保持已登录（用户名已写入），错误原样上抛，调用方留在 Login。
    pub async fn login(&mut self, username: &str, password: &str) -> Result<View, ClientError> {
        self.transport
            .call(
                Method::POST,
                "/auth/login",
                Some(json!({"username": username, "password": password})),
            )
            .await?;

        // 登录成功即覆盖会话
        self.session = Some(Session {
            username: username.to_string(),
            has_vault_keys: false,
        });

        let resp = self
            .transport
            .call(
                Method::GET,
                &format!("/user/check-keys/{}", username),
                None,
            )
            .await?;
        let has_keys = resp
            .get("has_keys")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if let Some(session) = self.session.as_mut() {
            session.has_vault_keys = has_keys;
        }

        tracing::info!(username, has_keys, "login ok");
        Ok(if has_keys { View::Chat } else { View::Setup })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};
    use serde_json::json;

    fn controller(mock: Arc<MockTransport>) -> AuthController {
        AuthController::new(mock)
    }

    #[tokio::test]
    async fn test_login_without_keys_goes_to_setup() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({}));
        mock.push_ok(json!({"has_keys": false}));

        let mut auth = controller(mock.clone());
        let dest = auth.login("alice", "pw").await.unwrap();
        assert_eq!(dest, View::Setup);

        let session = auth.session().unwrap();
        assert_eq!(session.username, "alice");
        assert!(!session.has_vault_keys);

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].path, "/auth/login");
        assert_eq!(
            calls[0].body,
            Some(json!({"username": "alice", "password": "pw"}))
        );
        assert_eq!(calls[1].method, Method::GET);
        assert_eq!(calls[1].path, "/user/check-keys/alice");
    }

    #[tokio::test]
    async fn test_login_with_keys_goes_to_chat() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({}));
        mock.push_ok(json!({"has_keys": true}));

        let mut auth = controller(mock);
        let dest = auth.login("bob", "secret").await.unwrap();
        assert_eq!(dest, View::Chat);
        assert!(auth.session().unwrap().has_vault_keys);
    }

    #[tokio::test]
    async fn test_login_failure_keeps_no_session() {
        let mock = Arc::new(MockTransport::new());
        mock.push_err(TransportError::Server {
            status: 401,
            detail: Some("Invalid credentials".into()),
        });

        let mut auth = controller(mock.clone());
        let err = auth.login("alice", "wrong").await.unwrap_err();
        match err {
            ClientError::Transport(TransportError::Server { detail, .. }) => {
                assert_eq!(detail.as_deref(), Some("Invalid credentials"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(auth.session().is_none());
        // 登录失败不再查询 check-keys
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_relogin_overwrites_session() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({}));
        mock.push_ok(json!({"has_keys": false}));
        mock.push_ok(json!({}));
        mock.push_ok(json!({"has_keys": true}));

        let mut auth = controller(mock);
        auth.login("alice", "pw").await.unwrap();
        auth.login("carol", "pw2").await.unwrap();
        assert_eq!(auth.username(), Some("carol"));
    }

    #[tokio::test]
    async fn test_check_keys_failure_keeps_username() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({}));
        mock.push_err(TransportError::Network("timeout".into()));

        let mut auth = controller(mock);
        assert!(auth.login("alice", "pw").await.is_err());
        // 用户名已写入，密钥状态保持默认 false
        assert_eq!(auth.username(), Some("alice"));
    }
}
