//! 对话管理：消息历史与乐观追加
//!
//! 历史只追加、从不重排或去重。发送流程：先把用户消息落到本地（乐观追加，
//! 失败也不回滚），再带着「追加之前」的历史调用 /chat——消息本体走独立字段，
//! 历史里不含它的回声，这正是远端智能体收到的上下文，顺序必须原样保持。

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::ClientError;
use crate::transport::{Transport, TransportError};

/// 消息角色（与 /chat 的 history 线格式一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
        }
    }
}

/// 对话管理器：持有本进程生命周期内的完整历史
pub struct ConversationManager {
    transport: Arc<dyn Transport>,
    messages: Vec<Message>,
}

impl ConversationManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// 发送一条消息
    ///
    /// 1. 空文本直接拦截（零网络请求）
    /// 2. 先序列化「此刻之前」的历史，再乐观追加用户消息
    /// 3. 成功（status == "SUCCESS"）追加智能体回复；服务端报非成功为业务失败，
    ///    传输失败原样上抛——两者都不追加智能体消息，用户消息保持在位
    pub async fn send(&mut self, username: &str, text: &str) -> Result<(), ClientError> {
        if text.is_empty() {
            return Err(ClientError::Validation("Message is empty".into()));
        }

        let history = serde_json::to_value(&self.messages)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        self.messages.push(Message::user(text));

        let resp = self
            .transport
            .call(
                Method::POST,
                "/chat",
                Some(json!({
                    "username": username,
                    "message": text,
                    "history": history,
                })),
            )
            .await?;

        let status = resp.get("status").and_then(Value::as_str).unwrap_or("");
        if status != "SUCCESS" {
            return Err(ClientError::Domain(format!(
                "Agent reported failure ({})",
                if status.is_empty() { "no status" } else { status }
            )));
        }

        let reply = resp
            .get("reply")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::Decode("chat reply missing".into()))?;
        self.messages.push(Message::agent(reply));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn manager(mock: Arc<MockTransport>) -> ConversationManager {
        ConversationManager::new(mock)
    }

    #[tokio::test]
    async fn test_successful_send_appends_pair() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({"status": "SUCCESS", "reply": "hi"}));

        let mut chat = manager(mock.clone());
        chat.send("alice", "hello").await.unwrap();

        assert_eq!(
            chat.messages(),
            &[Message::user("hello"), Message::agent("hi")]
        );

        // 第一条消息的 history 是空数组，消息走独立字段
        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["message"], "hello");
        assert_eq!(body["history"], json!([]));
    }

    #[tokio::test]
    async fn test_history_excludes_message_being_sent() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({"status": "SUCCESS", "reply": "one"}));
        mock.push_ok(json!({"status": "SUCCESS", "reply": "two"}));

        let mut chat = manager(mock.clone());
        chat.send("alice", "first").await.unwrap();
        chat.send("alice", "second").await.unwrap();

        let calls = mock.calls();
        let body = calls[1].body.as_ref().unwrap();
        // 第二次发送时历史 = 第一轮的 user/agent 两条，不含 "second"
        assert_eq!(
            body["history"],
            json!([
                {"role": "user", "text": "first"},
                {"role": "agent", "text": "one"},
            ])
        );
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_message() {
        let mock = Arc::new(MockTransport::new());
        mock.push_err(crate::transport::TransportError::Network("refused".into()));

        let mut chat = manager(mock);
        assert!(chat.send("alice", "hello").await.is_err());

        // 乐观追加不回滚：历史长度恰好 +1
        assert_eq!(chat.messages(), &[Message::user("hello")]);
    }

    #[tokio::test]
    async fn test_domain_failure_appends_no_agent_message() {
        let mock = Arc::new(MockTransport::new());
        mock.push_ok(json!({"status": "FAILSAFE", "reply": "ignored"}));

        let mut chat = manager(mock);
        let err = chat.send("alice", "hello").await.unwrap_err();
        assert!(matches!(err, ClientError::Domain(_)));
        assert_eq!(chat.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_blocked_locally() {
        let mock = Arc::new(MockTransport::new());
        let mut chat = manager(mock.clone());

        let err = chat.send("alice", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn test_length_is_2n_after_n_successes() {
        let mock = Arc::new(MockTransport::new());
        for i in 0..3 {
            mock.push_ok(json!({"status": "SUCCESS", "reply": format!("r{i}")}));
        }

        let mut chat = manager(mock);
        for i in 0..3 {
            chat.send("alice", &format!("m{i}")).await.unwrap();
        }
        assert_eq!(chat.messages().len(), 6);
    }
}
