//! 会话全流程集成测试
//!
//! 用 MockTransport 驱动 ClientRuntime 走一遍典型会话：
//! 登录 → Setup 配置密钥 → 进入 Chat 对话 → 进入 Crud 管理员工目录。

use std::sync::Arc;

use serde_json::json;
use vaultdesk::core::{ClientRuntime, Command, View};
use vaultdesk::transport::{MockTransport, TransportError};

fn employee(id: i64, name: &str) -> serde_json::Value {
    json!({"id": id, "name": name, "role": "Engineer", "department": "R&D", "salary": 50000.0})
}

#[tokio::test]
async fn test_full_session_flow() {
    let mock = Arc::new(MockTransport::new());
    let mut rt = ClientRuntime::new(mock.clone());

    // 登录：无已配置密钥 → Setup
    mock.push_ok(json!({}));
    mock.push_ok(json!({"has_keys": false}));
    rt.handle(Command::Login {
        username: "alice".into(),
        password: "pw".into(),
    })
    .await;
    let state = rt.snapshot();
    assert_eq!(state.view, View::Setup);
    assert_eq!(state.username.as_deref(), Some("alice"));

    // 配置 GROQ 密钥：恰好一次 POST，状态行带服务名
    mock.push_ok(json!({}));
    rt.handle(Command::SaveKey {
        service: "GROQ".into(),
        api_key: "gsk_x".into(),
    })
    .await;
    let state = rt.snapshot();
    assert!(state.status.contains("GROQ"));
    assert_eq!(state.vault_save_seq, 1);
    {
        let calls = mock.calls();
        let save = &calls[2];
        assert_eq!(save.path, "/vault/save");
        assert_eq!(
            save.body,
            Some(json!({"username": "alice", "service_name": "GROQ", "api_key": "gsk_x"}))
        );
    }

    // 进入 Chat，发送一条消息：历史字段是「发送前」的对话（首条为空数组）
    rt.handle(Command::Navigate(View::Chat)).await;
    mock.push_ok(json!({"status": "SUCCESS", "reply": "hi"}));
    rt.handle(Command::SendMessage("hello".into())).await;
    let state = rt.snapshot();
    assert_eq!(state.conversation.len(), 2);
    assert_eq!(state.conversation[0].text, "hello");
    assert_eq!(state.conversation[1].text, "hi");
    {
        let calls = mock.calls();
        let chat = calls.last().unwrap();
        assert_eq!(chat.path, "/chat");
        assert_eq!(chat.body.as_ref().unwrap()["history"], json!([]));
    }

    // 进入 Crud：转移本身触发目录刷新
    mock.push_ok(json!([employee(7, "Dana")]));
    rt.handle(Command::Navigate(View::Crud)).await;
    let state = rt.snapshot();
    assert_eq!(state.view, View::Crud);
    assert_eq!(state.employees.len(), 1);

    // 创建：数值 salary，成功后重拉
    mock.push_ok(json!({}));
    mock.push_ok(json!([employee(7, "Dana"), employee(8, "Eve")]));
    rt.handle(Command::CreateEmployee {
        name: "Eve".into(),
        role: "Engineer".into(),
        department: "R&D".into(),
        salary: "50000".into(),
    })
    .await;
    let state = rt.snapshot();
    assert_eq!(state.employees.len(), 2);
    {
        let calls = mock.calls();
        let create = &calls[calls.len() - 2];
        assert_eq!(create.path, "/employees");
        assert!(create.body.as_ref().unwrap()["salary"].is_number());
    }

    // 删除失败：仍会重拉，记录还在列表里（可见的失败信号）
    mock.push_err(TransportError::Server {
        status: 500,
        detail: None,
    });
    mock.push_ok(json!([employee(7, "Dana"), employee(8, "Eve")]));
    rt.handle(Command::DeleteEmployee(7)).await;
    let state = rt.snapshot();
    assert!(state.employees.iter().any(|e| e.id == 7));

    // 回到 Chat：对话历史仍然在
    rt.handle(Command::Navigate(View::Chat)).await;
    assert_eq!(rt.snapshot().conversation.len(), 2);
}

#[tokio::test]
async fn test_chat_history_accumulates_across_sends() {
    let mock = Arc::new(MockTransport::new());
    let mut rt = ClientRuntime::new(mock.clone());

    mock.push_ok(json!({}));
    mock.push_ok(json!({"has_keys": true}));
    rt.handle(Command::Login {
        username: "alice".into(),
        password: "pw".into(),
    })
    .await;

    mock.push_ok(json!({"status": "SUCCESS", "reply": "one"}));
    mock.push_ok(json!({"status": "SUCCESS", "reply": "two"}));
    rt.handle(Command::SendMessage("first".into())).await;
    rt.handle(Command::SendMessage("second".into())).await;

    // 第二次发送携带第一轮完整历史，且不含正在发送的 "second"
    let calls = mock.calls();
    let body = calls.last().unwrap().body.as_ref().unwrap();
    assert_eq!(
        body["history"],
        json!([
            {"role": "user", "text": "first"},
            {"role": "agent", "text": "one"},
        ])
    );
    assert_eq!(rt.snapshot().conversation.len(), 4);
}
