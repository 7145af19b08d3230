//! HTTP 传输层：所有远程调用的唯一出口
//!
//! 每次调用只尝试一次：无重试、无超时配置。失败分为三类（连不上 / 非成功状态 /
//! 响应体解码失败），如何处理由上层组件决定。

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

/// 传输失败分类
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// 完全没有拿到响应（DNS、连接拒绝、超时）
    #[error("Connection failed: {0}")]
    Network(String),

    /// 拿到响应但状态码不在成功区间；detail 为服务端给出的可读信息（若有）
    #[error("Server error (status {status})")]
    Server { status: u16, detail: Option<String> },

    /// 状态码成功但响应体不是期望的 JSON
    #[error("Response decode failed: {0}")]
    Decode(String),
}

/// 传输抽象：组件只依赖此 trait，便于用 MockTransport 做离线测试
#[async_trait]
pub trait Transport: Send + Sync {
    /// 对 `base_url + path` 发起一次请求，body 存在时作为 JSON 发送
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;
}

/// 基于 reqwest 的真实传输
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// base_url 末尾的 `/` 会被去掉，端点路径统一以 `/` 开头拼接
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            // FastAPI 风格的错误体带 {"detail": "..."}，尽量取出给用户看
            let detail = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string));
            return Err(TransportError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// 录制调用并按脚本回放响应的传输（测试用，不发任何网络请求）
///
/// 组件测试先用 `push_ok`/`push_err` 排好响应队列，再断言 `calls()` 里的
/// 方法、路径与请求体。队列耗尽后默认返回 Null 成功。
#[derive(Default)]
pub struct MockTransport {
    calls: std::sync::Mutex<Vec<RecordedCall>>,
    responses: std::sync::Mutex<std::collections::VecDeque<Result<Value, TransportError>>>,
}

/// 一次被录制的调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_err(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// 到目前为止的全部调用记录
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}
