//! 密钥配置：向后端写入服务凭据
//!
//! API key 是只写的：提交后本客户端不再以任何形式读回或回显。
//! 空 key 是本地静默守卫（不发请求、不改状态），与登录的「不拦截空提交」刻意不同。

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;

use crate::core::ClientError;
use crate::transport::Transport;

/// save 的结果：成功时带一条含服务名的确认文案；空 key 时什么都没发生
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 已写入，文案用于状态行（含服务名，如 "GROQ Configured ✅"）
    Saved(String),
    /// 空 key，零网络请求
    EmptyKey,
}

pub struct VaultConfigurator {
    transport: Arc<dyn Transport>,
}

impl VaultConfigurator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// 提交一条凭据。成功后调用方应立即清空输入缓冲。
    ///
    /// 失败会作为 Err 返回；观察到的原设计里状态行只在成功时更新，
    /// 失败如何呈现由编排器决定（目前仅记日志，见 DESIGN.md）。
    pub async fn save(
        &self,
        username: &str,
        service: &str,
        api_key: &str,
    ) -> Result<SaveOutcome, ClientError> {
        if api_key.is_empty() {
            return Ok(SaveOutcome::EmptyKey);
        }

        self.transport
            .call(
                Method::POST,
                "/vault/save",
                Some(json!({
                    "username": username,
                    "service_name": service,
                    "api_key": api_key,
                })),
            )
            .await?;

        Ok(SaveOutcome::Saved(format!("{} Configured ✅", service)))
    }
}
