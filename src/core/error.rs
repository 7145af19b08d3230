//! 客户端错误类型
//!
//! 三类：本地校验失败（不发网络请求）、传输失败（见 transport）、
//! 业务失败（响应格式正确但服务端明确报告非成功，如 chat status != SUCCESS）。
//! 所有错误都在编排器边界转成状态行文字，不会让进程崩溃。

use thiserror::Error;

use crate::transport::TransportError;

/// 组件操作可能返回的错误
#[derive(Error, Debug)]
pub enum ClientError {
    /// 本地输入校验失败，调用被整体拦截，零网络请求
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 响应结构正常但业务语义为失败
    #[error("{0}")]
    Domain(String),
}
