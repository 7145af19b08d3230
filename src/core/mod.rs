//! 核心编排层：错误分类、视图路由、状态投影、命令运行时

pub mod error;
pub mod orchestrator;
pub mod router;
pub mod state;

pub use error::ClientError;
pub use orchestrator::{create_client, ClientRuntime, Command};
pub use router::{View, ViewRouter};
pub use state::UiState;
