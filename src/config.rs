//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `VAULTDESK__*` 覆盖（双下划线表示嵌套，
//! 如 `VAULTDESK__BACKEND__BASE_URL=http://10.0.0.2:8080`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendSection,
}

/// [backend] 段：后端服务地址
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    /// 后端基地址，所有端点路径都拼接在其后
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 VAULTDESK__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 VAULTDESK__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("VAULTDESK")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_base_url() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.backend.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[backend]\nbase_url = \"http://192.168.0.105:8080\"").unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.backend.base_url, "http://192.168.0.105:8080");
    }
}
