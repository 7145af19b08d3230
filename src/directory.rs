//! 员工目录：服务端真相的全量替换缓存
//!
//! 缓存从不做增量合并：list 整体覆盖，create 成功后重拉，delete 不管成败都重拉
//! （删除失败时记录仍然在列表里，这本身就是给用户的失败信号）。

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::ClientError;
use crate::transport::{Transport, TransportError};

/// 员工记录；id 由服务端分配，客户端只透传
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub department: String,
    pub salary: f64,
}

pub struct EmployeeDirectory {
    transport: Arc<dyn Transport>,
    employees: Vec<Employee>,
}

impl EmployeeDirectory {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            employees: Vec::new(),
        }
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// 拉取全部记录并整体替换缓存
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let resp = self.transport.call(Method::GET, "/employees", None).await?;
        let records: Vec<Employee> = serde_json::from_value(resp)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        self.employees = records;
        Ok(())
    }

    /// 创建一条记录；salary 以字符串进来，必须解析为有限数字才会发请求
    /// （线格式要求 salary 是 JSON number，绝不发字符串或 NaN）。
    /// 成功后整体重拉；失败时缓存原样不动。
    pub async fn create(
        &mut self,
        name: &str,
        role: &str,
        department: &str,
        salary: &str,
    ) -> Result<(), ClientError> {
        if name.is_empty() {
            return Err(ClientError::Validation("Name is empty".into()));
        }
        let salary: f64 = salary
            .trim()
            .parse()
            .map_err(|_| ClientError::Validation("Salary must be a number".into()))?;
        if !salary.is_finite() {
            return Err(ClientError::Validation("Salary must be a number".into()));
        }

        self.transport
            .call(
                Method::POST,
                "/employees",
                Some(json!({
                    "name": name,
                    "role": role,
                    "department": department,
                    "salary": salary,
                })),
            )
            .await?;

        self.refresh().await
    }

    /// 按 id 删除，然后无条件重拉（fire-and-refresh）
    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        let deleted = self
            .transport
            .call(Method::DELETE, &format!("/employees/{}", id), None)
            .await;

        self.refresh().await?;
        deleted?;
        Ok(())
    }
}
