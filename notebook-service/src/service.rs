//! 笔记本导出服务模块

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use common::errors::AppResult;
use common::models::connection::ConnectionConfig;
use crate::store::{NotebookStore, SqlNotebookStore};

/// 导出结果：状态码与响应体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl DumpResponse {
    fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

impl IntoResponse for DumpResponse {
    fn into_response(self) -> Response {
        if self.status == StatusCode::OK {
            (self.status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
        } else {
            self.status.into_response()
        }
    }
}

/// notebook 表导出处理器
///
/// 不持有连接；每次 [`handle`](Self::handle) 都由数据源重新建立连接。
pub struct NotebookDumpHandler {
    store: Arc<dyn NotebookStore>,
}

impl NotebookDumpHandler {
    /// 使用数据库连接配置创建处理器
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_store(Arc::new(SqlNotebookStore::new(config)))
    }

    /// 使用自定义数据源创建处理器
    pub fn with_store(store: Arc<dyn NotebookStore>) -> Self {
        Self { store }
    }

    /// 读取全部行并编码为 JSON 数组
    pub async fn dump(&self) -> AppResult<String> {
        let rows = self.store.fetch_all().await?;
        let body = serde_json::to_string(&rows)?;
        tracing::info!(rows = rows.len(), bytes = body.len(), "notebook dumped");
        Ok(body)
    }

    /// 执行一次导出，错误折叠为空响应体的状态码
    pub async fn handle(&self) -> DumpResponse {
        match self.dump().await {
            Ok(body) => DumpResponse::ok(body),
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "notebook dump failed");
                DumpResponse::empty(e.status_code())
            }
        }
    }
}
