//! Handler模块

use axum::{extract::State, response::Response, Json};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// 导出 notebook 表全部行
///
/// 成功时返回 JSON 对象数组，键为表的列名；连接或查询失败时返回空响应体。
#[utoipa::path(
    get,
    path = "/api/notebook",
    tag = "notebook",
    responses(
        (status = 200, description = "notebook 表全部行的 JSON 数组"),
        (status = 404, description = "数据库连接或查询失败，响应体为空"),
        (status = 500, description = "列值无法编码为 JSON，响应体为空")
    )
)]
pub async fn dump_notebook(State(state): State<AppState>) -> Response {
    state.dump_handler.handle().await.into_response()
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
