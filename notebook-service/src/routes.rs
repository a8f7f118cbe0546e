//! 路由模块

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// 与 `/api/notebook` 相同的导出，沿用旧站点的文件名路径
pub const LEGACY_DUMP_PATH: &str = "/get_entry.php";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notebook", get(handlers::dump_notebook))
        .route(LEGACY_DUMP_PATH, get(handlers::dump_notebook))
        .route("/api/health", get(handlers::health_check))
}
