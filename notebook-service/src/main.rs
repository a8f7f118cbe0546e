//! 笔记本只读导出服务
//!
//! 提供以下功能：
//! - 以 JSON 数组导出 notebook 表的全部行
//! - 每个请求独立建立并释放数据库连接
//! - 健康检查与 OpenAPI 文档

mod handlers;
mod routes;
mod service;
mod state;
mod store;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{AppConfig, LogFormat};
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "notebook-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "笔记本服务 API",
        version = "0.1.0",
        description = "notebook 表只读导出服务"
    ),
    paths(
        handlers::dump_notebook,
        handlers::health_check,
    ),
    components(schemas(
        handlers::HealthResponse,
    )),
    tags(
        (name = "notebook", description = "笔记本导出端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 中的变量不覆盖已有环境变量
    load_dotenv();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;

    // 初始化日志追踪
    init_tracing(config.log_format);

    // 创建应用状态
    let state = AppState::new(config.clone());

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        database = %config.database.target(),
        "启动服务"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app).await.context("服务运行失败")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Load .env file from the working directory (best-effort, no error if missing).
fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        // Only set if not already set by the environment
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
        }
    }
}

/// Splits one `.env` line into key and value; comments and blank lines yield `None`.
fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q));
    Some((key.trim(), unquoted.unwrap_or(value)))
}
