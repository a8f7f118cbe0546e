//! 笔记本表读取模块
//!
//! 每次调用都新建一个数据库连接，执行固定查询，查询结束后无论成败都关闭连接。
//! 列值在这里从驱动类型收窄为 [`ScalarValue`]。

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row as _, TypeInfo, ValueRef};

use common::errors::{AppError, AppResult};
use common::models::connection::{ConnectionConfig, DbType};
use common::models::row::{ResultSet, Row, ScalarValue};

/// 固定查询语句
pub const NOTEBOOK_QUERY: &str = "SELECT * FROM notebook";

/// 笔记本数据源 Trait
#[async_trait]
pub trait NotebookStore: Send + Sync {
    /// 读取 notebook 表的全部行
    async fn fetch_all(&self) -> AppResult<ResultSet>;
}

/// 基于 sqlx 的数据源，每次读取使用独立连接
pub struct SqlNotebookStore {
    config: ConnectionConfig,
}

impl SqlNotebookStore {
    /// 创建数据源
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn fetch_mysql(&self) -> AppResult<ResultSet> {
        let options = self.mysql_options();
        let mut conn = self.establish(options.connect()).await?;

        // 文本协议：时间、日期等列保留服务器输出的原文（含零日期、负 TIME）
        let result = sqlx::Executor::fetch_all(&mut conn, sqlx::raw_sql(NOTEBOOK_QUERY)).await;
        release(conn).await;

        let rows = result.map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        rows.iter().map(decode_mysql_row).collect()
    }

    async fn fetch_sqlite(&self) -> AppResult<ResultSet> {
        let options = self.sqlite_options()?;
        let mut conn = self.establish(options.connect()).await?;

        let result = sqlx::query(NOTEBOOK_QUERY).fetch_all(&mut conn).await;
        release(conn).await;

        let rows = result.map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        rows.iter().map(decode_sqlite_row).collect()
    }

    /// 在超时限制内建立连接
    async fn establish<C, F>(&self, connecting: F) -> AppResult<C>
    where
        F: std::future::Future<Output = Result<C, sqlx::Error>>,
    {
        let timeout = self.config.connect_timeout();
        match tokio::time::timeout(timeout, connecting).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(AppError::DatabaseConnection(e.to_string())),
            Err(_) => Err(AppError::DatabaseConnection(format!(
                "timed out after {}s",
                timeout.as_secs()
            ))),
        }
    }

    fn mysql_options(&self) -> MySqlConnectOptions {
        let config = &self.config;
        let mut options = MySqlConnectOptions::new()
            .host(config.host.as_deref().unwrap_or("localhost"))
            .port(config.effective_port().unwrap_or(3306))
            .username(config.username.as_deref().unwrap_or("root"));

        if let Some(password) = config.password.as_deref() {
            options = options.password(password);
        }
        if let Some(database) = config.database.as_deref() {
            options = options.database(database);
        }
        options
    }

    fn sqlite_options(&self) -> AppResult<SqliteConnectOptions> {
        let path = self
            .config
            .file_path
            .as_deref()
            .ok_or_else(|| AppError::DatabaseConnection("SQLite requires file_path".into()))?;

        Ok(SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false)
            .read_only(true))
    }
}

#[async_trait]
impl NotebookStore for SqlNotebookStore {
    async fn fetch_all(&self) -> AppResult<ResultSet> {
        tracing::debug!(target_db = %self.config.target(), "opening connection");
        match self.config.db_type {
            DbType::MySQL => self.fetch_mysql().await,
            DbType::SQLite => self.fetch_sqlite().await,
        }
    }
}

/// 关闭连接；关闭失败只记录日志，不影响响应
async fn release<C: Connection>(conn: C) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "failed to close connection cleanly");
    }
}

// ============== 列值解码 ==============

/// 按列类型名划分的解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Signed,
    Unsigned,
    Bit,
    Float32,
    Float64,
    Decimal,
    Date,
    Time,
    DateTime,
    Text,
    Bytes,
}

fn classify(type_name: &str) -> ColumnKind {
    let name = type_name.to_ascii_uppercase();
    if name.ends_with(" UNSIGNED") {
        return ColumnKind::Unsigned;
    }
    match name.as_str() {
        "BIT" => ColumnKind::Bit,
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT"
        | "YEAR" => ColumnKind::Signed,
        "FLOAT" => ColumnKind::Float32,
        "DOUBLE" | "REAL" => ColumnKind::Float64,
        "DECIMAL" | "NUMERIC" => ColumnKind::Decimal,
        "DATE" => ColumnKind::Date,
        "TIME" => ColumnKind::Time,
        "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        | "JSON" => ColumnKind::Text,
        _ => ColumnKind::Bytes,
    }
}

fn decode_mysql_row(row: &MySqlRow) -> AppResult<Row> {
    let mut out = Row::with_capacity(row.len());
    for column in row.columns() {
        let value = mysql_value(row, column.ordinal()).map_err(|e| decode_error(column.name(), e))?;
        out.push(column.name(), value);
    }
    Ok(out)
}

fn mysql_value(row: &MySqlRow, idx: usize) -> Result<ScalarValue, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(ScalarValue::Null);
    }
    let kind = classify(raw.type_info().name());
    mysql_text_value(kind, row.try_get_unchecked::<&[u8], _>(idx)?)
}

/// 文本协议下的列值转换：数值列解析为数字，其余列保持服务器原文
fn mysql_text_value(kind: ColumnKind, text: &[u8]) -> Result<ScalarValue, sqlx::Error> {
    Ok(match kind {
        ColumnKind::Signed => parse::<i64>(text)?.into(),
        ColumnKind::Unsigned => parse::<u64>(text)?.into(),
        ColumnKind::Bit => bit_value(text)?.into(),
        ColumnKind::Float32 => float32_value(parse::<f32>(text)?)?,
        ColumnKind::Float64 => finite(parse::<f64>(text)?)?,
        ColumnKind::Decimal
        | ColumnKind::Date
        | ColumnKind::Time
        | ColumnKind::DateTime
        | ColumnKind::Text
        | ColumnKind::Bytes => utf8(text.to_vec())?,
    })
}

fn parse<T>(text: &[u8]) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text = std::str::from_utf8(text).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    text.trim()
        .parse::<T>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// BIT(M) 在文本协议中是大端原始字节
fn bit_value(bytes: &[u8]) -> Result<u64, sqlx::Error> {
    if bytes.len() > 8 {
        return Err(sqlx::Error::Decode(
            format!("BIT value of {} bytes exceeds 64 bits", bytes.len()).into(),
        ));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// 经十进制字符串转换，避免 1.1f32 变成 1.100000023841858
fn float32_value(value: f32) -> Result<ScalarValue, sqlx::Error> {
    finite(value.to_string().parse().unwrap_or(f64::from(value)))
}

fn decode_sqlite_row(row: &SqliteRow) -> AppResult<Row> {
    let mut out = Row::with_capacity(row.len());
    for column in row.columns() {
        let value = sqlite_value(row, column.ordinal()).map_err(|e| decode_error(column.name(), e))?;
        out.push(column.name(), value);
    }
    Ok(out)
}

/// SQLite 按存储类型（而非声明类型）解码
fn sqlite_value(row: &SqliteRow, idx: usize) -> Result<ScalarValue, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(ScalarValue::Null);
    }
    let kind = classify(raw.type_info().name());

    Ok(match kind {
        ColumnKind::Signed | ColumnKind::Unsigned | ColumnKind::Bit => {
            row.try_get_unchecked::<i64, _>(idx)?.into()
        }
        ColumnKind::Float32 | ColumnKind::Float64 => finite(row.try_get_unchecked::<f64, _>(idx)?)?,
        ColumnKind::Bytes => utf8(row.try_get_unchecked::<Vec<u8>, _>(idx)?)?,
        _ => row.try_get_unchecked::<String, _>(idx)?.into(),
    })
}

fn finite(value: f64) -> Result<ScalarValue, sqlx::Error> {
    ScalarValue::from_f64(value)
        .ok_or_else(|| sqlx::Error::Decode(format!("non-finite float {}", value).into()))
}

fn utf8(bytes: Vec<u8>) -> Result<ScalarValue, sqlx::Error> {
    String::from_utf8(bytes)
        .map(ScalarValue::String)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn decode_error(column: &str, err: sqlx::Error) -> AppError {
    AppError::Serialization(format!("column `{}`: {}", column, err))
}


#[cfg(test)]
mod tests {
    use super::testing::{sqlite_fixture, CREATE_NOTEBOOK};
    use super::*;

    #[test]
    fn test_classify_mysql_type_names() {
        assert_eq!(classify("INT"), ColumnKind::Signed);
        assert_eq!(classify("BOOLEAN"), ColumnKind::Signed);
        assert_eq!(classify("BIGINT UNSIGNED"), ColumnKind::Unsigned);
        assert_eq!(classify("BIT"), ColumnKind::Bit);
        assert_eq!(classify("FLOAT"), ColumnKind::Float32);
        assert_eq!(classify("DOUBLE"), ColumnKind::Float64);
        assert_eq!(classify("DECIMAL"), ColumnKind::Decimal);
        assert_eq!(classify("DATETIME"), ColumnKind::DateTime);
        assert_eq!(classify("TIMESTAMP"), ColumnKind::DateTime);
        assert_eq!(classify("VARCHAR"), ColumnKind::Text);
        assert_eq!(classify("LONGTEXT"), ColumnKind::Text);
        assert_eq!(classify("VARBINARY"), ColumnKind::Bytes);
        assert_eq!(classify("BLOB"), ColumnKind::Bytes);
    }

    #[test]
    fn test_mysql_temporal_text_is_kept_verbatim() {
        let cases = [
            (ColumnKind::Time, "-01:00:00"),
            (ColumnKind::Time, "25:00:00"),
            (ColumnKind::Time, "838:59:59"),
            (ColumnKind::Date, "0000-00-00"),
            (ColumnKind::Date, "2020-00-00"),
            (ColumnKind::DateTime, "0000-00-00 00:00:00"),
            (ColumnKind::DateTime, "2020-01-01 10:00:00.120000"),
        ];
        for (kind, text) in cases {
            assert_eq!(
                mysql_text_value(kind, text.as_bytes()).unwrap(),
                ScalarValue::from(text),
                "{:?} {}",
                kind,
                text
            );
        }
    }

    #[test]
    fn test_mysql_float_keeps_shortest_decimal() {
        assert_eq!(serde_json::to_string(&float32_value(1.1f32).unwrap()).unwrap(), "1.1");
        let value = mysql_text_value(ColumnKind::Float32, b"1.1").unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "1.1");
        let value = mysql_text_value(ColumnKind::Float64, b"0.30000000000000004").unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "0.30000000000000004");
    }

    #[test]
    fn test_mysql_integers_and_bits() {
        assert_eq!(
            mysql_text_value(ColumnKind::Signed, b"-42").unwrap(),
            ScalarValue::from(-42i64)
        );
        assert_eq!(
            mysql_text_value(ColumnKind::Unsigned, b"18446744073709551615").unwrap(),
            ScalarValue::from(u64::MAX)
        );
        assert_eq!(mysql_text_value(ColumnKind::Bit, &[0x05]).unwrap(), ScalarValue::from(5u64));
        assert_eq!(
            mysql_text_value(ColumnKind::Bit, &[0x01, 0x00]).unwrap(),
            ScalarValue::from(256u64)
        );
        assert!(mysql_text_value(ColumnKind::Bit, &[0xFF; 9]).is_err());
        assert!(mysql_text_value(ColumnKind::Signed, b"forty-two").is_err());
    }

    #[test]
    fn test_mysql_decimal_and_text_are_strings() {
        assert_eq!(
            mysql_text_value(ColumnKind::Decimal, b"12345678901234567890.123456").unwrap(),
            ScalarValue::from("12345678901234567890.123456")
        );
        assert_eq!(
            mysql_text_value(ColumnKind::Text, "h\u{e9}llo".as_bytes()).unwrap(),
            ScalarValue::from("h\u{e9}llo")
        );
        assert!(mysql_text_value(ColumnKind::Bytes, &[0xFF, 0xFE]).is_err());
    }

    #[test]
    fn test_classify_sqlite_storage_classes() {
        assert_eq!(classify("INTEGER"), ColumnKind::Signed);
        assert_eq!(classify("REAL"), ColumnKind::Float64);
        assert_eq!(classify("TEXT"), ColumnKind::Text);
        assert_eq!(classify("BLOB"), ColumnKind::Bytes);
    }

    #[tokio::test]
    async fn test_empty_table_yields_no_rows() {
        let (_dir, config) = sqlite_fixture(&[CREATE_NOTEBOOK]).await;
        let rows = SqlNotebookStore::new(config).fetch_all().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_rows_keep_column_order_and_types() {
        let (_dir, config) = sqlite_fixture(&[
            CREATE_NOTEBOOK,
            "INSERT INTO notebook (id, date, title, content) VALUES (1, '2020-05-01', 'Todo', 'milk')",
            "INSERT INTO notebook (id, date, title, content) VALUES (2, '2020-05-02', 'Ideas', NULL)",
        ])
        .await;

        let rows = SqlNotebookStore::new(config).fetch_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "date", "title", "content"]);
        }
        let second = rows.iter().find(|r| r.get("id") == Some(&2i64.into())).unwrap();
        assert_eq!(second.get("title"), Some(&"Ideas".into()));
        assert!(second.get("content").unwrap().is_null());
    }

    #[tokio::test]
    async fn test_real_and_utf8_blob_values() {
        let (_dir, config) = sqlite_fixture(&[
            "CREATE TABLE notebook (id INTEGER, score REAL, raw BLOB)",
            "INSERT INTO notebook VALUES (1, 2.5, X'68656C6C6F')",
        ])
        .await;

        let rows = SqlNotebookStore::new(config).fetch_all().await.unwrap();
        assert_eq!(
            serde_json::to_string(&rows).unwrap(),
            r#"[{"id":1,"score":2.5,"raw":"hello"}]"#
        );
    }

    #[tokio::test]
    async fn test_non_utf8_blob_is_serialization_error() {
        let (_dir, config) = sqlite_fixture(&[
            "CREATE TABLE notebook (id INTEGER, raw BLOB)",
            "INSERT INTO notebook VALUES (1, X'FFFE')",
        ])
        .await;

        let err = SqlNotebookStore::new(config).fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
        assert!(err.to_string().contains("raw"));
    }

    #[tokio::test]
    async fn test_missing_table_is_query_error() {
        let (_dir, config) = sqlite_fixture(&["CREATE TABLE other (id INTEGER)"]).await;
        let err = SqlNotebookStore::new(config).fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseQuery(_)));
    }

    #[tokio::test]
    async fn test_missing_sqlite_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let config = ConnectionConfig::sqlite(path.to_string_lossy());

        let err = SqlNotebookStore::new(config).fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseConnection(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sqlite_without_path_is_connection_error() {
        let mut config = ConnectionConfig::sqlite("");
        config.file_path = None;
        let err = SqlNotebookStore::new(config).fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseConnection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_mysql_is_connection_error() {
        let config = ConnectionConfig::mysql("127.0.0.1", "root", "", "notebook")
            .with_port(1)
            .with_connect_timeout_secs(2);
        let err = SqlNotebookStore::new(config).fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseConnection(_)));
    }
}
