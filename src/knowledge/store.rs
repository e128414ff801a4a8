//! Item Store - rusqlite 기반 검색 항목 저장소
//!
//! 정제된 검색 항목을 저장하고 FTS5 키워드 검색을 제공합니다.
//! 저장 위치: ~/.hospital-rag/items.db

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Serialize;

use super::items::{ItemType, SearchableItem};

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.hospital-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hospital-rag")
}

// ============================================================================
// Types
// ============================================================================

/// 저장된 항목
#[derive(Debug, Clone, Serialize)]
pub struct StoredItem {
    #[serde(flatten)]
    pub item: SearchableItem,
    pub indexed_at: DateTime<Utc>,
}

/// 검색 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Fts,
    Like,
}

/// 검색 결과
#[derive(Debug, Clone, Serialize)]
pub struct ItemHit {
    pub item_id: String,
    pub item_type: ItemType,
    pub name: String,
    pub category: String,
    pub snippet: String,
    /// BM25 (낮을수록 관련도 높음). LIKE 폴백이면 0
    pub score: f64,
    pub method: SearchMethod,
}

/// 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub item_count: usize,
    pub hospital_items: usize,
    pub department_items: usize,
    pub doctor_items: usize,
    pub total_content_bytes: usize,
    pub db_path: PathBuf,
}

// ============================================================================
// ItemStore
// ============================================================================

/// 검색 항목 저장소
///
/// 항목 목록은 포맷 실행 단위로 통째로 교체됩니다.
pub struct ItemStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl ItemStore {
    /// 저장소 열기 (없으면 생성)
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open SQLite database")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: path.to_path_buf(),
        };

        store.initialize()?;
        Ok(store)
    }

    /// 기본 위치에서 열기 (~/.hospital-rag/items.db)
    pub fn open_default() -> Result<Self> {
        Self::open(&get_data_dir().join("items.db"))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))
    }

    /// 스키마 초기화
    fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id TEXT NOT NULL UNIQUE,
                item_type TEXT NOT NULL,
                name TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                indexed_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create items table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_type ON items(item_type)",
            [],
        )
        .context("Failed to create item type index")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_category ON items(category)",
            [],
        )
        .context("Failed to create category index")?;

        // source: https://www.sqlite.org/fts5.html
        let fts_result = conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(
                name,
                content,
                content=items,
                content_rowid=id
            )",
            [],
        );

        if let Err(e) = fts_result {
            tracing::warn!("FTS5 not available (optional): {}", e);
        } else {
            let _ = conn.execute_batch(
                r#"
                CREATE TRIGGER IF NOT EXISTS items_ai AFTER INSERT ON items BEGIN
                    INSERT INTO items_fts(rowid, name, content)
                    VALUES (new.id, new.name, new.content);
                END;

                CREATE TRIGGER IF NOT EXISTS items_ad AFTER DELETE ON items BEGIN
                    INSERT INTO items_fts(items_fts, rowid, name, content)
                    VALUES('delete', old.id, old.name, old.content);
                END;

                CREATE TRIGGER IF NOT EXISTS items_au AFTER UPDATE ON items BEGIN
                    INSERT INTO items_fts(items_fts, rowid, name, content)
                    VALUES('delete', old.id, old.name, old.content);
                    INSERT INTO items_fts(rowid, name, content)
                    VALUES (new.id, new.name, new.content);
                END;
                "#,
            );
        }

        tracing::debug!("Item store initialized at {:?}", self.db_path);
        Ok(())
    }

    /// 저장된 항목 전체를 새 목록으로 교체 (단일 트랜잭션)
    pub fn replace_all(&self, items: &[SearchableItem]) -> Result<usize> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();

        let tx = conn.transaction().context("Failed to begin transaction")?;
        tx.execute("DELETE FROM items", [])
            .context("Failed to clear items")?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO items (item_id, item_type, name, content, category, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for item in items {
                stmt.execute(params![
                    item.id,
                    item.item_type.as_str(),
                    item.name,
                    item.content,
                    item.category,
                    now
                ])
                .with_context(|| format!("Failed to insert item {}", item.id))?;
            }
        }
        tx.commit().context("Failed to commit items")?;

        tracing::info!("Indexed {} items into {:?}", items.len(), self.db_path);
        Ok(items.len())
    }

    /// 항목 ID로 조회
    pub fn get(&self, item_id: &str) -> Result<Option<StoredItem>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT item_id, item_type, name, content, category, indexed_at
             FROM items WHERE item_id = ?1",
        )?;

        let item = stmt.query_row(params![item_id], row_to_item).ok();
        Ok(item)
    }

    /// 항목 목록 (저장 순서)
    pub fn list(&self, limit: usize, item_type: Option<ItemType>) -> Result<Vec<StoredItem>> {
        let conn = self.lock()?;

        let items: Vec<StoredItem> = if let Some(kind) = item_type {
            let mut stmt = conn.prepare(
                "SELECT item_id, item_type, name, content, category, indexed_at FROM items
                 WHERE item_type = ?1
                 ORDER BY id
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![kind.as_str(), limit as i64], row_to_item)?;
            rows.filter_map(|r| r.ok()).collect()
        } else {
            let mut stmt = conn.prepare(
                "SELECT item_id, item_type, name, content, category, indexed_at FROM items
                 ORDER BY id
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], row_to_item)?;
            rows.filter_map(|r| r.ok()).collect()
        };

        Ok(items)
    }

    /// 키워드 검색: FTS5 우선, 결과가 없거나 FTS5를 쓸 수 없으면 LIKE
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<ItemHit>> {
        match self.search_fts(query, limit) {
            Ok(hits) if !hits.is_empty() => return Ok(hits),
            Ok(_) => {}
            Err(e) => tracing::warn!("FTS5 search failed, falling back to LIKE: {}", e),
        }
        self.search_like(query, limit)
    }

    /// FTS5 키워드 검색 (BM25 정렬)
    ///
    /// source: https://www.sqlite.org/fts5.html#the_bm25_function
    pub fn search_fts(&self, query: &str, limit: usize) -> Result<Vec<ItemHit>> {
        let conn = self.lock()?;

        let escaped_query = escape_fts5_query(query);
        if escaped_query.is_empty() {
            return Ok(vec![]);
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT
                i.item_id,
                i.item_type,
                i.name,
                i.category,
                snippet(items_fts, 1, '<b>', '</b>', '...', 32) as snippet,
                bm25(items_fts) as score
            FROM items_fts
            JOIN items i ON i.id = items_fts.rowid
            WHERE items_fts MATCH ?1
            ORDER BY bm25(items_fts)
            LIMIT ?2
            "#,
        )?;

        let hits = stmt
            .query_map(params![escaped_query, limit as i64], |row| {
                Ok(ItemHit {
                    item_id: row.get(0)?,
                    item_type: item_type_at(row, 1)?,
                    name: row.get(2)?,
                    category: row.get(3)?,
                    snippet: row.get(4)?,
                    score: row.get(5)?,
                    method: SearchMethod::Fts,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(hits)
    }

    /// LIKE 검색 (폴백)
    pub fn search_like(&self, keyword: &str, limit: usize) -> Result<Vec<ItemHit>> {
        let conn = self.lock()?;

        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(vec![]);
        }
        let pattern = format!("%{}%", keyword.to_lowercase());

        let mut stmt = conn.prepare(
            "SELECT item_id, item_type, name, category, content FROM items
             WHERE LOWER(content) LIKE ?1 OR LOWER(name) LIKE ?1
             ORDER BY id
             LIMIT ?2",
        )?;

        let hits = stmt
            .query_map(params![pattern, limit as i64], |row| {
                let content: String = row.get(4)?;
                Ok(ItemHit {
                    item_id: row.get(0)?,
                    item_type: item_type_at(row, 1)?,
                    name: row.get(2)?,
                    category: row.get(3)?,
                    snippet: content.chars().take(160).collect(),
                    score: 0.0,
                    method: SearchMethod::Like,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(hits)
    }

    /// 저장소 통계
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let count_of = |sql: &str, kind: Option<&str>| -> i64 {
            match kind {
                Some(k) => conn.query_row(sql, params![k], |row| row.get::<_, i64>(0)),
                None => conn.query_row(sql, [], |row| row.get::<_, i64>(0)),
            }
            .unwrap_or(0)
        };

        let by_type = "SELECT COUNT(*) FROM items WHERE item_type = ?1";

        Ok(StoreStats {
            item_count: count_of("SELECT COUNT(*) FROM items", None) as usize,
            hospital_items: count_of(by_type, Some(ItemType::HospitalInfo.as_str())) as usize,
            department_items: count_of(by_type, Some(ItemType::Department.as_str())) as usize,
            doctor_items: count_of(by_type, Some(ItemType::Doctor.as_str())) as usize,
            total_content_bytes: count_of(
                "SELECT COALESCE(SUM(LENGTH(content)), 0) FROM items",
                None,
            ) as usize,
            db_path: self.db_path.clone(),
        })
    }

    /// FTS5 인덱스 리빌드
    pub fn rebuild_fts_index(&self) -> Result<usize> {
        let conn = self.lock()?;

        conn.execute("INSERT INTO items_fts(items_fts) VALUES('rebuild')", [])
            .context("Failed to rebuild FTS5 index")?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .unwrap_or(0);

        tracing::info!("Rebuilt FTS5 index with {} items", count);
        Ok(count as usize)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn item_type_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ItemType> {
    let raw: String = row.get(idx)?;
    ItemType::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown item type: {raw}").into(),
        )
    })
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<StoredItem> {
    Ok(StoredItem {
        item: SearchableItem {
            id: row.get(0)?,
            item_type: item_type_at(row, 1)?,
            name: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
        },
        indexed_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

/// RFC3339 문자열을 DateTime<Utc>로 파싱
fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// FTS5 쿼리 이스케이프
///
/// 단어마다 특수 문자를 제거하고 큰따옴표로 감쌉니다 (암묵적 AND).
/// source: https://www.sqlite.org/fts5.html#full_text_query_syntax
fn escape_fts5_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .map(|w| format!("\"{}\"", w))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================
