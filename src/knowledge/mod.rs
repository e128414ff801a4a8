//! Knowledge 모듈 - 검색 항목 생성 + 키워드 검색 저장소
//!
//! - Items: 엔티티 그래프 → 평평한 검색 항목 (병원/진료과/의사)
//! - SQLite: 항목 저장 + FTS5 키워드 검색 (LIKE 폴백)

mod items;
mod store;

// Re-exports
pub use items::{build_items, ItemType, SearchableItem};
pub use store::{get_data_dir, ItemHit, ItemStore, SearchMethod, StoreStats, StoredItem};
