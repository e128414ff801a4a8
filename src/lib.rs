//! hospital-rag - 병원 웹사이트 RAG 데이터 정제기
//!
//! 스크랩된 병원 웹 페이지에서 의사/진료과 엔티티를 추출하고,
//! 고정된 진료과 분류 체계로 통합한 뒤 의사를 진료과에 배정합니다.
//! 결과는 ID로 상호 참조하는 JSON 문서와 FTS5 검색 항목으로 저장됩니다.

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod formatter;
pub mod knowledge;
pub mod model;
pub mod raw;
pub mod registry;

// Re-exports
pub use config::{FormatterConfig, HospitalInfo, SeedRoster};
pub use error::{FormatError, Result};
pub use extractor::{DepartmentExtractor, DoctorExtractor};
pub use formatter::{
    load_formatted, save_formatted, DataSummary, DoctorAssignmentResolver, FormatOutcome,
    FormattedData, Formatter, OutputAssembler,
};
pub use knowledge::{build_items, get_data_dir, ItemStore, ItemType, SearchableItem};
pub use model::{Department, DepartmentId, Doctor, DoctorId, Provenance};
pub use raw::{load_raw_pages, PageType, RawPage};
pub use registry::Registry;
