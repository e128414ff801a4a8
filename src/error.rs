//! 포매터 에러 타입
//!
//! 실행을 중단시키는 조건만 에러로 취급합니다.
//! 이름 없는 레코드, 미배정 의사, 매핑 실패 진료과는 에러가 아니라 진단 정보입니다.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 프레이밍 복구 후에도 JSON 배열로 파싱되지 않는 입력
    #[error("malformed scraped input {path}: {source}")]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 저장된 엔티티 그래프(포맷 결과)가 형식에 맞지 않음
    #[error("malformed formatted snapshot {path}: {source}")]
    MalformedSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid formatter config: {0}")]
    Config(String),

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = FormatError> = std::result::Result<T, E>;
