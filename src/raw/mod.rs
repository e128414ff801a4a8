//! 스크랩 원본 레코드 모듈
//!
//! 크롤러가 남긴 페이지 레코드(URL 1개당 1건)를 읽어들입니다.
//! 필드 형태가 느슨하기 때문에 (문자열/배열/null 혼재)
//! 관대한 역직렬화기로 받아서 항상 일정한 모양으로 만듭니다.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{FormatError, Result};

// ============================================================================
// Page Type
// ============================================================================

/// 페이지 타입 (닫힌 열거형, 모르는 값은 `Other`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageType {
    DoctorProfile,
    DepartmentPage,
    GeneralPage,
    DoctorsList,
    DepartmentsList,
    ContactPage,
    NewsEvents,
    FaqPage,
    AboutPage,
    VisitorInfo,
    #[default]
    Other,
}

impl PageType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "doctor_profile" => PageType::DoctorProfile,
            "department_page" => PageType::DepartmentPage,
            "general_page" => PageType::GeneralPage,
            "doctors_list" => PageType::DoctorsList,
            "departments_list" => PageType::DepartmentsList,
            "contact_page" => PageType::ContactPage,
            "news_events" => PageType::NewsEvents,
            "faq_page" => PageType::FaqPage,
            "about_page" => PageType::AboutPage,
            "visitor_info" => PageType::VisitorInfo,
            _ => PageType::Other,
        }
    }
}

// ============================================================================
// Raw Records
// ============================================================================

/// 크롤링된 페이지 1건
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPage {
    #[serde(default, deserialize_with = "de::text")]
    pub url: String,
    #[serde(default, deserialize_with = "de::text")]
    pub title: String,
    #[serde(default, deserialize_with = "de::page_type")]
    pub page_type: PageType,
    #[serde(default, deserialize_with = "de::text")]
    pub main_content: String,

    /// 페이지에서 잡힌 의사 문자열 (형식이 깨진 경우가 많음)
    #[serde(default, deserialize_with = "de::text_list")]
    pub doctors: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub services: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub procedures: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub faqs: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub facilities: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub descriptions: Vec<String>,

    #[serde(default)]
    pub doctor_profile: Option<RawDoctorProfile>,
    #[serde(default)]
    pub department_info: Option<RawDepartmentInfo>,
}

/// 의사 프로필 페이지의 구조화 필드
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDoctorProfile {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub qualifications: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub appointment_number: Option<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub expertise: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub description: Option<String>,
}

/// 진료과 페이지의 구조화 필드
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDepartmentInfo {
    #[serde(default, deserialize_with = "de::opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub services: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub procedures: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub faqs: Vec<String>,
    #[serde(default, deserialize_with = "de::text_list")]
    pub facilities: Vec<String>,
}

/// 콘텐츠 목록 필드 구분
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Services,
    Procedures,
    Faqs,
    Facilities,
}

impl RawPage {
    /// 최상위 필드 + `department_info` 필드를 순서대로 이어붙인 목록
    pub fn list_field(&self, field: ListField) -> Vec<&str> {
        let top = match field {
            ListField::Services => &self.services,
            ListField::Procedures => &self.procedures,
            ListField::Faqs => &self.faqs,
            ListField::Facilities => &self.facilities,
        };

        let nested = self.department_info.as_ref().map(|info| match field {
            ListField::Services => &info.services,
            ListField::Procedures => &info.procedures,
            ListField::Faqs => &info.faqs,
            ListField::Facilities => &info.facilities,
        });

        top.iter()
            .chain(nested.into_iter().flatten())
            .map(String::as_str)
            .collect()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// 스크랩 결과 파일 로드
///
/// 크롤러가 중단되면서 남긴 꼬리(`%`, `,`, 닫히지 않은 `]`)를 복구한 뒤 파싱합니다.
/// 배열 자체를 파싱할 수 없으면 실행 전체를 중단하고,
/// 개별 레코드가 깨진 경우에는 해당 레코드만 건너뜁니다.
pub async fn load_raw_pages(path: &Path) -> Result<Vec<RawPage>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse_raw_pages(&text).map_err(|source| FormatError::MalformedInput {
        path: path.to_path_buf(),
        source,
    })
}

/// 텍스트에서 레코드 배열 파싱 (프레이밍 복구 포함)
pub fn parse_raw_pages(text: &str) -> std::result::Result<Vec<RawPage>, serde_json::Error> {
    let repaired = repair_framing(text);
    if repaired.len() != text.trim().len() {
        tracing::warn!("Repaired truncated input framing");
    }

    let values: Vec<Value> = serde_json::from_str(&repaired)?;
    let total = values.len();

    let pages: Vec<RawPage> = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<RawPage>(value) {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::warn!("Skipping malformed record #{}: {}", i, e);
                None
            }
        })
        .collect();

    tracing::info!("Loaded {} raw pages ({} skipped)", pages.len(), total - pages.len());
    Ok(pages)
}

/// 잘린 JSON 배열 꼬리 복구
fn repair_framing(text: &str) -> String {
    let mut content = text.trim();

    if let Some(stripped) = content.strip_suffix('%') {
        content = stripped.trim_end();
    }
    if let Some(stripped) = content.strip_suffix(',') {
        content = stripped.trim_end();
    }

    let mut repaired = content.to_string();
    if !repaired.ends_with(']') {
        repaired.push(']');
    }
    repaired
}

// ============================================================================
// Lenient Deserializers
// ============================================================================

mod de {
    use super::*;

    fn value_to_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// 문자열 또는 null → String
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        Ok(Value::deserialize(d).map(value_to_text)?.unwrap_or_default())
    }

    /// 비어있지 않은 문자열만 Some
    pub fn opt_text<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Option<String>, D::Error> {
        Ok(Value::deserialize(d)
            .map(value_to_text)?
            .filter(|s| !s.trim().is_empty()))
    }

    /// 문자열 하나 또는 배열 → Vec<String> (문자열이 아닌 원소는 버림)
    pub fn text_list<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(value_to_text).collect(),
            other => value_to_text(other).into_iter().collect(),
        })
    }

    pub fn page_type<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<PageType, D::Error> {
        Ok(Value::deserialize(d)
            .map(value_to_text)?
            .map(|s| PageType::parse(&s))
            .unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================
