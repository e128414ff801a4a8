//! 검색 항목(Searchable Item) 생성
//!
//! 엔티티 그래프를 임베딩/검색 단계가 소비하는 평평한 항목 목록으로 바꿉니다.
//! 항목 1개 = 병원 정보 1건 / 진료과 1건 / 의사 1명.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extractor::collapse_whitespace;
use crate::formatter::FormattedData;
use crate::model::{Department, DepartmentId, Doctor};

/// 진료과 설명 최대 길이 (문자)
const DEPARTMENT_DESCRIPTION_CHARS: usize = 300;
/// 미배정 의사 설명 최대 길이 (문자)
const DOCTOR_DESCRIPTION_CHARS: usize = 200;

/// 항목 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    HospitalInfo,
    Department,
    Doctor,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::HospitalInfo => "hospital_info",
            ItemType::Department => "department",
            ItemType::Doctor => "doctor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hospital_info" => Some(ItemType::HospitalInfo),
            "department" => Some(ItemType::Department),
            "doctor" => Some(ItemType::Doctor),
            _ => None,
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            ItemType::HospitalInfo => "hosp",
            ItemType::Department => "dept",
            ItemType::Doctor => "doc",
        }
    }
}

/// 검색 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchableItem {
    /// `<접두사>_<전체 목록에서의 순번>` (예: `dept_1`)
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    /// `LABEL: value` 형식 요약 (공백 정리됨)
    pub content: String,
    pub category: String,
}

/// 엔티티 그래프 → 검색 항목 목록
///
/// 순서: 병원 정보, 진료과 (분류 체계 순서), 의사 (ID 순서).
pub fn build_items(data: &FormattedData) -> Vec<SearchableItem> {
    let mut items = Vec::with_capacity(1 + data.departments.len() + data.doctors.len());
    let mut push = |item_type: ItemType, name: &str, content: String, category: &str| {
        let id = format!("{}_{}", item_type.id_prefix(), items.len());
        items.push(SearchableItem {
            id,
            item_type,
            name: name.to_string(),
            content: collapse_whitespace(&content),
            category: category.to_string(),
        });
    };

    let hospital = &data.hospital_info;
    push(
        ItemType::HospitalInfo,
        &hospital.name,
        format!(
            "Hospital: {} | Location: {} | Phone: {} | Address: {} | Website: {}",
            hospital.name, hospital.location, hospital.main_phone, hospital.address, hospital.website
        ),
        "general",
    );

    let doctors_by_id: HashMap<_, &Doctor> = data.doctors.iter().map(|d| (d.id, d)).collect();
    let departments_by_id: HashMap<DepartmentId, &Department> =
        data.departments.iter().map(|d| (d.id, d)).collect();

    for dept in &data.departments {
        let doctor_names: Vec<&str> = dept
            .doctor_ids()
            .iter()
            .filter_map(|id| doctors_by_id.get(id))
            .take(10)
            .map(|d| d.name.as_str())
            .collect();
        push(ItemType::Department, &dept.name, department_content(dept, &doctor_names), &dept.name);
    }

    for doctor in &data.doctors {
        let department = doctor
            .department_id
            .and_then(|id| departments_by_id.get(&id).copied());
        let category = department
            .map(|d| d.name.as_str())
            .or(doctor.specialization.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or("general");
        push(ItemType::Doctor, &doctor.name, doctor_content(doctor, department), category);
    }

    tracing::info!("Built {} searchable items", items.len());
    items
}

fn department_content(dept: &Department, doctor_names: &[&str]) -> String {
    let description: String = dept.description.chars().take(DEPARTMENT_DESCRIPTION_CHARS).collect();
    let head = |items: &[String], n: usize| items.iter().take(n).cloned().collect::<Vec<_>>().join(", ");

    [
        format!("DEPARTMENT: {}", dept.name),
        format!("DESCRIPTION: {}", description),
        format!("SERVICES: {}", head(&dept.services, 12)),
        format!("FACILITIES: {}", head(&dept.facilities, 3)),
        format!("PROCEDURES: {}", head(&dept.procedures, 15)),
        format!("DOCTORS: {}", doctor_names.join(", ")),
        format!("URL: {}", dept.url),
    ]
    .join("\n")
}

fn doctor_content(doctor: &Doctor, department: Option<&Department>) -> String {
    let mut lines = vec![
        format!("DOCTOR: {}", doctor.name),
        format!("SPECIALIZATION: {}", doctor.specialization.as_deref().unwrap_or("")),
        format!("QUALIFICATIONS: {}", doctor.qualifications.join(", ")),
        format!("EXPERTISE: {}", doctor.areas_of_expertise.join(", ")),
        format!("APPOINTMENT: {}", doctor.appointment_number.as_deref().unwrap_or("")),
    ];

    match department {
        Some(dept) => lines.push(format!("DEPARTMENT: {}", dept.name)),
        None => {
            let description: String = doctor
                .description
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(DOCTOR_DESCRIPTION_CHARS)
                .collect();
            lines.push(format!("DESCRIPTION: {}", description));
        }
    }
    lines.push(format!("URL: {}", doctor.profile_url.as_deref().unwrap_or("")));

    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatterConfig;
    use crate::formatter::Formatter;
    use crate::raw::parse_raw_pages;
    use chrono::Utc;

    fn formatted() -> FormattedData {
        let pages = parse_raw_pages(
            r#"[
                {
                    "url": "https://example.com/doctors/dr-ali-khan/",
                    "page_type": "doctor_profile",
                    "doctor_profile": {
                        "name": "Dr. Ali Khan",
                        "specialization": "Nephrologist",
                        "qualifications": ["MBBS", "FCPS"]
                    }
                },
                {
                    "url": "https://example.com/doctors/dr-yasir-ali/",
                    "page_type": "doctor_profile",
                    "doctor_profile": { "name": "Dr. Yasir Ali", "description": "Visiting consultant" }
                },
                {
                    "url": "https://example.com/departments/nephrology/",
                    "page_type": "department_page",
                    "main_content": "Kidney   care\n and dialysis",
                    "services": ["Hemodialysis sessions"]
                }
            ]"#,
        )
        .unwrap();

        let config = FormatterConfig {
            seed_roster: Default::default(),
            ..Default::default()
        };
        Formatter::new(config)
            .format_pages(&pages, "test.json", Utc::now())
            .data
    }

    #[test]
    fn test_item_layout() {
        let data = formatted();
        let items = build_items(&data);

        assert_eq!(items.len(), 1 + data.departments.len() + data.doctors.len());
        assert_eq!(items[0].id, "hosp_0");
        assert_eq!(items[0].item_type, ItemType::HospitalInfo);
        assert_eq!(items[0].category, "general");
        assert_eq!(items[1].id, "dept_1");
        assert_eq!(items.last().unwrap().id, format!("doc_{}", items.len() - 1));
    }

    #[test]
    fn test_department_content() {
        let items = build_items(&formatted());
        let nephrology = items
            .iter()
            .find(|i| i.item_type == ItemType::Department && i.name == "Nephrology & Dialysis")
            .unwrap();

        assert_eq!(nephrology.category, "Nephrology & Dialysis");
        assert!(nephrology.content.starts_with("DEPARTMENT: Nephrology & Dialysis DESCRIPTION: Kidney care and dialysis"));
        assert!(nephrology.content.contains("SERVICES: Hemodialysis sessions"));
        assert!(nephrology.content.contains("DOCTORS: Dr. Ali Khan"));
        assert!(nephrology.content.ends_with("URL: https://example.com/departments/nephrology/"));
        assert!(!nephrology.content.contains('\n'));
    }

    #[test]
    fn test_doctor_content_and_category() {
        let items = build_items(&formatted());
        let ali = items.iter().find(|i| i.name == "Dr. Ali Khan").unwrap();
        assert_eq!(ali.item_type, ItemType::Doctor);
        assert_eq!(ali.category, "Nephrology & Dialysis");
        assert!(ali.content.contains("QUALIFICATIONS: MBBS, FCPS"));
        assert!(ali.content.contains("DEPARTMENT: Nephrology & Dialysis"));

        let yasir = items.iter().find(|i| i.name == "Dr. Yasir Ali").unwrap();
        assert_eq!(yasir.category, "general");
        assert!(yasir.content.contains("DESCRIPTION: Visiting consultant"));
    }

    #[test]
    fn test_serialized_shape() {
        let items = build_items(&formatted());
        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["type"], "hospital_info");
        assert_eq!(json["id"], "hosp_0");

        for item in &items {
            assert_eq!(ItemType::parse(item.item_type.as_str()), Some(item.item_type));
        }
        assert_eq!(ItemType::parse("clinic"), None);
    }
}
