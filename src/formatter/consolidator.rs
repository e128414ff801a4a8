//! 진료과 통합 (원본 진료과 → 정규 진료과)

use serde::{Deserialize, Serialize};

use super::link_doctor;
use crate::config::{ContentCaps, FormatterConfig, SeedRoster};
use crate::extractor::dedup_preserving_order;
use crate::model::{Department, DepartmentId, RawDepartment};
use crate::registry::Registry;

// ============================================================================
// Name Mapping
// ============================================================================

/// 이름 매핑 결과와 사용된 단계
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedName {
    /// 별칭 테이블 (정확히 일치)
    Alias(String),
    /// 분류 체계 이름과 일치 (대소문자 무시 포함)
    Exact(String),
    /// 한쪽이 다른 쪽을 포함 (대소문자 무시)
    Substring(String),
    /// 분류 체계 밖
    Unmapped,
}

impl MappedName {
    pub fn target(&self) -> Option<&str> {
        match self {
            MappedName::Alias(name) | MappedName::Exact(name) | MappedName::Substring(name) => {
                Some(name)
            }
            MappedName::Unmapped => None,
        }
    }
}

/// 원본 진료과 이름 → 정규 진료과 이름
#[derive(Debug, Clone, Copy)]
pub struct DepartmentMapper<'a> {
    config: &'a FormatterConfig,
}

impl<'a> DepartmentMapper<'a> {
    pub fn new(config: &'a FormatterConfig) -> Self {
        Self { config }
    }

    /// 단계별로 시도하고 처음 일치한 결과 반환
    ///
    /// 1. 별칭 테이블
    /// 2. 분류 체계 이름 (정확히, 다음으로 대소문자 무시)
    /// 3. 부분 문자열 (양방향, 대소문자 무시, 분류 체계 순서)
    pub fn map(&self, raw_name: &str) -> MappedName {
        let raw_name = raw_name.trim();

        if let Some(target) = self.config.alias_for(raw_name) {
            return MappedName::Alias(target.to_string());
        }

        let taxonomy = &self.config.taxonomy;
        if let Some(exact) = taxonomy
            .iter()
            .find(|t| t.as_str() == raw_name)
            .or_else(|| taxonomy.iter().find(|t| t.eq_ignore_ascii_case(raw_name)))
        {
            return MappedName::Exact(exact.clone());
        }

        let lower = raw_name.to_lowercase();
        if !lower.is_empty() {
            if let Some(partial) = taxonomy.iter().find(|t| {
                let t = t.to_lowercase();
                lower.contains(&t) || t.contains(&lower)
            }) {
                return MappedName::Substring(partial.clone());
            }
        }

        MappedName::Unmapped
    }
}

// ============================================================================
// Consolidation
// ============================================================================

/// 분류 체계 밖으로 떨어진 원본 진료과 (진단 정보)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmappedDepartment {
    pub raw_name: String,
    /// 매핑 결과 이름 (별칭이 분류 체계 밖을 가리킨 경우), 없으면 `None`
    pub mapped_to: Option<String>,
    pub url: String,
    pub doctor_names: Vec<String>,
}

/// 통합 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    /// 분류 체계 순서의 정규 진료과 (항목당 정확히 1개)
    pub departments: Vec<Department>,
    /// 입력 원본 진료과별 대상 진료과 ID (입력과 같은 순서)
    pub raw_targets: Vec<Option<DepartmentId>>,
    pub unmapped: Vec<UnmappedDepartment>,
}

/// 정규 진료과 생성 및 원본 콘텐츠 병합
///
/// 입력과 설정에만 의존하는 순수 함수입니다 (같은 입력 → 같은 ID, 같은 내용, 같은 순서).
pub fn consolidate(raw_departments: &[RawDepartment], config: &FormatterConfig) -> Consolidation {
    let mut departments: Vec<Department> = config
        .taxonomy
        .iter()
        .enumerate()
        .map(|(i, name)| Department::empty(DepartmentId(i as u32 + 1), name.clone()))
        .collect();

    let mapper = DepartmentMapper::new(config);
    let mut raw_targets = Vec::with_capacity(raw_departments.len());
    let mut unmapped = Vec::new();

    for raw in raw_departments {
        let mapped = mapper.map(&raw.name);
        let target = mapped
            .target()
            .and_then(|name| departments.iter().position(|d| d.name == name));

        let Some(index) = target else {
            tracing::warn!(
                "Unmapped department {:?} ({}) with {} doctor mention(s)",
                raw.name,
                raw.url,
                raw.doctor_mentions.len()
            );
            unmapped.push(UnmappedDepartment {
                raw_name: raw.name.clone(),
                mapped_to: mapped.target().map(str::to_string),
                url: raw.url.clone(),
                doctor_names: raw.doctor_names().map(str::to_string).collect(),
            });
            raw_targets.push(None);
            continue;
        };

        tracing::debug!("Department {:?} -> {:?}", raw.name, mapped);
        let dept = &mut departments[index];
        merge_into(dept, raw);
        raw_targets.push(Some(dept.id));
    }

    for dept in &mut departments {
        apply_caps(dept, &config.content_caps);
    }

    tracing::info!(
        "Consolidated {} raw departments into {} canonical ({} unmapped)",
        raw_departments.len(),
        departments.len(),
        unmapped.len()
    );

    Consolidation {
        departments,
        raw_targets,
        unmapped,
    }
}

fn merge_into(dept: &mut Department, raw: &RawDepartment) {
    if raw.description.chars().count() > dept.description.chars().count() {
        dept.description = raw.description.clone();
    }

    dept.services.extend(raw.services.iter().cloned());
    dept.procedures.extend(raw.procedures.iter().cloned());
    dept.faqs.extend(raw.faqs.iter().cloned());
    dept.facilities.extend(raw.facilities.iter().cloned());

    if dept.url.is_empty() {
        dept.url = raw.url.clone();
    }
}

fn apply_caps(dept: &mut Department, caps: &ContentCaps) {
    fn capped(items: &mut Vec<String>, cap: Option<usize>) {
        let mut deduped = dedup_preserving_order(std::mem::take(items));
        if let Some(cap) = cap {
            deduped.truncate(cap);
        }
        *items = deduped;
    }

    capped(&mut dept.services, caps.services);
    capped(&mut dept.procedures, caps.procedures);
    capped(&mut dept.faqs, caps.faqs);
    capped(&mut dept.facilities, caps.facilities);
}

// ============================================================================
// Seed Roster
// ============================================================================

/// 수기 명단 의사를 명단 진료과에 고정 배정
///
/// 배정 단계보다 먼저 실행되어 이 의사들은 배정 단계에서 제외됩니다.
/// 진료과의 `subspecialties` 에 세부 전공을 명단 순서대로 (중복 없이) 기록합니다.
/// 연결한 의사 수를 반환합니다.
pub fn absorb_roster(
    departments: &mut [Department],
    registry: &mut Registry,
    roster: &SeedRoster,
) -> usize {
    if roster.doctors.is_empty() {
        return 0;
    }
    let Some(dept) = departments.iter_mut().find(|d| d.name == roster.department) else {
        tracing::warn!("Roster department {:?} is not in the taxonomy", roster.department);
        return 0;
    };

    let mut linked = 0;
    for seed in &roster.doctors {
        let Some(id) = registry.doctor_by_name(&seed.name).map(|d| d.id) else {
            continue;
        };
        let Some(doctor) = registry.doctor_mut(id) else {
            continue;
        };

        if link_doctor(doctor, dept) {
            linked += 1;
        }
        if !dept.subspecialties.contains(&seed.subspecialty) {
            dept.subspecialties.push(seed.subspecialty.clone());
        }
    }

    tracing::info!("Linked {} roster doctors to {}", linked, dept.name);
    linked
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DoctorId, DoctorMention};

    fn raw(name: &str) -> RawDepartment {
        RawDepartment {
            name: name.to_string(),
            url: format!("https://example.com/departments/{}/", name.to_lowercase()),
            ..Default::default()
        }
    }

    #[test]
    fn test_mapping_steps() {
        let config = FormatterConfig::default();
        let mapper = DepartmentMapper::new(&config);

        assert_eq!(
            mapper.map("Anesthesiology"),
            MappedName::Alias("Anesthesia and Pain Management".to_string())
        );
        assert_eq!(mapper.map("Oncology"), MappedName::Exact("Oncology".to_string()));
        assert_eq!(mapper.map("oncology"), MappedName::Exact("Oncology".to_string()));
        assert_eq!(
            mapper.map("Oncology Unit"),
            MappedName::Substring("Oncology".to_string())
        );
        assert_eq!(mapper.map("Careers"), MappedName::Unmapped);
        assert_eq!(mapper.map(""), MappedName::Unmapped);
    }

    #[test]
    fn test_url_title_case_matches_without_alias() {
        let config = FormatterConfig {
            department_aliases: Vec::new(),
            ..Default::default()
        };
        let mapper = DepartmentMapper::new(&config);
        assert_eq!(
            mapper.map("Urology And Lithotripsy"),
            MappedName::Exact("Urology and Lithotripsy".to_string())
        );
    }

    #[test]
    fn test_every_taxonomy_entry_once_in_order() {
        let config = FormatterConfig::default();
        let result = consolidate(&[raw("Oncology"), raw("Oncology")], &config);

        assert_eq!(result.departments.len(), config.taxonomy.len());
        for (i, (dept, name)) in result.departments.iter().zip(&config.taxonomy).enumerate() {
            assert_eq!(dept.id, DepartmentId(i as u32 + 1));
            assert_eq!(&dept.name, name);
        }
    }

    #[test]
    fn test_merge_policy() {
        let config = FormatterConfig::default();
        let mut first = raw("Nephrology");
        first.description = "Short text".to_string();
        first.services = (0..10).map(|i| format!("Service number {i}")).collect();
        first.faqs = (0..4).map(|i| format!("Question number {i}")).collect();

        let mut second = raw("Nephrology & Dialysis");
        second.description = "A much longer description".to_string();
        second.services = (5..12).map(|i| format!("Service number {i}")).collect();
        second.faqs = (2..6).map(|i| format!("Question number {i}")).collect();
        second.facilities = (0..30).map(|i| format!("Facility number {i}")).collect();

        let result = consolidate(&[first, second], &config);
        let dept = result
            .departments
            .iter()
            .find(|d| d.name == "Nephrology & Dialysis")
            .unwrap();

        assert_eq!(dept.description, "A much longer description");
        assert_eq!(dept.services.len(), 12);
        assert_eq!(dept.services[11], "Service number 11");
        assert_eq!(
            dept.faqs,
            (0..5).map(|i| format!("Question number {i}")).collect::<Vec<_>>()
        );
        assert_eq!(dept.facilities.len(), 30);
        assert_eq!(dept.url, "https://example.com/departments/nephrology/");
        assert_eq!(result.raw_targets, vec![Some(dept.id), Some(dept.id)]);
    }

    #[test]
    fn test_caps_apply() {
        let config = FormatterConfig::default();
        let mut page = raw("ENT");
        page.procedures = (0..40).map(|i| format!("Procedure number {i}")).collect();

        let result = consolidate(&[page], &config);
        let ent = result.departments.iter().find(|d| d.name == "ENT").unwrap();
        assert_eq!(ent.procedures.len(), 15);
        assert_eq!(ent.procedures[0], "Procedure number 0");
    }

    #[test]
    fn test_unmapped_is_reported_not_merged() {
        let config = FormatterConfig::default();
        let mut careers = raw("Careers");
        careers.description = "Join our team of professionals".to_string();
        careers.doctor_mentions = vec![DoctorMention {
            name: "Dr. Omer Farooq".to_string(),
            specialization: None,
        }];

        let result = consolidate(&[careers], &config);
        assert_eq!(result.raw_targets, vec![None]);
        assert_eq!(result.unmapped.len(), 1);
        assert_eq!(result.unmapped[0].raw_name, "Careers");
        assert_eq!(result.unmapped[0].doctor_names, vec!["Dr. Omer Farooq"]);
        assert!(result.departments.iter().all(|d| d.description.is_empty()));
    }

    #[test]
    fn test_names_outside_taxonomy_are_unmapped() {
        let config = FormatterConfig {
            department_aliases: vec![("Skin".to_string(), "Dermatology".to_string())],
            ..Default::default()
        };
        let result = consolidate(&[raw("Dermatology"), raw("Skin")], &config);

        assert_eq!(result.unmapped.len(), 2);
        assert_eq!(result.unmapped[0].mapped_to, None);
        assert_eq!(result.unmapped[1].mapped_to.as_deref(), Some("Dermatology"));
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let config = FormatterConfig::default();
        let mut a = raw("Urology");
        a.services = vec!["Kidney stone removal".to_string()];
        let mut b = raw("Cardiac Surgery");
        b.description = "Open heart surgery".to_string();
        let input = vec![a, b, raw("Careers")];

        assert_eq!(consolidate(&input, &config), consolidate(&input, &config));
    }

    #[test]
    fn test_absorb_roster() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        let seeded = registry.seed(&config.seed_roster);
        let mut result = consolidate(&[], &config);

        let linked = absorb_roster(&mut result.departments, &mut registry, &config.seed_roster);
        assert_eq!(linked, seeded.len());

        let pediatrics = result.departments.iter().find(|d| d.name == "Pediatrics").unwrap();
        assert_eq!(pediatrics.total_doctors(), 14);
        assert_eq!(pediatrics.doctor_ids()[0], DoctorId(1));
        assert_eq!(
            pediatrics.subspecialties[..3],
            ["General Pediatrics", "Neonatology", "Pediatric Endocrinology"]
        );
        assert!(registry
            .doctors()
            .iter()
            .all(|d| d.department_id == Some(pediatrics.id)));
    }
}
