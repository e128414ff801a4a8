//! 의사 → 진료과 배정
//!
//! 아직 배정되지 않은 의사만 대상으로 3개의 패스를 순서대로 실행합니다.
//! 각 패스는 이전 패스에서 배정되지 않은 의사만 봅니다.
//!
//! 1. 전문분야 테이블 (정확히 일치)
//! 2. `"{이름} {전문분야}"` 키워드 검색 (설정된 목록 순서, 첫 일치)
//! 3. 휴리스틱
//!    - a. 진료과 페이지에 이름이 언급된 경우 그 진료과
//!    - b. 자유 텍스트 필드에서 진료과 이름 검색 (분류 체계 순서)
//!
//! 끝까지 남은 의사는 오류가 아니라 미배정 목록으로 보고됩니다.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::link_doctor;
use crate::config::FormatterConfig;
use crate::model::{Department, DepartmentId, Doctor, DoctorId, RawDepartment};
use crate::registry::Registry;

// ============================================================================
// Types
// ============================================================================

/// 배정에 사용된 전략
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AssignmentStrategy {
    SpecializationTable,
    Keyword { keyword: String },
    PageMention,
    TextKeyword,
}

/// 배정 1건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub doctor_id: DoctorId,
    pub department_id: DepartmentId,
    pub strategy: AssignmentStrategy,
}

/// 미배정 의사 (진단 정보)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedDoctor {
    pub id: DoctorId,
    pub name: String,
    pub specialization: Option<String>,
}

/// 배정 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentReport {
    /// 배정 순서대로
    pub assignments: Vec<Assignment>,
    /// ID 순서대로
    pub unassigned: Vec<UnassignedDoctor>,
}

impl AssignmentReport {
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    /// 전략별 배정 수 (`Keyword` 는 키워드와 무관하게 합산)
    pub fn count_by(&self, strategy: &AssignmentStrategy) -> usize {
        self.assignments
            .iter()
            .filter(|a| std::mem::discriminant(&a.strategy) == std::mem::discriminant(strategy))
            .count()
    }

    pub fn strategy_for(&self, doctor_id: DoctorId) -> Option<&AssignmentStrategy> {
        self.assignments
            .iter()
            .find(|a| a.doctor_id == doctor_id)
            .map(|a| &a.strategy)
    }
}

// ============================================================================
// Mention Index
// ============================================================================

/// 의사 이름 → 언급된 진료과 (처음 본 페이지 우선)
#[derive(Debug, Clone, Default)]
pub struct MentionIndex {
    by_name: HashMap<String, DepartmentId>,
}

impl MentionIndex {
    /// 원본 진료과와 통합 결과(`raw_targets`, 같은 순서)로 색인 생성
    ///
    /// 분류 체계 밖으로 떨어진 페이지의 언급은 색인에 넣지 않습니다.
    pub fn build(raw_departments: &[RawDepartment], raw_targets: &[Option<DepartmentId>]) -> Self {
        let mut by_name = HashMap::new();
        for (raw, target) in raw_departments.iter().zip(raw_targets) {
            let Some(target) = target else { continue };
            for name in raw.doctor_names() {
                by_name.entry(name.to_string()).or_insert(*target);
            }
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<DepartmentId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// 의사 배정기
#[derive(Debug, Clone, Copy)]
pub struct DoctorAssignmentResolver<'a> {
    config: &'a FormatterConfig,
}

impl<'a> DoctorAssignmentResolver<'a> {
    pub fn new(config: &'a FormatterConfig) -> Self {
        Self { config }
    }

    /// 미배정 의사 전원에 대해 배정 패스 실행
    ///
    /// 이미 배정된 의사(수기 명단 등)는 건드리지 않습니다.
    /// 끝나면 모든 진료과의 `total_doctors` 를 다시 계산합니다.
    pub fn resolve(
        &self,
        registry: &mut Registry,
        departments: &mut [Department],
        mentions: &MentionIndex,
    ) -> AssignmentReport {
        let by_name: HashMap<String, usize> = departments
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), i))
            .collect();
        let by_id: HashMap<DepartmentId, usize> = departments
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id, i))
            .collect();
        let department_names: Vec<(usize, String)> = departments
            .iter()
            .enumerate()
            .map(|(i, d)| (i, d.name.to_lowercase()))
            .collect();

        let pending: Vec<DoctorId> = registry
            .doctors()
            .iter()
            .filter(|d| !d.is_assigned())
            .map(|d| d.id)
            .collect();
        tracing::info!("Resolving departments for {} doctors", pending.len());

        let mut report = AssignmentReport::default();

        // Pass 1
        let pass1 = run_pass(&pending, registry, departments, &mut report, |doctor| {
            let specialization = doctor.specialization.as_deref()?.trim();
            let target = self.config.department_for_specialization(specialization)?;
            let index = *by_name.get(target)?;
            Some((index, AssignmentStrategy::SpecializationTable))
        });

        // Pass 2
        let pass2 = run_pass(&pending, registry, departments, &mut report, |doctor| {
            let text = format!(
                "{} {}",
                doctor.name,
                doctor.specialization.as_deref().unwrap_or("")
            )
            .to_lowercase();

            self.config.keyword_table.iter().find_map(|(keyword, target)| {
                let index = *by_name.get(target)?;
                text.contains(&keyword.to_lowercase()).then(|| {
                    (
                        index,
                        AssignmentStrategy::Keyword {
                            keyword: keyword.clone(),
                        },
                    )
                })
            })
        });

        // Pass 3a
        let pass3a = if mentions.is_empty() {
            0
        } else {
            run_pass(&pending, registry, departments, &mut report, |doctor| {
                let target = mentions.get(&doctor.name)?;
                let index = *by_id.get(&target)?;
                Some((index, AssignmentStrategy::PageMention))
            })
        };

        // Pass 3b
        let pass3b = run_pass(&pending, registry, departments, &mut report, |doctor| {
            let blob = free_text_blob(doctor);
            if blob.is_empty() {
                return None;
            }
            department_names
                .iter()
                .find(|(_, name)| blob.contains(name.as_str()))
                .map(|(index, _)| (*index, AssignmentStrategy::TextKeyword))
        });

        for dept in departments.iter_mut() {
            dept.recount();
        }

        report.unassigned = pending
            .iter()
            .filter_map(|&id| registry.doctor(id))
            .filter(|d| !d.is_assigned())
            .map(|d| UnassignedDoctor {
                id: d.id,
                name: d.name.clone(),
                specialization: d.specialization.clone(),
            })
            .collect();

        tracing::info!(
            "Assigned {} doctors (table {}, keyword {}, page mention {}, text {}), {} unassigned",
            pass1 + pass2 + pass3a + pass3b,
            pass1,
            pass2,
            pass3a,
            pass3b,
            report.unassigned.len()
        );
        for doctor in &report.unassigned {
            tracing::warn!(
                "Unassigned doctor #{} {} ({})",
                doctor.id,
                doctor.name,
                doctor.specialization.as_deref().unwrap_or("no specialization")
            );
        }

        report
    }
}

/// 대기 중인 의사 중 아직 배정되지 않은 의사에게 `pass` 를 적용하고 배정 수 반환
fn run_pass<F>(
    pending: &[DoctorId],
    registry: &mut Registry,
    departments: &mut [Department],
    report: &mut AssignmentReport,
    pass: F,
) -> usize
where
    F: Fn(&Doctor) -> Option<(usize, AssignmentStrategy)>,
{
    let mut assigned = 0;
    for &id in pending {
        let Some(doctor) = registry.doctor_mut(id) else { continue };
        if doctor.is_assigned() {
            continue;
        }
        let Some((index, strategy)) = pass(doctor) else { continue };

        let dept = &mut departments[index];
        if link_doctor(doctor, dept) {
            tracing::debug!("{} -> {} ({:?})", doctor.name, dept.name, strategy);
            report.assignments.push(Assignment {
                doctor_id: id,
                department_id: dept.id,
                strategy,
            });
            assigned += 1;
        }
    }
    assigned
}

/// 3b 패스 검색 대상: 설명, 전문 영역, 전문분야, 프로필 URL (소문자)
fn free_text_blob(doctor: &Doctor) -> String {
    let expertise = doctor.areas_of_expertise.join(" ");
    [
        doctor.description.as_deref().unwrap_or(""),
        expertise.as_str(),
        doctor.specialization.as_deref().unwrap_or(""),
        doctor.profile_url.as_deref().unwrap_or(""),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::consolidator::consolidate;
    use crate::model::{DoctorCandidate, DoctorMention, Provenance};

    fn doctor(name: &str, specialization: Option<&str>) -> DoctorCandidate {
        let mut c = DoctorCandidate::named(name, Provenance::ProfilePage);
        c.specialization = specialization.map(str::to_string);
        c
    }

    fn dept_id(departments: &[Department], name: &str) -> DepartmentId {
        departments.iter().find(|d| d.name == name).unwrap().id
    }

    fn run(
        registry: &mut Registry,
        raw: &[RawDepartment],
        config: &FormatterConfig,
    ) -> (Vec<Department>, AssignmentReport) {
        let mut consolidation = consolidate(raw, config);
        let mentions = MentionIndex::build(raw, &consolidation.raw_targets);
        let report = DoctorAssignmentResolver::new(config).resolve(
            registry,
            &mut consolidation.departments,
            &mentions,
        );
        (consolidation.departments, report)
    }

    #[test]
    fn test_specialization_table_wins_over_later_passes() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        let mut candidate = doctor("Dr. Asad Mahmood", Some("Cardiologist"));
        candidate.description = Some("Treats heart disease and cardiac surgery cases".to_string());
        let id = registry.register_doctor(candidate).id();

        let (departments, report) = run(&mut registry, &[], &config);

        assert_eq!(
            registry.doctor(id).unwrap().department_id,
            Some(dept_id(&departments, "Interventional Cardiology"))
        );
        assert_eq!(
            report.strategy_for(id),
            Some(&AssignmentStrategy::SpecializationTable)
        );
    }

    #[test]
    fn test_keyword_pass_uses_list_order() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        // "cardiac" 가 "surgery" 보다 목록 앞에 있음
        let id = registry
            .register_doctor(doctor("Dr. Bilal Aslam", Some("Consultant Cardiac Surgery")))
            .id();

        let (departments, report) = run(&mut registry, &[], &config);

        assert_eq!(
            registry.doctor(id).unwrap().department_id,
            Some(dept_id(&departments, "Cardiac Surgery"))
        );
        assert_eq!(
            report.strategy_for(id),
            Some(&AssignmentStrategy::Keyword {
                keyword: "cardiac".to_string()
            })
        );
    }

    #[test]
    fn test_keyword_with_non_canonical_target_is_skipped() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        // "skin" → Dermatology (분류 체계 밖) 은 건너뛰고 다음 키워드 "cancer"
        let id = registry
            .register_doctor(doctor("Dr. Hina Akram", Some("Skin Cancer Specialist")))
            .id();

        let (departments, _) = run(&mut registry, &[], &config);
        assert_eq!(
            registry.doctor(id).unwrap().department_id,
            Some(dept_id(&departments, "Oncology"))
        );
    }

    #[test]
    fn test_page_mention_pass() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        let id = registry.register_doctor(doctor("Dr. Omer Farooq", None)).id();

        let raw = vec![
            RawDepartment {
                name: "Careers".to_string(),
                doctor_mentions: vec![DoctorMention {
                    name: "Dr. Omer Farooq".to_string(),
                    specialization: None,
                }],
                ..Default::default()
            },
            RawDepartment {
                name: "Urology".to_string(),
                doctor_mentions: vec![DoctorMention {
                    name: "Dr. Omer Farooq".to_string(),
                    specialization: None,
                }],
                ..Default::default()
            },
        ];

        let (departments, report) = run(&mut registry, &raw, &config);
        assert_eq!(
            registry.doctor(id).unwrap().department_id,
            Some(dept_id(&departments, "Urology and Lithotripsy"))
        );
        assert_eq!(report.strategy_for(id), Some(&AssignmentStrategy::PageMention));
    }

    #[test]
    fn test_free_text_pass() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        let mut candidate = doctor("Dr. Zara Iqbal", None);
        candidate.profile_url =
            Some("https://example.com/doctors/dr-zara-iqbal/?unit=Rheumatology".to_string());
        let id = registry.register_doctor(candidate).id();

        let (departments, report) = run(&mut registry, &[], &config);
        assert_eq!(
            registry.doctor(id).unwrap().department_id,
            Some(dept_id(&departments, "Rheumatology"))
        );
        assert_eq!(report.strategy_for(id), Some(&AssignmentStrategy::TextKeyword));
    }

    #[test]
    fn test_unassigned_accounting() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        registry.register_doctor(doctor("Dr. Ali Khan", Some("Nephrologist")));
        registry.register_doctor(doctor("Dr. Yasir Ali", None));
        registry.register_doctor(doctor("Dr. Kamran Bashir", Some("Consultant")));
        registry.register_doctor(doctor("Dr. Sana Tariq", Some("Urologist")));

        let (departments, report) = run(&mut registry, &[], &config);

        let total = registry.doctor_count();
        assert_eq!(report.unassigned.len(), total - report.assigned_count());
        assert_eq!(report.unassigned.len(), 2);
        for unassigned in &report.unassigned {
            assert_eq!(registry.doctor(unassigned.id).unwrap().department_id, None);
        }

        let placed: usize = departments.iter().map(|d| d.total_doctors()).sum();
        assert_eq!(placed, report.assigned_count());
    }

    #[test]
    fn test_prelinked_doctors_are_skipped() {
        let config = FormatterConfig::default();
        let mut registry = Registry::new();
        registry.seed(&config.seed_roster);

        let mut consolidation = consolidate(&[], &config);
        crate::formatter::consolidator::absorb_roster(
            &mut consolidation.departments,
            &mut registry,
            &config.seed_roster,
        );
        let report = DoctorAssignmentResolver::new(&config).resolve(
            &mut registry,
            &mut consolidation.departments,
            &MentionIndex::default(),
        );

        assert!(report.assignments.is_empty());
        assert!(report.unassigned.is_empty());
        let pediatrics = dept_id(&consolidation.departments, "Pediatrics");
        assert!(registry.doctors().iter().all(|d| d.department_id == Some(pediatrics)));
    }
}
