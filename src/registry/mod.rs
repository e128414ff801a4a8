//! 엔티티 레지스트리
//!
//! 실행 1회 동안의 의사/원본 진료과 저장소입니다.
//! - 의사 ID는 1부터 순차 부여 (빈 번호, 재사용 없음)
//! - 정규화된 이름이 같은 의사는 먼저 등록된 쪽만 남음 (병합/덮어쓰기 없음)
//! - 수기 명단은 스크랩 데이터보다 먼저 [`Registry::seed`] 로 등록

use std::collections::HashMap;

use crate::config::SeedRoster;
use crate::extractor::{collapse_whitespace, normalize_doctor_name};
use crate::model::{Doctor, DoctorCandidate, DoctorId, Provenance, RawDepartment};

/// `register_doctor` 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    /// 새로 등록됨
    New(DoctorId),
    /// 같은 이름이 이미 있어 무시됨 (기존 ID)
    Existing(DoctorId),
}

impl Registered {
    pub fn id(self) -> DoctorId {
        match self {
            Registered::New(id) | Registered::Existing(id) => id,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, Registered::New(_))
    }
}

/// 의사/원본 진료과 저장소
#[derive(Debug, Default)]
pub struct Registry {
    /// ID 순서 = 등록 순서 (`doctors[i].id == i + 1`)
    doctors: Vec<Doctor>,
    /// 정규화된 이름 → ID
    doctor_index: HashMap<String, DoctorId>,
    /// 진료과 페이지 순서대로 보관
    raw_departments: Vec<RawDepartment>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 의사 후보 등록
    ///
    /// 이름은 정규화된 형태로 저장되며, 같은 이름이 이미 있으면
    /// 아무것도 바꾸지 않고 기존 ID를 돌려줍니다.
    pub fn register_doctor(&mut self, mut candidate: DoctorCandidate) -> Registered {
        candidate.name = name_key(&candidate.name);
        if let Some(&id) = self.doctor_index.get(&candidate.name) {
            tracing::debug!("Duplicate doctor ignored: {} (kept #{})", candidate.name, id);
            return Registered::Existing(id);
        }

        let id = DoctorId(self.doctors.len() as u32 + 1);
        self.doctor_index.insert(candidate.name.clone(), id);
        self.doctors.push(Doctor::from_candidate(id, candidate));
        Registered::New(id)
    }

    /// 원본 진료과 보관 (이름이 같아도 모두 보관, 병합은 통합 단계에서)
    pub fn register_department_raw(&mut self, department: RawDepartment) {
        self.raw_departments.push(department);
    }

    /// 수기 명단 선등록
    ///
    /// 이미 같은 이름이 있으면 그 의사는 건너뜁니다. 새로 등록된 ID 목록을 명단 순서대로 반환.
    pub fn seed(&mut self, roster: &SeedRoster) -> Vec<DoctorId> {
        let ids: Vec<DoctorId> = roster
            .doctors
            .iter()
            .filter_map(|seed| {
                let mut candidate = DoctorCandidate::named(seed.name.clone(), Provenance::ManualSeed);
                candidate.specialization = Some(seed.specialization.clone());
                candidate.qualifications = seed.qualifications.clone();
                candidate.subspecialty = Some(seed.subspecialty.clone());

                match self.register_doctor(candidate) {
                    Registered::New(id) => Some(id),
                    Registered::Existing(_) => None,
                }
            })
            .collect();

        tracing::info!("Seeded {} doctors for {}", ids.len(), roster.department);
        ids
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn doctor(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.get((id.0 as usize).checked_sub(1)?)
    }

    pub(crate) fn doctor_mut(&mut self, id: DoctorId) -> Option<&mut Doctor> {
        self.doctors.get_mut((id.0 as usize).checked_sub(1)?)
    }

    /// 이름 조회 (등록 때와 같은 정규화 적용)
    pub fn doctor_by_name(&self, name: &str) -> Option<&Doctor> {
        self.doctor_index
            .get(&name_key(name))
            .and_then(|&id| self.doctor(id))
    }

    pub fn raw_departments(&self) -> &[RawDepartment] {
        &self.raw_departments
    }

    pub fn doctor_count(&self) -> usize {
        self.doctors.len()
    }

    /// 레지스트리를 소비하여 의사 목록과 원본 진료과 목록으로 분리
    pub fn into_parts(self) -> (Vec<Doctor>, Vec<RawDepartment>) {
        (self.doctors, self.raw_departments)
    }
}

/// 중복 판정 키: 정규화된 이름 (경칭만 있는 이름은 공백 정리만)
fn name_key(name: &str) -> String {
    normalize_doctor_name(name).unwrap_or_else(|| collapse_whitespace(name))
}

// ============================================================================
// Tests
// ============================================================================
