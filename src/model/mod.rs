//! 엔티티 모델 - 의사(Doctor) / 진료과(Department)
//!
//! 두 엔티티는 정수 ID로만 서로를 참조합니다.
//! - 의사는 최대 1개의 진료과에 속함 (`department_id`)
//! - 진료과는 소속 의사 ID 집합을 가짐 (`doctor_ids`, 각 의사의 `department_id` 와 항상 일치)

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// 의사 ID (1부터 순차 부여, 재사용 없음)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorId(pub u32);

/// 진료과 ID (분류 체계 순서대로 1부터 부여)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(pub u32);

impl fmt::Display for DoctorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Doctor
// ============================================================================

/// 레코드를 만든 추출 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// 의사 프로필 페이지
    ProfilePage,
    /// 수기 등록 명단
    ManualSeed,
    /// 본문 텍스트 마이닝
    TextMined,
}

/// 등록 전 의사 후보 (ID 없음)
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorCandidate {
    /// 정규화된 이름 (중복 판정 키)
    pub name: String,
    pub specialization: Option<String>,
    pub qualifications: Vec<String>,
    pub areas_of_expertise: Vec<String>,
    pub appointment_number: Option<String>,
    pub description: Option<String>,
    pub profile_url: Option<String>,
    pub subspecialty: Option<String>,
    pub provenance: Provenance,
}

impl DoctorCandidate {
    /// 이름과 추출 경로만 있는 빈 후보
    pub fn named(name: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            specialization: None,
            qualifications: Vec::new(),
            areas_of_expertise: Vec::new(),
            appointment_number: None,
            description: None,
            profile_url: None,
            subspecialty: None,
            provenance,
        }
    }
}

/// 등록된 의사
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialization: Option<String>,
    pub qualifications: Vec<String>,
    pub areas_of_expertise: Vec<String>,
    pub appointment_number: Option<String>,
    pub description: Option<String>,
    pub profile_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subspecialty: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub provenance: Provenance,
}

impl Doctor {
    pub(crate) fn from_candidate(id: DoctorId, candidate: DoctorCandidate) -> Self {
        Self {
            id,
            name: candidate.name,
            specialization: candidate.specialization,
            qualifications: candidate.qualifications,
            areas_of_expertise: candidate.areas_of_expertise,
            appointment_number: candidate.appointment_number,
            description: candidate.description,
            profile_url: candidate.profile_url,
            subspecialty: candidate.subspecialty,
            department_id: None,
            provenance: candidate.provenance,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.department_id.is_some()
    }
}

// ============================================================================
// Department
// ============================================================================

/// 페이지에 언급된 의사
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorMention {
    /// 정규화된 이름
    pub name: String,
    /// 이름 바로 뒤에 붙은 전문분야 (있을 때만)
    pub specialization: Option<String>,
}

/// 진료과 페이지 1건에서 뽑은 원본 진료과 (정규화 전 이름)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDepartment {
    pub name: String,
    pub description: String,
    pub services: Vec<String>,
    pub procedures: Vec<String>,
    pub faqs: Vec<String>,
    pub facilities: Vec<String>,
    /// 페이지에 언급된 의사 (이름 기준 중복 없음, 처음 등장한 순서)
    pub doctor_mentions: Vec<DoctorMention>,
    pub url: String,
}

impl RawDepartment {
    pub fn doctor_names(&self) -> impl Iterator<Item = &str> {
        self.doctor_mentions.iter().map(|m| m.name.as_str())
    }
}

/// 정규 진료과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: String,
    pub services: Vec<String>,
    pub procedures: Vec<String>,
    pub faqs: Vec<String>,
    pub facilities: Vec<String>,
    pub subspecialties: Vec<String>,
    pub url: String,
    doctor_ids: Vec<DoctorId>,
    total_doctors: usize,
}

impl Department {
    /// 콘텐츠 없는 빈 진료과
    pub fn empty(id: DepartmentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            services: Vec::new(),
            procedures: Vec::new(),
            faqs: Vec::new(),
            facilities: Vec::new(),
            subspecialties: Vec::new(),
            url: String::new(),
            doctor_ids: Vec::new(),
            total_doctors: 0,
        }
    }

    pub fn doctor_ids(&self) -> &[DoctorId] {
        &self.doctor_ids
    }

    pub fn total_doctors(&self) -> usize {
        self.total_doctors
    }

    pub fn has_doctor(&self, id: DoctorId) -> bool {
        self.doctor_ids.contains(&id)
    }

    /// 의사 ID 추가 (이미 있으면 무시). 의사 쪽 `department_id` 는 호출자가 맞춤
    pub(crate) fn push_doctor(&mut self, id: DoctorId) -> bool {
        if self.has_doctor(id) {
            return false;
        }
        self.doctor_ids.push(id);
        self.recount();
        true
    }

    /// `total_doctors` 재계산
    pub(crate) fn recount(&mut self) {
        self.total_doctors = self.doctor_ids.len();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_doctor_is_set_like() {
        let mut dept = Department::empty(DepartmentId(1), "ENT");
        assert!(dept.push_doctor(DoctorId(3)));
        assert!(!dept.push_doctor(DoctorId(3)));
        assert!(dept.push_doctor(DoctorId(1)));

        assert_eq!(dept.doctor_ids(), &[DoctorId(3), DoctorId(1)]);
        assert_eq!(dept.total_doctors(), 2);
    }

    #[test]
    fn test_doctor_serialization_shape() {
        let doctor = Doctor::from_candidate(
            DoctorId(7),
            DoctorCandidate::named("Dr. Ali Khan", Provenance::ProfilePage),
        );
        let json = serde_json::to_value(&doctor).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["department_id"], serde_json::Value::Null);
        assert_eq!(json["provenance"], "profile_page");
        assert!(json.get("subspecialty").is_none());
    }

    #[test]
    fn test_department_serializes_counts() {
        let mut dept = Department::empty(DepartmentId(2), "Dental");
        dept.push_doctor(DoctorId(5));
        let json = serde_json::to_value(&dept).unwrap();

        assert_eq!(json["doctor_ids"], serde_json::json!([5]));
        assert_eq!(json["total_doctors"], 1);
    }
}
