//! 최종 출력 조립
//!
//! 진료과/의사 목록(ID로 상호 참조)과 요약 통계, 추출 메타데이터를 하나의 문서로 만듭니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::consolidator::UnmappedDepartment;
use super::resolver::UnassignedDoctor;
use crate::config::{FormatterConfig, HospitalInfo};
use crate::model::{Department, Doctor};

/// 저장되는 최종 엔티티 그래프
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedData {
    pub hospital_info: HospitalInfo,
    pub departments: Vec<Department>,
    pub doctors: Vec<Doctor>,
    pub data_summary: DataSummary,
    pub extraction_metadata: ExtractionMetadata,
}

/// 요약 통계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_departments: usize,
    pub total_doctors: usize,
    /// 진료과에 배정된 의사 수
    pub total_doctors_in_departments: usize,
    /// 의사가 1명 이상인 진료과 수
    pub departments_with_doctors: usize,
    /// 배정된 의사 수 / 전체 진료과 수 (소수 둘째 자리 반올림)
    pub average_doctors_per_department: f64,
    pub unassigned_doctors: usize,
}

/// 추출 메타데이터 + 진단 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub formatted_at: DateTime<Utc>,
    pub source_file: String,
    pub formatter_version: String,
    pub notes: String,
    pub seeded_doctors: usize,
    pub unassigned_doctors: Vec<UnassignedDoctor>,
    pub unmapped_departments: Vec<UnmappedDepartment>,
}

/// 조립 입력 (배정까지 끝난 상태)
#[derive(Debug)]
pub struct AssemblyInput<'a> {
    pub departments: Vec<Department>,
    pub doctors: Vec<Doctor>,
    pub unassigned: Vec<UnassignedDoctor>,
    pub unmapped: Vec<UnmappedDepartment>,
    pub seeded_doctors: usize,
    pub source_file: &'a str,
}

/// 출력 조립기
#[derive(Debug, Clone, Copy)]
pub struct OutputAssembler<'a> {
    config: &'a FormatterConfig,
}

impl<'a> OutputAssembler<'a> {
    pub fn new(config: &'a FormatterConfig) -> Self {
        Self { config }
    }

    /// 같은 입력과 시각이면 항상 같은 결과
    pub fn assemble(&self, input: AssemblyInput<'_>, formatted_at: DateTime<Utc>) -> FormattedData {
        let data_summary = summarize(&input.departments, &input.doctors);

        FormattedData {
            hospital_info: self.config.hospital_info.clone(),
            departments: input.departments,
            doctors: input.doctors,
            data_summary,
            extraction_metadata: ExtractionMetadata {
                formatted_at,
                source_file: input.source_file.to_string(),
                formatter_version: self.config.formatter_version.clone(),
                notes: "Departments reference doctors by doctor_ids; doctors reference their \
                        department by department_id (null when unassigned)"
                    .to_string(),
                seeded_doctors: input.seeded_doctors,
                unassigned_doctors: input.unassigned,
                unmapped_departments: input.unmapped,
            },
        }
    }
}

/// 진료과/의사 목록에서 요약 통계 계산
pub fn summarize(departments: &[Department], doctors: &[Doctor]) -> DataSummary {
    let total_doctors_in_departments: usize = departments.iter().map(|d| d.total_doctors()).sum();
    let average = if departments.is_empty() {
        0.0
    } else {
        round2(total_doctors_in_departments as f64 / departments.len() as f64)
    };

    DataSummary {
        total_departments: departments.len(),
        total_doctors: doctors.len(),
        total_doctors_in_departments,
        departments_with_doctors: departments.iter().filter(|d| d.total_doctors() > 0).count(),
        average_doctors_per_department: average,
        unassigned_doctors: doctors.iter().filter(|d| !d.is_assigned()).count(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Tests
// ============================================================================
