//! 포매터 설정 모듈
//!
//! 진료과 분류 체계(taxonomy)와 각종 매핑 테이블을 보관합니다.
//! 순서가 의미를 갖는 테이블은 모두 `Vec<(String, String)>` 으로 유지하여
//! 해시 순서가 아니라 설정된 순서대로 평가되도록 합니다.
//!
//! 기본값은 Hameed Latif Hospital 데이터 기준이며,
//! JSON 파일로 일부 또는 전체를 덮어쓸 수 있습니다.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};

/// 포매터 버전 (출력 메타데이터에 기록)
pub const FORMATTER_VERSION: &str = "7.0 - registry ids & ordered assignment cascade";

// ============================================================================
// Config Types
// ============================================================================

/// 포매터 전체 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// 출력 가능한 진료과 이름 (닫힌 집합, 순서 = 진료과 ID 순서)
    pub taxonomy: Vec<String>,
    /// 추출된 진료과 이름 → 정규 진료과 (정확히 일치할 때만)
    pub department_aliases: Vec<(String, String)>,
    /// 의사 전문분야 → 정규 진료과 (1차 배정)
    pub specialization_table: Vec<(String, String)>,
    /// (키워드, 진료과) 목록. 목록 순서가 곧 우선순위 (2차 배정)
    pub keyword_table: Vec<(String, String)>,
    /// 스크랩 데이터보다 먼저 등록되는 수기 의사 명단
    pub seed_roster: SeedRoster,
    /// 진료과 콘텐츠 필드별 최대 개수
    pub content_caps: ContentCaps,
    /// general_page 중 진료과로 취급할 URL 조각 → 진료과 이름
    pub general_page_departments: Vec<(String, String)>,
    /// 병원 기본 정보
    pub hospital_info: HospitalInfo,
    /// 진료과 페이지에서 찾은 의사 이름도 의사로 등록할지 (기본값: 끔)
    pub register_page_mentions: bool,
    /// 출력 메타데이터용 버전 문자열
    pub formatter_version: String,
}

/// 수기 등록 의사 명단 (특정 진료과에 고정 배정)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedRoster {
    /// 명단 전체가 배정될 정규 진료과
    pub department: String,
    pub doctors: Vec<SeedDoctor>,
}

/// 수기 등록 의사
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDoctor {
    pub name: String,
    pub specialization: String,
    #[serde(default)]
    pub qualifications: Vec<String>,
    pub subspecialty: String,
}

/// 콘텐츠 필드 최대 개수 (`None` 이면 제한 없음)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentCaps {
    pub services: Option<usize>,
    pub procedures: Option<usize>,
    pub faqs: Option<usize>,
    pub facilities: Option<usize>,
}

/// 병원 기본 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalInfo {
    pub name: String,
    pub location: String,
    pub main_phone: String,
    pub website: String,
    pub address: String,
}

// ============================================================================
// Loading & Lookups
// ============================================================================

impl FormatterConfig {
    /// JSON 설정 파일 로드 (누락된 필드는 기본값)
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&text)
            .map_err(|e| FormatError::Config(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        tracing::debug!("Loaded formatter config from {:?}", path);
        Ok(config)
    }

    /// 설정 일관성 검사
    ///
    /// 분류 체계에 중복 이름이 있으면 진료과 ID가 모호해지므로 거부합니다.
    pub fn validate(&self) -> Result<()> {
        if self.taxonomy.is_empty() {
            return Err(FormatError::Config("taxonomy is empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for name in &self.taxonomy {
            if name.trim().is_empty() {
                return Err(FormatError::Config("taxonomy contains an empty name".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(FormatError::Config(format!(
                    "duplicate taxonomy entry: {}",
                    name
                )));
            }
        }

        if !self.seed_roster.doctors.is_empty() && !self.is_canonical(&self.seed_roster.department) {
            return Err(FormatError::Config(format!(
                "seed roster department is not in the taxonomy: {}",
                self.seed_roster.department
            )));
        }

        Ok(())
    }

    /// 정규 진료과 여부
    pub fn is_canonical(&self, name: &str) -> bool {
        self.taxonomy.iter().any(|t| t == name)
    }

    /// 별칭 테이블 조회 (정확히 일치)
    pub fn alias_for(&self, raw_name: &str) -> Option<&str> {
        lookup(&self.department_aliases, raw_name)
    }

    /// 전문분야 테이블 조회 (정확히 일치)
    pub fn department_for_specialization(&self, specialization: &str) -> Option<&str> {
        lookup(&self.specialization_table, specialization)
    }

}

fn lookup<'a>(table: &'a [(String, String)], key: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ============================================================================
// Defaults
// ============================================================================

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            taxonomy: default_taxonomy(),
            department_aliases: default_aliases(),
            specialization_table: default_specialization_table(),
            keyword_table: default_keyword_table(),
            seed_roster: SeedRoster::default(),
            content_caps: ContentCaps::default(),
            general_page_departments: pairs(&[("/dermatology-cosmetology/", "Dermatology")]),
            hospital_info: HospitalInfo::default(),
            register_page_mentions: false,
            formatter_version: FORMATTER_VERSION.to_string(),
        }
    }
}

impl Default for ContentCaps {
    fn default() -> Self {
        Self {
            services: Some(15),
            procedures: Some(15),
            faqs: Some(5),
            facilities: None,
        }
    }
}

impl Default for HospitalInfo {
    fn default() -> Self {
        Self {
            name: "Hameed Latif Hospital".to_string(),
            location: "Lahore, Pakistan".to_string(),
            main_phone: "+92 (42) 111-000-043".to_string(),
            website: "https://www.hameedlatifhospital.com".to_string(),
            address: "14- Abu Baker Block, New Garden Town, Lahore".to_string(),
        }
    }
}

fn default_taxonomy() -> Vec<String> {
    strings(&[
        "Anesthesia and Pain Management",
        "Cardiac and Vascular Surgery",
        "Cardiac Surgery",
        "Clinical Psychology",
        "Dental",
        "Dietetics & Nutrition",
        "Emergency Services",
        "Endocrinology",
        "ENT",
        "Fetal Medicine",
        "Gastroenterology",
        "General Surgery",
        "General Thoracic Surgery",
        "Gynecology and Obstetrics",
        "Infectious Diseases",
        "Intensive Care Unit",
        "Internal Medicine",
        "Interventional Cardiac Electrophysiologist",
        "Interventional Cardiology",
        "Interventional Radiology",
        "Laboratories",
        "Lactation Management",
        "Nephrology & Dialysis",
        "Neurology & Stroke Management",
        "Neurosurgery & Spine",
        "Oncology",
        "OPD",
        "Ophthalmology",
        "Orthopedics",
        "Pediatrics",
        "Physiotherapy & Hydrotherapy",
        "Plastic Surgery",
        "Psychiatry",
        "Pulmonology",
        "Radiology",
        "Rheumatology",
        "Speech Therapy",
        "Urology and Lithotripsy",
    ])
}

fn default_aliases() -> Vec<(String, String)> {
    pairs(&[
        ("Anesthesiology", "Anesthesia and Pain Management"),
        ("Anesthesia", "Anesthesia and Pain Management"),
        ("Cardiac And Vascular Surgery", "Cardiac and Vascular Surgery"),
        ("Dietetics & Nutrition", "Dietetics & Nutrition"),
        ("Gynecology And Obstetrics", "Gynecology and Obstetrics"),
        ("Gynecology", "Gynecology and Obstetrics"),
        ("Infectious Diseases Department", "Infectious Diseases"),
        ("Nephrology", "Nephrology & Dialysis"),
        ("Neurology & Stroke Management", "Neurology & Stroke Management"),
        ("Neurology", "Neurology & Stroke Management"),
        ("Neurosurgery & Spine", "Neurosurgery & Spine"),
        ("Neurosurgery Spine", "Neurosurgery & Spine"),
        ("Physiotherapy & Hydrotherapy", "Physiotherapy & Hydrotherapy"),
        ("Physiotherapy", "Physiotherapy & Hydrotherapy"),
        ("Urology And Lithotripsy", "Urology and Lithotripsy"),
        ("Urology", "Urology and Lithotripsy"),
        ("Pediatric Surgery", "Pediatrics"),
        ("Pediatric Cardiology", "Pediatrics"),
        ("Pediatric Urology", "Pediatrics"),
    ])
}

fn default_specialization_table() -> Vec<(String, String)> {
    pairs(&[
        ("Anesthesiologist", "Anesthesia and Pain Management"),
        ("Anesthesia Consultant", "Anesthesia and Pain Management"),
        ("Pain Physician", "Anesthesia and Pain Management"),
        ("Cardiologist", "Interventional Cardiology"),
        ("Cardiac Surgeon", "Cardiac Surgery"),
        ("Urologist", "Urology and Lithotripsy"),
        ("Gynecologist", "Gynecology and Obstetrics"),
        ("Orthopedic", "Orthopedics"),
        ("Orthopedic Surgeon", "Orthopedics"),
        ("Neurologist", "Neurology & Stroke Management"),
        ("Neuro Surgeon", "Neurosurgery & Spine"),
        ("Neurosurgeon", "Neurosurgery & Spine"),
        ("Radiologist", "Radiology"),
        ("General Surgeon", "General Surgery"),
        ("Plastic Surgeon", "Plastic Surgery"),
        ("ENT", "ENT"),
        ("ENT Consultant", "ENT"),
        ("Physiotherapist", "Physiotherapy & Hydrotherapy"),
        ("Dermatologist", "Dermatology"),
        ("Psychiatrist", "Psychiatry"),
        ("Oncologist", "Oncology"),
        ("Pulmonologist", "Pulmonology"),
        ("Nephrologist", "Nephrology & Dialysis"),
        ("Endocrinologist", "Endocrinology"),
        ("Rheumatologist", "Rheumatology"),
        ("Gastroenterologist", "Gastroenterology"),
        ("Ophthalmologist", "Ophthalmology"),
        ("Opthalmologist", "Ophthalmology"),
        ("Infectious Disease Specialist", "Infectious Diseases"),
        ("Speech and Language Therapist", "Speech Therapy"),
        ("Lactation Specialist", "Lactation Management"),
        ("Dental Surgeon", "Dental"),
        ("Fetal Medicine", "Fetal Medicine"),
        ("Fetal Medicine Specialist", "Fetal Medicine"),
    ])
}

/// 키워드 목록 (순서 변경은 배정 정책 변경임)
fn default_keyword_table() -> Vec<(String, String)> {
    pairs(&[
        ("anesthesia", "Anesthesia and Pain Management"),
        ("pain", "Anesthesia and Pain Management"),
        ("cardiac", "Cardiac Surgery"),
        ("heart", "Cardiac Surgery"),
        ("urology", "Urology and Lithotripsy"),
        ("gynecology", "Gynecology and Obstetrics"),
        ("obstetrics", "Gynecology and Obstetrics"),
        ("orthopedic", "Orthopedics"),
        ("bone", "Orthopedics"),
        ("neurology", "Neurology & Stroke Management"),
        ("neuro", "Neurosurgery & Spine"),
        ("spine", "Neurosurgery & Spine"),
        ("radiology", "Radiology"),
        ("surgery", "General Surgery"),
        ("plastic", "Plastic Surgery"),
        ("ent", "ENT"),
        ("ear", "ENT"),
        ("nose", "ENT"),
        ("throat", "ENT"),
        ("physiotherapy", "Physiotherapy & Hydrotherapy"),
        ("dermatology", "Dermatology"),
        ("skin", "Dermatology"),
        ("psychiatry", "Psychiatry"),
        ("mental", "Psychiatry"),
        ("oncology", "Oncology"),
        ("cancer", "Oncology"),
        ("pulmonology", "Pulmonology"),
        ("lung", "Pulmonology"),
        ("nephrology", "Nephrology & Dialysis"),
        ("kidney", "Nephrology & Dialysis"),
        ("endocrinology", "Endocrinology"),
        ("diabetes", "Endocrinology"),
        ("rheumatology", "Rheumatology"),
        ("gastroenterology", "Gastroenterology"),
        ("stomach", "Gastroenterology"),
        ("ophthalmology", "Ophthalmology"),
        ("eye", "Ophthalmology"),
        ("infectious", "Infectious Diseases"),
        ("speech", "Speech Therapy"),
        ("lactation", "Lactation Management"),
        ("dental", "Dental"),
        ("fetal", "Fetal Medicine"),
        ("pregnancy", "Fetal Medicine"),
    ])
}

impl Default for SeedRoster {
    fn default() -> Self {
        let doctor = |name: &str, specialization: &str, quals: &[&str], subspecialty: &str| {
            SeedDoctor {
                name: name.to_string(),
                specialization: specialization.to_string(),
                qualifications: strings(quals),
                subspecialty: subspecialty.to_string(),
            }
        };

        Self {
            department: "Pediatrics".to_string(),
            doctors: vec![
                doctor("Dr. Shoaib Butt", "Pediatrician", &["MBBS", "DCH (Diploma in Child Health)"], "General Pediatrics"),
                doctor("Dr. Sajjad Rafique", "Pediatrician", &["MBBS", "MRCP", "MRCPCH"], "General Pediatrics"),
                doctor(
                    "Dr. Haroon Hamid",
                    "Pediatrician",
                    &["MBBS", "FCPS", "MRCP (IRELAND)", "FRCP NEONATAL FELLOWSHIP (RCPCH UK)"],
                    "Neonatology",
                ),
                doctor("Dr. Ubaid Ullah", "Pediatrician", &["MBBS", "FCPS (PAEDIATRICS)"], "General Pediatrics"),
                doctor("Dr. Khalid Javaid", "Pediatrician", &["MBBS", "DCH"], "General Pediatrics"),
                doctor(
                    "Dr. Saed Aftab",
                    "Pediatrician",
                    &["MBBS", "MD", "MRCP (PAEDS)", "DABIM", "FAAP", "FACPS"],
                    "General Pediatrics",
                ),
                doctor("Dr. Jaida Manzoor", "Pediatrician", &["MBBS", "FCPS"], "General Pediatrics"),
                doctor(
                    "Dr. Sommayya Aftab",
                    "Pediatric Endocrinologist",
                    &["MBBS (KE)", "FCPS (PAEDS)", "MRCPCH (UK)", "PGPN (BOSTON)"],
                    "Pediatric Endocrinology",
                ),
                doctor("Dr. Nabeela Tallat", "Pediatrician", &["MBBS", "FCPS"], "General Pediatrics"),
                doctor("Dr. Mahmood Shaukat", "Pediatric Surgeon", &["MBBS", "FRCS"], "Pediatric Surgery"),
                doctor(
                    "Dr. Muhammad Saleem",
                    "Pediatric Surgeon",
                    &["MBBS", "FRSC (GLASGOW)", "FRCS TRAUMA"],
                    "Pediatric Surgery",
                ),
                doctor(
                    "Dr. Faiz Rasool",
                    "Pediatric Cardiac Surgeon",
                    &["MBBS", "FCPS (CARDIAC SURGERY)"],
                    "Pediatric Cardiac Surgery",
                ),
                doctor(
                    "Dr. Mehwish Faizan",
                    "Pediatric Hematologist/Oncologist",
                    &["MBBS", "MCPS", "FCPS"],
                    "Pediatric Hematology/Oncology",
                ),
                doctor(
                    "Dr. Syed Najam Hyder",
                    "Pediatric Cardiologist",
                    &["MBBS", "MCPS", "FCPS"],
                    "Pediatric Cardiology",
                ),
            ],
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
