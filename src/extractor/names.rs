//! 의사 이름 마이닝
//!
//! 진료과 페이지의 깨진 목록 문자열이나 본문에서 `Dr. ...` 형태의 이름을 찾아냅니다.
//! 결과 이름은 모두 [`normalize_doctor_name`] 으로 정규화됩니다.

use std::sync::OnceLock;

use regex::Regex;

use super::text::{collapse_whitespace, normalize_doctor_name};
use crate::model::DoctorMention;

/// 이름 최소 길이 (`Dr. ` 포함)
const MIN_NAME_LEN: usize = 9;

/// 이름 뒤에 붙어 나오는 전문분야 표기
const SPECIALTIES: &[&str] = &[
    r"Peadiatrician",
    r"Pediatrician",
    r"Cardiologist",
    r"Urologist",
    r"Gynecologist",
    r"Orthopedic",
    r"Neurologist",
    r"Anesthesiologist",
    r"Radiologist",
    r"General\s+Surgeon",
    r"ENT",
    r"Physiotherapist",
    r"Plastic\s+Surgeon",
    r"Gastroenterologist",
    r"Nephrologist",
    r"Endocrinologist/\s+Diabaties",
    r"Endocrinologist",
    r"Dermatologist",
    r"Oncologist",
    r"Psychiatrist",
    r"Dental\s+Surgeon",
    r"Lactation\s+Specialist",
    r"Ophthalmologist",
    r"Opthalmologist",
    r"Speech\s+and\s+Language\s+Therapist",
    r"Infectious\s+Disease\s+Specialist",
    r"Rheumatologist",
    r"Pulmonologist",
    r"Interventional\s+Radiologist",
    r"Cardiac\s+Surgeon",
    r"Neurosurgeon",
    r"Peads\s+Surgeon",
    r"Paeds\s+Cardiologist",
    r"Peads\s+Cardiologist",
    r"Peads\s+Hemotologist",
    r"Fetal\s+Medicine",
];

/// 이름 끝을 알리는 학위/섹션 표기
const TERMINATORS: &str = r"MBBS|MD|FCPS|MS|PhD|BSc|MSc|FRCS|MRCP|FACS|FICS|MCPS|Specialist|Consultant|Professor|Senior|Head|Department|Specialty|Speciality|Degrees|Areas|Clinic|Appointment";

/// 경칭 접두사 + `Dr.`
const PREFIX: &str = r"(?:Prof\.\s+)?(?:Col\.\(R\)\.\s+)?(?:Brig\.\s+)?Dr\.\s+";

/// 이름 본체 (대문자로 시작하는 단어 최대 5개)
const NAME_WORDS: &str = r"[A-Z][A-Za-z\-\.()]*(?:\s+[A-Z][A-Za-z\-\.()]*){0,4}?";

/// 전문분야 대안 그룹 (대소문자 무시)
fn specialty_alternation() -> String {
    format!("(?i:{})", SPECIALTIES.join("|"))
}

fn mention(raw_name: &str, specialization: Option<&str>) -> Option<DoctorMention> {
    let raw_name = raw_name.trim_end_matches(|c: char| c == '.' || c == ',' || c == '-');
    let name = normalize_doctor_name(raw_name)?;
    if name.chars().count() < MIN_NAME_LEN {
        return None;
    }

    Some(DoctorMention {
        name,
        specialization: specialization
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty()),
    })
}

/// 깨진 목록 문자열 하나에서 의사 1명 추출
///
/// 패턴을 순서대로 시도하고 첫 번째로 유효한 이름이 나오면 멈춥니다.
/// 1. `이름 전문분야 Dr...` (다음 의사 이름이 붙어버린 경우)
/// 2. `이름 전문분야`
/// 3. 문자열 전체가 이름
pub fn mine_malformed_entry(text: &str) -> Option<DoctorMention> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        let specialties = specialty_alternation();
        vec![
            Regex::new(&format!(
                r"^({PREFIX}{NAME_WORDS})\s+({specialties})\s+Dr(?:\s|\.|$)"
            ))
            .unwrap(),
            Regex::new(&format!(r"^({PREFIX}{NAME_WORDS})\s+({specialties})(?:\s|$)")).unwrap(),
            Regex::new(&format!(
                r"^({PREFIX}[A-Za-z\-\.()]+(?:\s+[A-Za-z\-\.()]+){{0,3}})$"
            ))
            .unwrap(),
        ]
    });

    let text = collapse_whitespace(text);
    if text.is_empty() {
        return None;
    }

    patterns.iter().find_map(|re| {
        let caps = re.captures(&text)?;
        let name = caps.get(1)?.as_str();
        mention(name, caps.get(2).map(|m| m.as_str()))
    })
}

/// 자유 본문에서 모든 의사 언급 추출 (이름 기준 중복 제거, 등장 순서 유지)
pub fn mine_free_text(text: &str) -> Vec<DoctorMention> {
    static WITH_SPECIALTY: OnceLock<Regex> = OnceLock::new();
    static WITH_TERMINATOR: OnceLock<Regex> = OnceLock::new();

    let with_specialty = WITH_SPECIALTY.get_or_init(|| {
        Regex::new(&format!(
            r"\b({PREFIX}{NAME_WORDS})\s+({})\b",
            specialty_alternation()
        ))
        .unwrap()
    });
    let with_terminator = WITH_TERMINATOR.get_or_init(|| {
        Regex::new(&format!(
            r"(?m)\b({PREFIX}{NAME_WORDS})(?:\s+(?:{TERMINATORS})\b|\s*[-–]|\s*$)"
        ))
        .unwrap()
    });

    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut mentions: Vec<DoctorMention> = Vec::new();
    let mut push = |found: Option<DoctorMention>| {
        if let Some(found) = found {
            if !mentions.iter().any(|m| m.name == found.name) {
                mentions.push(found);
            }
        }
    };

    // 전문분야 패턴이 이미 잡은 위치는 종결어 패턴에서 다시 보지 않음
    let mut claimed = Vec::new();
    for caps in with_specialty.captures_iter(text) {
        if let Some(name) = caps.get(1) {
            claimed.push(name.start());
            push(mention(name.as_str(), caps.get(2).map(|m| m.as_str())));
        }
    }

    for caps in with_terminator.captures_iter(text) {
        if let Some(name) = caps.get(1) {
            if !claimed.contains(&name.start()) {
                push(mention(name.as_str(), None));
            }
        }
    }

    mentions
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_with_trailing_next_doctor() {
        let found = mine_malformed_entry("Dr. Asad Mahmood Cardiologist Dr").unwrap();
        assert_eq!(found.name, "Dr. Asad Mahmood");
        assert_eq!(found.specialization.as_deref(), Some("Cardiologist"));
    }

    #[test]
    fn test_malformed_with_specialty() {
        let found = mine_malformed_entry("Prof. Dr. Nadeem Ahmad   General Surgeon").unwrap();
        assert_eq!(found.name, "Prof. Dr. Nadeem Ahmad");
        assert_eq!(found.specialization.as_deref(), Some("General Surgeon"));
    }

    #[test]
    fn test_malformed_plain_name() {
        let found = mine_malformed_entry("Dr. Sana Tariq").unwrap();
        assert_eq!(found.name, "Dr. Sana Tariq");
        assert_eq!(found.specialization, None);
    }

    #[test]
    fn test_malformed_rejects_noise() {
        assert!(mine_malformed_entry("Book an appointment today").is_none());
        assert!(mine_malformed_entry("Dr. A").is_none());
        assert!(mine_malformed_entry("").is_none());
    }

    #[test]
    fn test_free_text_mentions() {
        let text = "Our team: Dr. Imran Qureshi Urologist and Dr. Sadia Malik MBBS, FCPS. \
                    Contact Dr. Imran Qureshi Urologist for lithotripsy.";
        let mentions = mine_free_text(text);
        let names: Vec<&str> = mentions.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["Dr. Imran Qureshi", "Dr. Sadia Malik"]);
        assert_eq!(mentions[0].specialization.as_deref(), Some("Urologist"));
    }

    #[test]
    fn test_free_text_sentence_end() {
        let mentions = mine_free_text("Consult Dr. Imran Qureshi Urologist.");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].name, "Dr. Imran Qureshi");
    }

    #[test]
    fn test_free_text_empty() {
        assert!(mine_free_text("   ").is_empty());
        assert!(mine_free_text("No doctors listed on this page.").is_empty());
    }
}
