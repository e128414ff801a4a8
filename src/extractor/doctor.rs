//! 의사 프로필 페이지 추출기

use std::sync::OnceLock;

use regex::Regex;

use super::text::{
    clean_text, collapse_whitespace, dedup_preserving_order, normalize_doctor_name, title_case,
};
use super::{first_success, slug_under, Strategy};
use crate::model::{DoctorCandidate, Provenance};
use crate::raw::RawPage;

/// 학위 항목으로 인정하지 않는 섹션 제목
const QUALIFICATION_NOISE: &[&str] =
    &["areas of expertise", "clinic", "appointment", "profile", "home"];

/// 의사 프로필 페이지 → `DoctorCandidate`
#[derive(Debug, Clone, Copy, Default)]
pub struct DoctorExtractor;

impl DoctorExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 프로필 페이지 1건에서 후보 추출
    ///
    /// 이름을 만들 수 없으면 `None` (레코드 건너뜀).
    pub fn extract(&self, page: &RawPage) -> Option<DoctorCandidate> {
        let raw_name = first_success(page, &[name_from_profile, name_from_url] as &[Strategy<String>])?;
        let Some(name) = normalize_doctor_name(&raw_name) else {
            tracing::debug!("No usable doctor name on {}", page.url);
            return None;
        };

        let mut candidate = DoctorCandidate::named(name, Provenance::ProfilePage);
        candidate.specialization = first_success(
            page,
            &[specialization_from_profile, specialization_from_text] as &[Strategy<String>],
        );
        candidate.qualifications = first_success(
            page,
            &[qualifications_from_profile, qualifications_from_text] as &[Strategy<Vec<String>>],
        )
        .unwrap_or_default();
        candidate.appointment_number = first_success(
            page,
            &[appointment_from_profile, appointment_from_text] as &[Strategy<String>],
        );
        candidate.areas_of_expertise = first_success(
            page,
            &[expertise_from_profile, expertise_from_text] as &[Strategy<Vec<String>>],
        )
        .unwrap_or_default();
        candidate.description = first_success(
            page,
            &[description_from_profile, description_from_page] as &[Strategy<String>],
        );
        candidate.profile_url = Some(page.url.clone()).filter(|url| !url.is_empty());

        Some(candidate)
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    (!text.is_empty()).then_some(text)
}

fn non_empty_list(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

// ============================================================================
// Name
// ============================================================================

fn name_from_profile(page: &RawPage) -> Option<String> {
    non_empty(page.doctor_profile.as_ref()?.name.as_deref()?)
}

/// `/doctors/dr-ali-khan/` → `Ali Khan`
fn name_from_url(page: &RawPage) -> Option<String> {
    let url = url::Url::parse(&page.url).ok()?;
    let slug = slug_under(&url, "doctors")?;
    let slug = slug
        .strip_prefix("dr-")
        .or_else(|| slug.strip_prefix("Dr-"))
        .unwrap_or(slug);

    non_empty(&title_case(&slug.replace('-', " ")))
}

// ============================================================================
// Specialization
// ============================================================================

fn specialization_from_profile(page: &RawPage) -> Option<String> {
    non_empty(page.doctor_profile.as_ref()?.specialization.as_deref()?)
}

fn specialization_from_text(page: &RawPage) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)Speciali?ty\s+([A-Za-z\s&/(),.\-]+?)(?:\s+Degrees|\s+Areas|\s+©|$)").unwrap()
    });

    let caps = re.captures(&page.main_content)?;
    non_empty(caps.get(1)?.as_str())
}

// ============================================================================
// Qualifications
// ============================================================================

fn qualifications_from_profile(page: &RawPage) -> Option<Vec<String>> {
    let profile = page.doctor_profile.as_ref()?;
    non_empty_list(clean_qualifications(
        profile.qualifications.iter().map(String::as_str),
    ))
}

fn qualifications_from_text(page: &RawPage) -> Option<Vec<String>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?is)Degrees\s+(.+?)(?:\s+Areas of Expertise|\s+Areas|\s+Clinic|\s+Appointment|\s+©|$)",
        )
        .unwrap()
    });

    let caps = re.captures(&page.main_content)?;
    non_empty_list(clean_qualifications(std::iter::once(caps.get(1)?.as_str())))
}

/// 학위 문자열 정리: 괄호 밖의 `,` `;` 로 분리, 꼬리 구두점 제거, 잡음 제거, 중복 제거
fn clean_qualifications<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<String> {
    let parts = entries
        .flat_map(split_outside_parens)
        .map(|part| {
            collapse_whitespace(part)
                .trim_end_matches(['.', ',', ';', '('])
                .trim()
                .to_string()
        })
        .filter(|part| {
            let len = part.chars().count();
            (2..=150).contains(&len) && !is_qualification_noise(part)
        });

    dedup_preserving_order(parts)
}

fn is_qualification_noise(part: &str) -> bool {
    let lower = part.to_lowercase();
    QUALIFICATION_NOISE.iter().any(|noise| lower.starts_with(noise))
}

/// `MBBS, FCPS (Urology, UK); MRCS` → [`MBBS`, `FCPS (Urology, UK)`, `MRCS`]
fn split_outside_parens(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | ';' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);

    parts
}

// ============================================================================
// Appointment / Expertise / Description
// ============================================================================

fn appointment_from_profile(page: &RawPage) -> Option<String> {
    non_empty(page.doctor_profile.as_ref()?.appointment_number.as_deref()?)
}

fn appointment_from_text(page: &RawPage) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)Appointment\s+Number\s*:?\s*([+\d\s()\-]+)").unwrap());

    let number = non_empty(re.captures(&page.main_content)?.get(1)?.as_str())?;
    number.chars().any(|c| c.is_ascii_digit()).then_some(number)
}

fn expertise_from_profile(page: &RawPage) -> Option<Vec<String>> {
    let profile = page.doctor_profile.as_ref()?;
    let items = dedup_preserving_order(
        profile
            .expertise
            .iter()
            .map(|item| collapse_whitespace(item))
            .filter(|item| !item.is_empty()),
    );

    // 섹션 제목만 잡힌 경우는 값 없음으로 취급
    if items.len() == 1 && items[0] == "Clinic" {
        return None;
    }
    non_empty_list(items)
}

fn expertise_from_text(page: &RawPage) -> Option<Vec<String>> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)Areas of Expertise\s+([^©]+?)(?:Clinic|Appointment|©|$)").unwrap()
    });

    let block = re.captures(&page.main_content)?.get(1)?.as_str();
    non_empty_list(dedup_preserving_order(
        block
            .split([',', ';', '•'])
            .map(collapse_whitespace)
            .filter(|item| item.chars().count() > 2),
    ))
}

fn description_from_profile(page: &RawPage) -> Option<String> {
    let text = clean_text(page.doctor_profile.as_ref()?.description.as_deref()?);
    (!text.is_empty()).then_some(text)
}

fn description_from_page(page: &RawPage) -> Option<String> {
    page.descriptions
        .iter()
        .map(|d| clean_text(d))
        .find(|d| !d.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
