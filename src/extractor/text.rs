//! 텍스트 정리 유틸리티
//!
//! 공백 정리, 푸터/폼 잡음 제거, 의사 이름 정규화를 담당합니다.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// 연속 공백을 하나로 합치고 양끝 공백 제거
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 본문 텍스트 정리
///
/// 공백 정리 후 저작권 표기, 문의 폼 꼬리 등 모든 페이지에 반복되는 잡음을 제거합니다.
pub fn clean_text(text: &str) -> String {
    static NOISE: OnceLock<Vec<Regex>> = OnceLock::new();
    let noise = NOISE.get_or_init(|| {
        [
            r"(?i)©\s*\d{4}[^.]*",
            r"(?i)All rights reserved[^.]*",
            r"(?i)Powered by[^.]*",
            r"(?i)Skip to content",
            r"(?i)Back to top",
            r"(?i)FIRST NAME PHONE NUMBER.*",
            r"(?i)We will contact you within one business day.*",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    });

    let mut text = collapse_whitespace(text);
    for re in noise {
        text = re.replace_all(&text, "").into_owned();
    }

    collapse_whitespace(&text)
}

/// 첫 등장 순서를 유지하며 중복 제거
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// 목록 필드 정리: 잡음 제거 후 10자 초과 항목만, 중복 제거
pub fn clean_list<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    dedup_preserving_order(
        items
            .into_iter()
            .map(clean_text)
            .filter(|item| item.chars().count() > 10),
    )
}

/// 단어 첫 글자 대문자, 나머지 소문자 (`urology and lithotripsy` → `Urology And Lithotripsy`)
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            result.push(c);
            prev_alpha = false;
        }
    }

    result
}

// ============================================================================
// Doctor Name Normalization
// ============================================================================

/// 의사 이름 정규화
///
/// - 공백 정리
/// - 경칭 순서 정규화 (`Dr. Professor Dr` → `Prof. Dr.`, `Brigadier Dr.` → `Brig. Dr.`)
/// - 전부 소문자인 이름은 단어별 대문자화
/// - 앞자리에 다른 경칭이 없으면 `Dr.` 부여
pub fn normalize_doctor_name(raw: &str) -> Option<String> {
    static REWRITES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    static HONORIFIC: OnceLock<Regex> = OnceLock::new();

    let rewrites = REWRITES.get_or_init(|| {
        [
            (r"(?i)^dr\.?\s+prof(?:essor|\.)?\s+dr\.?\s+", "Prof. Dr. "),
            (r"(?i)^dr\.?\s+brig(?:adier|\.)?\s+dr\.?\s+", "Brig. Dr. "),
            (r"(?i)^prof(?:essor|\.)?\s+dr\.?\s+", "Prof. Dr. "),
            (r"(?i)^brig(?:adier|\.)?\s+dr\.?\s+", "Brig. Dr. "),
            (r"(?i)^dr\.?\s+", "Dr. "),
        ]
        .iter()
        .map(|(p, r)| (Regex::new(p).unwrap(), *r))
        .collect()
    });
    let honorific = HONORIFIC.get_or_init(|| Regex::new(r"^(?:Dr\.|Prof\.|Brig\.|Col\.)").unwrap());

    let name = collapse_whitespace(raw);
    if name.is_empty() {
        return None;
    }

    // 경칭 재작성은 첫 번째로 일치하는 규칙 하나만 적용
    let mut name = rewrites
        .iter()
        .find(|(re, _)| re.is_match(&name))
        .map(|(re, replacement)| re.replacen(&name, 1, *replacement).into_owned())
        .unwrap_or(name);

    let (prefix, rest) = split_honorifics(&name);
    if !rest.is_empty() && !rest.chars().any(char::is_uppercase) {
        name = format!("{}{}", prefix, title_case(rest));
    }

    if !honorific.is_match(&name) {
        name = format!("Dr. {}", name);
    }

    let name = collapse_whitespace(&name);
    // 경칭만 남은 경우
    if split_honorifics(&name).1.is_empty() {
        return None;
    }

    Some(name)
}

/// 선행 경칭(`Prof. Dr. ` 등)과 나머지 이름 분리
fn split_honorifics(name: &str) -> (&str, &str) {
    let mut end = 0;
    for token in name.split_inclusive(' ') {
        match token.trim_end() {
            "Dr." | "Prof." | "Brig." | "Col." | "Col.(R)." => end += token.len(),
            _ => break,
        }
    }
    (&name[..end], name[end..].trim())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_clean_text_removes_noise() {
        let text = "Cardiology care.   Skip to content © 2024 Hameed Latif Hospital all rights";
        assert_eq!(clean_text(text), "Cardiology care.");

        let form = "Book now FIRST NAME PHONE NUMBER EMAIL submit";
        assert_eq!(clean_text(form), "Book now");
    }

    #[test]
    fn test_clean_list() {
        let items = vec![
            "Short",
            "Coronary angiography",
            "  Coronary   angiography ",
            "Echocardiography tests",
        ];
        assert_eq!(
            clean_list(items),
            vec!["Coronary angiography", "Echocardiography tests"]
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("urology and lithotripsy"), "Urology And Lithotripsy");
        assert_eq!(title_case("ENT"), "Ent");
        assert_eq!(title_case("neurosurgery & spine"), "Neurosurgery & Spine");
    }

    #[test]
    fn test_normalize_adds_dr_prefix() {
        assert_eq!(normalize_doctor_name("Ali Khan"), Some("Dr. Ali Khan".to_string()));
        assert_eq!(normalize_doctor_name("  Dr.   Ali  Khan "), Some("Dr. Ali Khan".to_string()));
        assert_eq!(normalize_doctor_name("dr ali khan"), Some("Dr. Ali Khan".to_string()));
    }

    #[test]
    fn test_normalize_honorific_order() {
        assert_eq!(
            normalize_doctor_name("Dr. Prof Dr Ahmed Raza"),
            Some("Prof. Dr. Ahmed Raza".to_string())
        );
        assert_eq!(
            normalize_doctor_name("Dr. Professor Dr Ahmed Raza"),
            Some("Prof. Dr. Ahmed Raza".to_string())
        );
        assert_eq!(
            normalize_doctor_name("Professor Dr. Ahmed Raza"),
            Some("Prof. Dr. Ahmed Raza".to_string())
        );
        assert_eq!(
            normalize_doctor_name("Brigadier Dr. Ahmed Raza"),
            Some("Brig. Dr. Ahmed Raza".to_string())
        );
        assert_eq!(
            normalize_doctor_name("Dr. Brig Dr Ahmed Raza"),
            Some("Brig. Dr. Ahmed Raza".to_string())
        );
    }

    #[test]
    fn test_normalize_keeps_mixed_case() {
        assert_eq!(
            normalize_doctor_name("Dr. Ubaid ul Haq"),
            Some("Dr. Ubaid ul Haq".to_string())
        );
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(normalize_doctor_name("   "), None);
        assert_eq!(normalize_doctor_name("Dr."), None);
    }

    #[test]
    fn test_dedup_preserving_order() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup_preserving_order(items), vec!["b", "a"]);
    }
}
