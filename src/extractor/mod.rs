//! 엔티티 추출 모듈
//!
//! 크롤링된 페이지 1건을 정규화된 후보 레코드로 바꿉니다.
//! - 의사 프로필 페이지: [`DoctorExtractor`] → `DoctorCandidate`
//! - 진료과 페이지: [`DepartmentExtractor`] → `RawDepartment` (+ 언급된 의사 이름)
//!
//! 각 필드는 우선순위가 정해진 추출 전략 목록으로 채워지며,
//! 첫 번째로 값을 돌려준 전략의 결과를 사용합니다.

mod department;
mod doctor;
mod names;
mod text;

pub use department::DepartmentExtractor;
pub use doctor::DoctorExtractor;
pub use names::{mine_free_text, mine_malformed_entry};
pub use text::{
    clean_list, clean_text, collapse_whitespace, dedup_preserving_order, normalize_doctor_name,
    title_case,
};

use crate::raw::RawPage;

/// 추출 전략: 페이지에서 값을 찾으면 `Some`
pub(crate) type Strategy<T> = fn(&RawPage) -> Option<T>;

/// 전략을 순서대로 시도하고 첫 번째 성공 결과 반환 (이후 전략은 호출하지 않음)
pub(crate) fn first_success<T>(page: &RawPage, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(page))
}

/// `<marker>/` 아래 경로의 마지막 세그먼트 (`/departments/cardiology/heart-clinic/` → `heart-clinic`)
pub(crate) fn slug_under<'a>(url: &'a url::Url, marker: &str) -> Option<&'a str> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let position = segments.iter().position(|s| *s == marker)?;
    segments[position + 1..].last().copied()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static CALLS: Cell<usize> = Cell::new(0);
    }

    fn none(_: &RawPage) -> Option<String> {
        CALLS.with(|c| c.set(c.get() + 1));
        None
    }

    fn title(page: &RawPage) -> Option<String> {
        CALLS.with(|c| c.set(c.get() + 1));
        Some(page.title.clone())
    }

    #[test]
    fn test_first_success_stops_at_first_hit() {
        let page = RawPage {
            title: "Cardiology".to_string(),
            ..Default::default()
        };

        let strategies: [Strategy<String>; 3] = [none, title, title];
        CALLS.with(|c| c.set(0));
        let found = first_success(&page, &strategies);

        assert_eq!(found.as_deref(), Some("Cardiology"));
        assert_eq!(CALLS.with(|c| c.get()), 2);
    }

    #[test]
    fn test_first_success_all_fail() {
        let strategies: [Strategy<String>; 2] = [none, none];
        assert_eq!(first_success(&RawPage::default(), &strategies), None);
    }

    #[test]
    fn test_slug_under() {
        let url = url::Url::parse("https://example.com/departments/ent/").unwrap();
        assert_eq!(slug_under(&url, "departments"), Some("ent"));
        assert_eq!(slug_under(&url, "doctors"), None);

        let nested =
            url::Url::parse("https://example.com/departments/cardiology/heart-clinic/").unwrap();
        assert_eq!(slug_under(&nested, "departments"), Some("heart-clinic"));

        let bare = url::Url::parse("https://example.com/departments/").unwrap();
        assert_eq!(slug_under(&bare, "departments"), None);
    }
}
