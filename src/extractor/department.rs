//! 진료과 페이지 추출기

use super::names::{mine_free_text, mine_malformed_entry};
use super::text::{clean_list, clean_text, title_case};
use super::{first_success, slug_under, Strategy};
use crate::config::FormatterConfig;
use crate::model::{DoctorMention, RawDepartment};
use crate::raw::{ListField, PageType, RawPage};

/// 진료과 페이지 → `RawDepartment`
///
/// `department_page` 는 URL/제목에서 이름을 만들고,
/// `general_page` 는 설정된 URL 규칙에 걸릴 때만 강제 이름으로 진료과가 됩니다.
#[derive(Debug, Clone, Default)]
pub struct DepartmentExtractor {
    /// (URL 조각, 진료과 이름)
    general_page_rules: Vec<(String, String)>,
}

impl DepartmentExtractor {
    pub fn new(config: &FormatterConfig) -> Self {
        Self {
            general_page_rules: config.general_page_departments.clone(),
        }
    }

    /// 페이지 1건에서 원본 진료과 추출
    ///
    /// 이름을 만들 수 없거나 진료과 페이지가 아니면 `None`.
    pub fn extract(&self, page: &RawPage) -> Option<RawDepartment> {
        let name = match page.page_type {
            PageType::DepartmentPage => {
                first_success(page, &[name_from_url, name_from_title] as &[Strategy<String>])
            }
            PageType::GeneralPage => self.forced_name(&page.url),
            _ => None,
        }?;

        let description = first_success(
            page,
            &[description_from_body, description_from_info, description_from_page]
                as &[Strategy<String>],
        )
        .unwrap_or_default();

        let doctor_mentions = mine_doctor_mentions(page);
        tracing::debug!(
            "Department page {:?}: {} doctor mention(s)",
            name,
            doctor_mentions.len()
        );

        Some(RawDepartment {
            name,
            description,
            services: clean_list(page.list_field(ListField::Services)),
            procedures: clean_list(page.list_field(ListField::Procedures)),
            faqs: clean_list(page.list_field(ListField::Faqs)),
            facilities: clean_list(page.list_field(ListField::Facilities)),
            doctor_mentions,
            url: page.url.clone(),
        })
    }

    fn forced_name(&self, url: &str) -> Option<String> {
        self.general_page_rules
            .iter()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .map(|(_, name)| name.clone())
    }
}

// ============================================================================
// Name / Description Strategies
// ============================================================================

/// `/departments/urology-and-lithotripsy/` → `Urology And Lithotripsy`
fn name_from_url(page: &RawPage) -> Option<String> {
    let url = url::Url::parse(&page.url).ok()?;
    let slug = slug_under(&url, "departments")?;
    let name = title_case(slug.replace('-', " ").trim());
    (!name.is_empty()).then_some(name)
}

/// `Cardiology - Hameed Latif Hospital` → `Cardiology`
fn name_from_title(page: &RawPage) -> Option<String> {
    let first = page.title.split(['-', '|', '–']).next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

fn description_from_body(page: &RawPage) -> Option<String> {
    let text = clean_text(&page.main_content);
    (!text.is_empty()).then_some(text)
}

fn description_from_info(page: &RawPage) -> Option<String> {
    let text = clean_text(page.department_info.as_ref()?.description.as_deref()?);
    (!text.is_empty()).then_some(text)
}

fn description_from_page(page: &RawPage) -> Option<String> {
    page.descriptions
        .iter()
        .map(|d| clean_text(d))
        .find(|d| !d.is_empty())
}

// ============================================================================
// Doctor Mentions
// ============================================================================

/// 페이지 전체에서 의사 언급 수집
///
/// 서로 독립적인 패스의 결과를 합치고 이름 기준으로 중복을 제거합니다 (처음 본 순서 유지).
/// 1. `doctors` 목록 필드 (형식이 깨진 항목)
/// 2. 본문
/// 3. 보조 필드 (services / procedures / faqs / descriptions)
fn mine_doctor_mentions(page: &RawPage) -> Vec<DoctorMention> {
    let from_list = page
        .doctors
        .iter()
        .filter_map(|entry| mine_malformed_entry(entry));

    let from_body = mine_free_text(&page.main_content);

    let from_aux = [
        page.list_field(ListField::Services),
        page.list_field(ListField::Procedures),
        page.list_field(ListField::Faqs),
        page.descriptions.iter().map(String::as_str).collect(),
    ]
    .into_iter()
    .flat_map(|field| mine_free_text(&field.join(" ")));

    let mut mentions: Vec<DoctorMention> = Vec::new();
    for mention in from_list.chain(from_body).chain(from_aux) {
        if !mentions.iter().any(|m| m.name == mention.name) {
            mentions.push(mention);
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
    use crate::raw::RawDepartmentInfo;

    fn department_page(url: &str, title: &str) -> RawPage {
        RawPage {
            url: url.to_string(),
            title: title.to_string(),
            page_type: PageType::DepartmentPage,
            ..Default::default()
        }
    }

    fn extractor() -> DepartmentExtractor {
        DepartmentExtractor::new(&FormatterConfig::default())
    }

    #[test]
    fn test_name_from_url_slug() {
        let page = department_page(
            "https://www.hameedlatifhospital.com/departments/urology-and-lithotripsy/",
            "Something Else - Hameed Latif Hospital",
        );
        let dept = extractor().extract(&page).unwrap();
        assert_eq!(dept.name, "Urology And Lithotripsy");
    }

    #[test]
    fn test_name_from_nested_url_uses_last_segment() {
        let page = department_page(
            "https://www.hameedlatifhospital.com/departments/cardiology/heart-clinic/",
            "Cardiology - Hameed Latif Hospital",
        );
        assert_eq!(extractor().extract(&page).unwrap().name, "Heart Clinic");
    }

    #[test]
    fn test_name_from_title_fallback() {
        let page = department_page(
            "https://www.hameedlatifhospital.com/cardiology/",
            "Cardiology | Hameed Latif Hospital",
        );
        assert_eq!(extractor().extract(&page).unwrap().name, "Cardiology");
    }

    #[test]
    fn test_no_name_is_skipped() {
        let page = department_page("not a url", "   ");
        assert!(extractor().extract(&page).is_none());
    }

    #[test]
    fn test_general_page_rule() {
        let mut page = department_page(
            "https://www.hameedlatifhospital.com/dermatology-cosmetology/",
            "Dermatology & Cosmetology",
        );
        page.page_type = PageType::GeneralPage;
        assert_eq!(extractor().extract(&page).unwrap().name, "Dermatology");

        page.url = "https://www.hameedlatifhospital.com/careers/".to_string();
        assert!(extractor().extract(&page).is_none());
    }

    #[test]
    fn test_other_page_types_ignored() {
        let mut page = department_page("https://example.com/departments/ent/", "ENT");
        page.page_type = PageType::ContactPage;
        assert!(extractor().extract(&page).is_none());
    }

    #[test]
    fn test_content_fields() {
        let page = RawPage {
            main_content: "Kidney care   and dialysis. © 2024 Hospital".to_string(),
            services: vec!["Hemodialysis sessions".to_string(), "Short".to_string()],
            department_info: Some(RawDepartmentInfo {
                services: vec!["Hemodialysis sessions".to_string(), "Kidney biopsy service".to_string()],
                faqs: vec!["How long does dialysis take?".to_string()],
                ..Default::default()
            }),
            ..department_page("https://example.com/departments/nephrology/", "")
        };

        let dept = extractor().extract(&page).unwrap();
        assert_eq!(dept.name, "Nephrology");
        assert_eq!(dept.description, "Kidney care and dialysis.");
        assert_eq!(dept.services, vec!["Hemodialysis sessions", "Kidney biopsy service"]);
        assert_eq!(dept.faqs, vec!["How long does dialysis take?"]);
        assert!(dept.procedures.is_empty());
        assert_eq!(dept.url, "https://example.com/departments/nephrology/");
    }

    #[test]
    fn test_doctor_mentions_union() {
        let page = RawPage {
            doctors: vec![
                "Dr. Imran Qureshi Urologist Dr".to_string(),
                "Book appointment".to_string(),
            ],
            main_content: "Our consultants Dr. Sadia Malik MBBS and Dr. Imran Qureshi Urologist."
                .to_string(),
            faqs: vec!["Who performs lithotripsy? Dr. Omer Farooq Consultant".to_string()],
            ..department_page("https://example.com/departments/urology-and-lithotripsy/", "")
        };

        let dept = extractor().extract(&page).unwrap();
        let names: Vec<&str> = dept.doctor_names().collect();
        assert_eq!(
            names,
            vec!["Dr. Imran Qureshi", "Dr. Sadia Malik", "Dr. Omer Farooq"]
        );
        assert_eq!(
            dept.doctor_mentions[0].specialization.as_deref(),
            Some("Urologist")
        );
    }
}
