//! 포매터 파이프라인
//!
//! 스크랩 원본 → 정제된 엔티티 그래프 (진료과/의사, ID 상호 참조).
//!
//! 순서 (되돌아가는 단계 없음):
//! 1. 수기 명단 선등록
//! 2. 페이지별 추출 및 등록 (의사 프로필 / 진료과 페이지)
//! 3. 진료과 통합 (분류 체계로 매핑, 콘텐츠 병합)
//! 4. 수기 명단 진료과 고정 배정
//! 5. 나머지 의사 배정 (3개 패스)
//! 6. 출력 조립 및 저장

pub mod consolidator;
mod output;
pub mod resolver;

pub use consolidator::{
    absorb_roster, consolidate, Consolidation, DepartmentMapper, MappedName, UnmappedDepartment,
};
pub use output::{
    summarize, AssemblyInput, DataSummary, ExtractionMetadata, FormattedData, OutputAssembler,
};
pub use resolver::{
    Assignment, AssignmentReport, AssignmentStrategy, DoctorAssignmentResolver, MentionIndex,
    UnassignedDoctor,
};

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::FormatterConfig;
use crate::error::{FormatError, Result};
use crate::extractor::{DepartmentExtractor, DoctorExtractor};
use crate::model::{Department, Doctor, DoctorCandidate, Provenance};
use crate::raw::{load_raw_pages, PageType, RawPage};
use crate::registry::{Registered, Registry};

/// 의사와 진료과를 양쪽에서 연결 (이미 배정된 의사는 그대로 두고 `false`)
pub(crate) fn link_doctor(doctor: &mut Doctor, department: &mut Department) -> bool {
    if doctor.is_assigned() {
        return false;
    }
    doctor.department_id = Some(department.id);
    department.push_doctor(doctor.id);
    true
}

// ============================================================================
// Formatter
// ============================================================================

/// 포맷 실행 결과
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    pub data: FormattedData,
    pub report: AssignmentReport,
}

/// 실행 중 페이지 처리 통계
#[derive(Debug, Default, Clone, Copy)]
struct PageStats {
    doctors_new: usize,
    doctors_duplicate: usize,
    departments: usize,
    skipped: usize,
    ignored: usize,
}

/// 포매터
pub struct Formatter {
    config: FormatterConfig,
}

impl Formatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// 파일 → 파일 전체 실행
    ///
    /// 입력을 읽을 수 없거나 저장에 실패하면 실행 전체가 실패합니다 (부분 출력 없음).
    pub async fn run(&self, input: &Path, output: &Path) -> Result<FormatOutcome> {
        let pages = load_raw_pages(input).await?;
        let outcome = self.format_pages(&pages, &input.display().to_string(), Utc::now());
        save_formatted(&outcome.data, output).await?;

        tracing::info!("Saved formatted data to {:?}", output);
        Ok(outcome)
    }

    /// 메모리 안에서 파이프라인 실행 (I/O 없음)
    pub fn format_pages(
        &self,
        pages: &[RawPage],
        source_file: &str,
        formatted_at: DateTime<Utc>,
    ) -> FormatOutcome {
        let config = &self.config;
        let mut registry = Registry::new();
        let seeded = registry.seed(&config.seed_roster);

        let stats = self.register_pages(&mut registry, pages);
        tracing::info!(
            "Pages: {} doctors registered ({} duplicates), {} department pages, {} skipped, {} ignored",
            stats.doctors_new,
            stats.doctors_duplicate,
            stats.departments,
            stats.skipped,
            stats.ignored
        );

        if config.register_page_mentions {
            register_page_mentions(&mut registry);
        }

        let mut consolidation = consolidate(registry.raw_departments(), config);
        let mentions = MentionIndex::build(registry.raw_departments(), &consolidation.raw_targets);
        tracing::debug!("Mention index holds {} doctor names", mentions.len());

        absorb_roster(&mut consolidation.departments, &mut registry, &config.seed_roster);
        let report = DoctorAssignmentResolver::new(config).resolve(
            &mut registry,
            &mut consolidation.departments,
            &mentions,
        );

        let (doctors, _) = registry.into_parts();
        let data = OutputAssembler::new(config).assemble(
            AssemblyInput {
                departments: consolidation.departments,
                doctors,
                unassigned: report.unassigned.clone(),
                unmapped: consolidation.unmapped,
                seeded_doctors: seeded.len(),
                source_file,
            },
            formatted_at,
        );

        FormatOutcome { data, report }
    }

    fn register_pages(&self, registry: &mut Registry, pages: &[RawPage]) -> PageStats {
        let doctor_extractor = DoctorExtractor::new();
        let department_extractor = DepartmentExtractor::new(&self.config);
        let mut stats = PageStats::default();

        for page in pages {
            match page.page_type {
                PageType::DoctorProfile => match doctor_extractor.extract(page) {
                    Some(candidate) => match registry.register_doctor(candidate) {
                        Registered::New(_) => stats.doctors_new += 1,
                        Registered::Existing(_) => stats.doctors_duplicate += 1,
                    },
                    None => {
                        tracing::debug!("Skipping doctor page without a name: {}", page.url);
                        stats.skipped += 1;
                    }
                },
                PageType::DepartmentPage | PageType::GeneralPage => {
                    match department_extractor.extract(page) {
                        Some(department) => {
                            registry.register_department_raw(department);
                            stats.departments += 1;
                        }
                        None if page.page_type == PageType::DepartmentPage => {
                            tracing::debug!("Skipping department page without a name: {}", page.url);
                            stats.skipped += 1;
                        }
                        None => stats.ignored += 1,
                    }
                }
                _ => stats.ignored += 1,
            }
        }

        stats
    }
}

/// 진료과 페이지에서 찾은 의사를 텍스트 마이닝 출처로 등록 (모든 페이지 처리 후)
fn register_page_mentions(registry: &mut Registry) {
    let candidates: Vec<DoctorCandidate> = registry
        .raw_departments()
        .iter()
        .flat_map(|raw| &raw.doctor_mentions)
        .map(|mention| {
            let mut candidate = DoctorCandidate::named(mention.name.clone(), Provenance::TextMined);
            candidate.specialization = mention.specialization.clone();
            candidate
        })
        .collect();

    let mut added = 0;
    for candidate in candidates {
        if registry.register_doctor(candidate).is_new() {
            added += 1;
        }
    }
    tracing::info!("Registered {} doctors from page mentions", added);
}

// ============================================================================
// Persistence
// ============================================================================

/// 엔티티 그래프 저장 (pretty JSON)
///
/// 같은 디렉토리의 임시 파일에 쓴 뒤 이름을 바꾸므로, 실패해도 대상 경로에 일부만 쓰인 파일이 남지 않습니다.
pub async fn save_formatted(data: &FormattedData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    let persist_err = |source| FormatError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
    }

    let tmp = temp_path_for(path);
    if let Err(source) = tokio::fs::write(&tmp, json).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(persist_err(source));
    }
    if let Err(source) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(persist_err(source));
    }
    Ok(())
}

/// `out/formatted.json` → `out/.formatted.json.tmp`
fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "formatted".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// 저장된 엔티티 그래프 로드
pub async fn load_formatted(path: &Path) -> Result<FormattedData> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&text).map_err(|source| FormatError::MalformedSnapshot {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
