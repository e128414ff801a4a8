//! CLI 모듈
//!
//! hospital-rag CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::FormatterConfig;
use crate::formatter::{load_formatted, AssignmentStrategy, FormatOutcome, Formatter};
use crate::knowledge::{build_items, get_data_dir, ItemStore, ItemType, SearchMethod};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "hospital-rag")]
#[command(version, about = "병원 웹사이트 RAG 데이터 정제기", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 스크랩 원본 → 정제된 엔티티 그래프 JSON
    Format {
        /// 스크랩 원본 JSON 파일
        input: PathBuf,

        /// 출력 파일
        #[arg(short, long, default_value = "formatted_data.json")]
        output: PathBuf,

        /// 설정 파일 (JSON, 생략 시 내장 기본값)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 진료과 페이지에서 언급만 된 의사도 등록
        #[arg(long)]
        register_page_mentions: bool,
    },

    /// 엔티티 그래프 → 검색 항목 JSON
    Items {
        /// 정제된 엔티티 그래프 JSON 파일
        input: PathBuf,

        /// 출력 파일
        #[arg(short, long, default_value = "searchable_items.json")]
        output: PathBuf,
    },

    /// 엔티티 그래프 → 검색 인덱스 (기존 항목 교체)
    Index {
        /// 정제된 엔티티 그래프 JSON 파일
        input: PathBuf,

        /// 인덱스 DB 경로 (기본: ~/.hospital-rag/items.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// 검색 인덱스 키워드 검색
    Search {
        /// 검색 쿼리
        query: String,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// 인덱스 DB 경로
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// 인덱스에 저장된 항목 목록
    List {
        /// 항목 종류 필터 (hospital_info, department, doctor)
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,

        /// 결과 개수 제한
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// 인덱스 DB 경로
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// 항목 1건 전체 내용 보기
    Show {
        /// 항목 ID (예: dept_1, doc_42)
        item_id: String,

        /// 인덱스 DB 경로
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// FTS5 인덱스 재생성
    Reindex {
        /// 인덱스 DB 경로
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// 상태 확인
    Status {
        /// 인덱스 DB 경로
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Format {
            input,
            output,
            config,
            register_page_mentions,
        } => cmd_format(&input, &output, config.as_deref(), register_page_mentions).await,
        Commands::Items { input, output } => cmd_items(&input, &output).await,
        Commands::Index { input, db } => cmd_index(&input, db).await,
        Commands::Search { query, limit, db } => cmd_search(&query, limit, db).await,
        Commands::List {
            item_type,
            limit,
            db,
        } => cmd_list(item_type.as_deref(), limit, db).await,
        Commands::Show { item_id, db } => cmd_show(&item_id, db).await,
        Commands::Reindex { db } => cmd_reindex(db).await,
        Commands::Status { db } => cmd_status(db).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 포맷 명령어 (format)
async fn cmd_format(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    register_page_mentions: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => FormatterConfig::load(path)
            .with_context(|| format!("설정 파일 읽기 실패: {}", path.display()))?,
        None => FormatterConfig::default(),
    };
    if register_page_mentions {
        config.register_page_mentions = true;
    }

    println!("[*] 원본 읽는 중: {}", input.display());

    let outcome = Formatter::new(config)
        .run(input, output)
        .await
        .context("포맷 실행 실패")?;

    print_format_summary(&outcome);
    println!("[OK] 저장됨: {}", output.display());

    Ok(())
}

fn print_format_summary(outcome: &FormatOutcome) {
    let summary = &outcome.data.data_summary;
    let metadata = &outcome.data.extraction_metadata;
    let report = &outcome.report;

    println!(
        "[OK] 진료과 {} 개, 의사 {} 명 (명단 {} 명)",
        summary.total_departments, summary.total_doctors, metadata.seeded_doctors
    );
    println!(
        "     배정: {} 명 (진료과당 평균 {:.2}), 의사 있는 진료과 {} 개",
        summary.total_doctors_in_departments,
        summary.average_doctors_per_department,
        summary.departments_with_doctors
    );
    println!(
        "     패스별 배정: 전문분야 {}, 키워드 {}, 페이지 언급 {}, 본문 {}",
        report.count_by(&AssignmentStrategy::SpecializationTable),
        report.count_by(&AssignmentStrategy::Keyword {
            keyword: String::new()
        }),
        report.count_by(&AssignmentStrategy::PageMention),
        report.count_by(&AssignmentStrategy::TextKeyword),
    );

    if !metadata.unassigned_doctors.is_empty() {
        println!("[!] 미배정 의사 {} 명:", metadata.unassigned_doctors.len());
        for doctor in &metadata.unassigned_doctors {
            println!(
                "    #{:<4} {} ({})",
                doctor.id.0,
                doctor.name,
                doctor.specialization.as_deref().unwrap_or("-")
            );
        }
    }

    if !metadata.unmapped_departments.is_empty() {
        println!(
            "[!] 매핑되지 않은 진료과 페이지 {} 개:",
            metadata.unmapped_departments.len()
        );
        for dept in &metadata.unmapped_departments {
            println!("    {} ({})", dept.raw_name, dept.url);
        }
    }
}

/// 검색 항목 명령어 (items)
async fn cmd_items(input: &Path, output: &Path) -> Result<()> {
    let data = load_formatted(input)
        .await
        .with_context(|| format!("엔티티 그래프 읽기 실패: {}", input.display()))?;

    let items = build_items(&data);
    let json = serde_json::to_string_pretty(&items).context("검색 항목 직렬화 실패")?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("출력 디렉토리 생성 실패")?;
        }
    }
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("검색 항목 저장 실패: {}", output.display()))?;

    println!("[OK] 검색 항목 {} 건 저장됨: {}", items.len(), output.display());
    Ok(())
}

/// 인덱스 명령어 (index)
async fn cmd_index(input: &Path, db: Option<PathBuf>) -> Result<()> {
    let data = load_formatted(input)
        .await
        .with_context(|| format!("엔티티 그래프 읽기 실패: {}", input.display()))?;

    let items = build_items(&data);
    if items.is_empty() {
        bail!("인덱싱할 항목이 없습니다");
    }

    println!("[*] 검색 항목 {} 건 인덱싱 중...", items.len());

    let store = open_store(db)?;
    let count = store.replace_all(&items).context("인덱스 저장 실패")?;

    println!("[OK] 인덱스 갱신됨: {} 건", count);
    println!("     DB: {}", store.db_path().display());
    Ok(())
}

/// 검색 명령어 (search)
async fn cmd_search(query: &str, limit: usize, db: Option<PathBuf>) -> Result<()> {
    if query.trim().is_empty() {
        bail!("검색어를 입력해야 합니다");
    }

    println!("[*] 검색 중: \"{}\"", query);

    let store = open_store(db)?;
    let hits = store.search(query, limit).context("검색 실패")?;

    if hits.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", hits.len());

    for (i, hit) in hits.iter().enumerate() {
        let method_str = match hit.method {
            SearchMethod::Fts => "FTS",
            SearchMethod::Like => "LIKE",
        };

        println!(
            "{}. [{}] [점수: {:.4}] {} ({})",
            i + 1,
            method_str,
            hit.score,
            hit.name,
            hit.item_id
        );
        println!("   종류: {} | 분류: {}", hit.item_type.as_str(), hit.category);
        println!("   스니펫: {}", truncate_text(&hit.snippet, 200));
        println!();
    }

    Ok(())
}

/// 목록 명령어 (list)
async fn cmd_list(item_type: Option<&str>, limit: usize, db: Option<PathBuf>) -> Result<()> {
    let filter = match item_type {
        Some(raw) => match ItemType::parse(raw) {
            Some(kind) => Some(kind),
            None => bail!(
                "알 수 없는 항목 종류: {} (hospital_info, department, doctor 중 하나)",
                raw
            ),
        },
        None => None,
    };

    let store = open_store(db)?;
    let items = store.list(limit, filter).context("항목 목록 조회 실패")?;

    if items.is_empty() {
        println!("[!] 저장된 항목이 없습니다.");
        return Ok(());
    }

    println!("[OK] 저장된 항목 ({} 건):\n", items.len());

    for stored in items {
        let item = &stored.item;
        println!(
            "  {:<10} [{}] {}",
            item.id,
            item.item_type.as_str(),
            truncate_text(&item.name, 40)
        );
        println!(
            "             분류: {} | {} chars | {}",
            item.category,
            item.content.chars().count(),
            stored.indexed_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

/// 항목 보기 명령어 (show)
async fn cmd_show(item_id: &str, db: Option<PathBuf>) -> Result<()> {
    let store = open_store(db)?;
    let stored = store
        .get(item_id)
        .context("항목 조회 실패")?
        .ok_or_else(|| anyhow::anyhow!("ID '{}'인 항목을 찾을 수 없습니다", item_id))?;

    let item = &stored.item;
    println!("[OK] {} [{}] {}", item.id, item.item_type.as_str(), item.name);
    println!("     분류: {}", item.category);
    println!("     인덱싱: {}", stored.indexed_at.format("%Y-%m-%d %H:%M"));
    println!();
    println!("{}", item.content);

    Ok(())
}

/// 인덱스 재생성 명령어 (reindex)
async fn cmd_reindex(db: Option<PathBuf>) -> Result<()> {
    let store = open_store(db)?;
    let count = store.rebuild_fts_index().context("FTS5 인덱스 재생성 실패")?;

    println!("[OK] FTS5 인덱스 재생성됨: {} 건", count);
    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(db: Option<PathBuf>) -> Result<()> {
    println!("hospital-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let data_dir = get_data_dir();
    println!("[*] 데이터 디렉토리: {}", data_dir.display());

    let config = FormatterConfig::default();
    println!(
        "[*] 내장 설정: 진료과 {} 개, 명단 {} 명 ({})",
        config.taxonomy.len(),
        config.seed_roster.doctors.len(),
        config.seed_roster.department
    );

    match open_store(db) {
        Ok(store) => match store.stats() {
            Ok(stats) => {
                println!("[OK] 인덱스 항목: {} 건", stats.item_count);
                println!(
                    "     병원 {} / 진료과 {} / 의사 {}",
                    stats.hospital_items, stats.department_items, stats.doctor_items
                );
                println!(
                    "     총 콘텐츠: {}",
                    format_bytes(stats.total_content_bytes)
                );
            }
            Err(e) => {
                println!("[!] 통계 조회 실패: {}", e);
            }
        },
        Err(e) => {
            println!("[!] ItemStore 열기 실패: {}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn open_store(db: Option<PathBuf>) -> Result<ItemStore> {
    match db {
        Some(path) => ItemStore::open(&path)
            .with_context(|| format!("ItemStore 열기 실패: {}", path.display())),
        None => ItemStore::open_default().context("ItemStore 열기 실패"),
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
