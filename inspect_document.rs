/// 检查文档解析结果
///
/// 用法: inspect_document <文件> [settings.json]

use std::process::ExitCode;

use rsvp_reader_lib::parser::{parse_file, InputFile};
use rsvp_reader_lib::rsvp::{group_words_into_real_paragraphs, tokenize, ReaderSettings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("用法: inspect_document <文件> [settings.json]");
        return ExitCode::FAILURE;
    };

    let settings = match args.next() {
        Some(settings_path) => {
            let loaded = std::fs::read_to_string(&settings_path)
                .map_err(|e| e.to_string())
                .and_then(|json| ReaderSettings::from_json(&json).map_err(|e| e.to_string()));
            match loaded {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("✗ 读取设置失败 {}: {}", settings_path, e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => ReaderSettings::default(),
    };

    println!("正在解析文件: {}\n", path);

    let content = match parse_file(&InputFile::from_path(&path)).await {
        Ok(content) => content,
        Err(e) => {
            eprintln!("✗ 解析失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let words = tokenize(&content.text);
    let paragraphs = group_words_into_real_paragraphs(&words, &content.paragraph_breaks, &content.chapters);

    println!("✓ 解析成功\n");
    println!("单词数: {}", words.len());
    println!("段落数: {}", paragraphs.len());
    println!("目录可用: {}", content.has_to_c);
    println!(
        "预计阅读时间 ({} WPM): {}",
        settings.words_per_minute,
        settings.time_remaining(words.len())
    );

    if !content.chapters.is_empty() {
        println!("\n=== 章节 ===");
        for chapter in &content.chapters {
            let indent = "  ".repeat(chapter.level as usize);
            println!(
                "{}{} [{}..={}]",
                indent, chapter.title, chapter.word_start_index, chapter.word_end_index
            );
        }
    }

    let preview: Vec<&str> = words.iter().take(20).map(String::as_str).collect();
    if !preview.is_empty() {
        println!("\n预览: {}...", preview.join(" "));
    }

    ExitCode::SUCCESS
}
