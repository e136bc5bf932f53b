use super::*;
use super::block_extractor::extract_blocks;
use super::epub_container::{EpubContainer, SectionSource, SpineSection, TocEntry};

/// EPUB 解析器
///
/// 按 spine 顺序逐章提取文本，用目录匹配章节标题，用块级元素确定段落边界
#[derive(Clone, Default)]
pub struct EpubParser;

impl EpubParser {
    /// 创建新的 EPUB 解析器实例
    pub fn new() -> Self {
        Self
    }
}

impl Parser for EpubParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedContent> {
        let mut container = EpubContainer::open(bytes)?;
        Ok(ingest(&mut container))
    }

    fn supported_extensions(&self) -> Vec<&str> {
        vec!["epub"]
    }
}

/// 目录匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocMatch<'a> {
    pub label: &'a str,
    pub level: u32,
}

/// 去掉引用中的锚点部分
fn strip_anchor(href: &str) -> &str {
    href.split('#').next().unwrap_or(href)
}

/// 判断目录条目的引用是否指向该章节
///
/// 先比较去掉锚点后的完整路径，再允许一方是另一方的后缀（相对路径与绝对路径）
fn href_matches(entry_href: &str, section_href: &str) -> bool {
    let entry = strip_anchor(entry_href);
    let section = strip_anchor(section_href);

    if entry.is_empty() || section.is_empty() {
        return false;
    }

    entry == section || entry.ends_with(section) || section.ends_with(entry)
}

/// 在目录树中查找与章节引用匹配的条目
///
/// 先序深度优先，第一个匹配的条目胜出；每深入一层 level 加一
///
/// # 参数
/// - `toc`: 当前层级的目录条目
/// - `href`: 章节引用
/// - `level`: 当前层级
pub fn find_toc_entry<'a>(toc: &'a [TocEntry], href: &str, level: u32) -> Option<TocMatch<'a>> {
    for entry in toc {
        if href_matches(&entry.href, href) {
            return Some(TocMatch {
                label: &entry.label,
                level,
            });
        }
        if let Some(nested) = find_toc_entry(&entry.children, href, level + 1) {
            return Some(nested);
        }
    }
    None
}

/// 逐章解析时传递的累积状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestState {
    /// 每个章节清理后的文本
    pub section_texts: Vec<String>,
    pub chapters: Vec<Chapter>,
    pub paragraph_breaks: Vec<usize>,
    /// 下一个章节的起始全局单词索引
    pub word_index: usize,
}

impl IngestState {
    /// 初始状态，第一个单词总是段落开头
    pub fn new() -> Self {
        Self {
            section_texts: Vec::new(),
            chapters: Vec::new(),
            paragraph_breaks: vec![0],
            word_index: 0,
        }
    }

    /// 合并一个已加载的章节
    ///
    /// # 参数
    /// - `section`: spine 中的章节
    /// - `markup`: 章节的 HTML 内容
    /// - `toc`: 整本书的目录
    ///
    /// # 返回
    /// 合并后的新状态
    pub fn absorb(mut self, section: &SpineSection, markup: &str, toc: &[TocEntry]) -> Self {
        let blocks = extract_blocks(markup);
        let cleaned = clean_text(&blocks.text);
        let word_count = split_words(&cleaned).len();
        let word_start_index = self.word_index;

        // 局部位置 0 已被前面的分界覆盖
        self.paragraph_breaks.extend(
            blocks
                .paragraph_starts
                .iter()
                .filter(|&&start| start > 0)
                .map(|start| word_start_index + start),
        );

        // 没有单词的章节不产生章节记录
        if word_count > 0 {
            if let Some(href) = section.href.as_deref() {
                if let Some(entry) = find_toc_entry(toc, href, 0) {
                    let title = match entry.label.trim() {
                        "" => format!("Chapter {}", self.chapters.len() + 1),
                        label => label.to_string(),
                    };
                    self.chapters.push(Chapter {
                        id: section.id.clone().unwrap_or_else(|| href.to_string()),
                        title,
                        level: entry.level,
                        word_start_index,
                        word_end_index: word_start_index + word_count - 1,
                    });
                }
            }
        }

        tracing::debug!(
            section = section.id.as_deref().unwrap_or_default(),
            words = word_count,
            start = word_start_index,
            "章节已导入"
        );

        self.word_index += word_count;
        if !cleaned.is_empty() {
            self.section_texts.push(cleaned);
        }
        self
    }

    /// 生成最终的解析结果
    pub fn finish(self) -> ParsedContent {
        let text = self.section_texts.join(" ").trim().to_string();
        ParsedContent::new(text, self.chapters, self.paragraph_breaks)
    }
}

impl Default for IngestState {
    fn default() -> Self {
        Self::new()
    }
}

/// 按 spine 顺序解析整本书
///
/// 单个章节加载失败只记录警告并跳过；目录加载失败时不生成章节
pub fn ingest<S: SectionSource>(source: &mut S) -> ParsedContent {
    let toc = match source.navigation() {
        Ok(toc) => toc,
        Err(e) => {
            tracing::warn!("无法加载目录: {}", e);
            Vec::new()
        }
    };

    let sections = source.sections();
    let state = sections.iter().fold(IngestState::new(), |state, section| {
        match source.load_section(section) {
            Ok(markup) => state.absorb(section, &markup, &toc),
            Err(e) => {
                tracing::warn!("跳过无法加载的章节: {}", e);
                state
            }
        }
    });

    state.finish()
}
