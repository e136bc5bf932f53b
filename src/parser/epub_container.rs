use super::*;
use encoding_rs::{Encoding, UTF_8};
use epub::doc::{EpubDoc, NavPoint};
use scraper::{ElementRef, Html, Selector};
use std::io::Cursor;

/// spine 中的一个章节文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineSection {
    /// 章节标识（idref）
    pub id: Option<String>,
    /// 章节内容在容器中的引用路径
    pub href: Option<String>,
}

/// 目录树节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TocEntry>) -> Self {
        self.children = children;
        self
    }
}

/// 章节级错误，只记录日志，不会中断整个解析
#[derive(Error, Debug)]
pub enum SectionError {
    #[error("章节缺少内容引用: {0}")]
    MissingReference(String),
    #[error("无法读取章节内容: {0}")]
    Unreadable(String),
    #[error("目录不可用")]
    NavigationUnavailable,
}

/// EPUB 容器的统一接口
///
/// 外部库的数据结构只在实现这个 trait 的地方出现
pub trait SectionSource {
    /// 按阅读顺序返回 spine 中的章节
    fn sections(&self) -> Vec<SpineSection>;

    /// 加载目录树
    fn navigation(&mut self) -> std::result::Result<Vec<TocEntry>, SectionError>;

    /// 加载一个章节的 HTML 内容
    fn load_section(&mut self, section: &SpineSection) -> std::result::Result<String, SectionError>;
}

/// 基于 `epub` crate 的容器读取器
pub struct EpubContainer {
    doc: EpubDoc<Cursor<Vec<u8>>>,
}

impl EpubContainer {
    /// 从内存中的字节打开 EPUB
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let doc = EpubDoc::from_reader(Cursor::new(bytes.to_vec()))
            .map_err(|e| ParseError::Epub(e.to_string()))?;
        Ok(Self { doc })
    }
}

/// 将 NavPoint 树转换为内部的目录结构
fn to_toc_entry(nav: &NavPoint) -> TocEntry {
    TocEntry {
        label: nav.label.clone(),
        href: nav.content.to_string_lossy().into_owned(),
        children: nav.children.iter().map(to_toc_entry).collect(),
    }
}

impl SectionSource for EpubContainer {
    fn sections(&self) -> Vec<SpineSection> {
        self.doc
            .spine
            .iter()
            .map(|item| SpineSection {
                id: Some(item.idref.clone()),
                href: self
                    .doc
                    .resources
                    .get(&item.idref)
                    .map(|resource| resource.path.to_string_lossy().into_owned()),
            })
            .collect()
    }

    fn navigation(&mut self) -> std::result::Result<Vec<TocEntry>, SectionError> {
        if !self.doc.toc.is_empty() {
            return Ok(self.doc.toc.iter().map(to_toc_entry).collect());
        }

        // EPUB3 可以只提供导航文档而没有 NCX
        let nav_path = self
            .doc
            .get_nav_id()
            .and_then(|id| self.doc.resources.get(&id))
            .map(|resource| resource.path.to_string_lossy().into_owned())
            .ok_or(SectionError::NavigationUnavailable)?;

        let bytes = self
            .doc
            .get_resource_by_path(&nav_path)
            .ok_or_else(|| SectionError::Unreadable(nav_path.clone()))?;

        let toc = parse_nav_document(&decode_markup(&bytes), &nav_path);
        if toc.is_empty() {
            return Err(SectionError::NavigationUnavailable);
        }
        Ok(toc)
    }

    fn load_section(&mut self, section: &SpineSection) -> std::result::Result<String, SectionError> {
        let href = section.href.as_deref().ok_or_else(|| {
            SectionError::MissingReference(section.id.clone().unwrap_or_default())
        })?;

        let bytes = self
            .doc
            .get_resource_by_path(href)
            .ok_or_else(|| SectionError::Unreadable(href.to_string()))?;

        Ok(decode_markup(&bytes))
    }
}

/// 解析 EPUB3 导航文档中的目录
///
/// 优先使用 `epub:type` 含有 `toc` 的 nav，没有时退回第一个 nav。
/// 链接相对于导航文档所在目录解析，与 NCX 目录的路径形式一致。
///
/// # 参数
/// - `markup`: 导航文档的 XHTML
/// - `nav_path`: 导航文档在容器中的路径
///
/// # 返回
/// 目录树，找不到列表时为空
pub fn parse_nav_document(markup: &str, nav_path: &str) -> Vec<TocEntry> {
    let document = Html::parse_document(markup);
    let (Ok(nav_selector), Ok(list_selector)) = (Selector::parse("nav"), Selector::parse("ol")) else {
        return Vec::new();
    };

    let toc_nav = document
        .select(&nav_selector)
        .find(|nav| {
            nav.value()
                .attr("epub:type")
                .is_some_and(|types| types.split_whitespace().any(|t| t == "toc"))
        })
        .or_else(|| document.select(&nav_selector).next());

    let base_dir = nav_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

    toc_nav
        .and_then(|nav| nav.select(&list_selector).next())
        .map(|list| nav_list_entries(list, base_dir))
        .unwrap_or_default()
}

fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

/// 将 `<ol>` 下的每个 `<li>` 转换为目录节点，嵌套的 `<ol>` 成为子节点
fn nav_list_entries(list: ElementRef<'_>, base_dir: &str) -> Vec<TocEntry> {
    child_elements(list)
        .filter(|item| item.value().name() == "li")
        .map(|item| {
            let heading = child_elements(item).find(|child| matches!(child.value().name(), "a" | "span"));

            let label = heading
                .map(|h| h.text().collect::<String>())
                .unwrap_or_default()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            let href = heading
                .and_then(|h| h.value().attr("href"))
                .filter(|href| !href.is_empty())
                .map(|href| resolve_href(base_dir, href))
                .unwrap_or_default();

            let children = child_elements(item)
                .find(|child| child.value().name() == "ol")
                .map(|nested| nav_list_entries(nested, base_dir))
                .unwrap_or_default();

            TocEntry { label, href, children }
        })
        .collect()
}

/// 把相对链接解析为容器内的完整路径，处理 `.` 和 `..`
fn resolve_href(base_dir: &str, href: &str) -> String {
    let mut segments: Vec<&str> = if href.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

static DECLARED_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:encoding|charset)\s*=\s*["']?([A-Za-z0-9_\-]+)"#)
        .expect("charset pattern is valid")
});

/// 检测章节文件编码
///
/// 依次检查 BOM、UTF-8 有效性、XML 声明或 meta 中的 charset
///
/// # 参数
/// - `bytes`: 章节字节数据
///
/// # 返回
/// 检测到的编码
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    // 1. 检查 BOM (Byte Order Mark)
    if let Some((encoding, _bom_length)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    // 2. 尝试 UTF-8 解码
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    // 3. 文件头部声明的编码
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    if let Some(encoding) = DECLARED_CHARSET
        .captures(&head)
        .and_then(|caps| Encoding::for_label(caps[1].as_bytes()))
    {
        return encoding;
    }

    // 4. 默认使用 UTF-8
    UTF_8
}

/// 将章节字节解码为字符串
pub fn decode_markup(bytes: &[u8]) -> String {
    let encoding = detect_encoding(bytes);
    let (content, encoding_used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = encoding_used.name(), "章节解码时出现错误，可能存在乱码");
    }
    content.into_owned()
}
