use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

// 子模块声明
pub mod block_extractor;
pub mod epub_container;
pub mod epub_parser;
pub mod pdf_parser;

#[cfg(test)]
mod integration_tests;

/// PDF 合成段落的默认宽度（单词数）
pub const DEFAULT_PDF_PARAGRAPH_WIDTH: usize = 100;

/// 解析错误
///
/// 只有这些错误会中断整个导入流程；单个章节或目录的失败在内部被记录并跳过
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF 解析失败: {0}")]
    Pdf(String),
    #[error("EPUB 解析错误: {0}")]
    Epub(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// 章节元数据
///
/// 由 EPUB 的 spine 与目录匹配得到，单词索引指向全局单词序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// 文档内唯一的标识
    pub id: String,
    /// 目录中的章节标题
    pub title: String,
    /// 嵌套深度（0 为顶层）
    pub level: u32,
    /// 起始单词索引
    pub word_start_index: usize,
    /// 结束单词索引（包含）
    pub word_end_index: usize,
}

/// 解析结果
///
/// 导入完成后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContent {
    /// 清理后的全文
    pub text: String,
    /// 章节列表（PDF 始终为空）
    pub chapters: Vec<Chapter>,
    /// 是否有可用的目录
    pub has_to_c: bool,
    /// 段落起始的单词索引
    pub paragraph_breaks: Vec<usize>,
}

impl ParsedContent {
    /// 创建解析结果，`has_to_c` 由章节是否为空决定
    pub fn new(text: String, chapters: Vec<Chapter>, paragraph_breaks: Vec<usize>) -> Self {
        let has_to_c = !chapters.is_empty();
        Self {
            text,
            chapters,
            has_to_c,
            paragraph_breaks,
        }
    }

    /// 全文的单词数
    pub fn word_count(&self) -> usize {
        split_words(&self.text).len()
    }
}

/// 支持的文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Epub,
}

impl DocumentKind {
    /// 根据文件名后缀（不区分大小写）识别文档类型
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// 根据扩展名（不含点号）识别文档类型
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
        }
    }
}

/// 获取支持的文件扩展名，逗号分隔
pub fn supported_extensions() -> &'static str {
    ".pdf,.epub"
}

/// 检查是否支持指定的文件扩展名
pub fn supports(extension: &str) -> bool {
    DocumentKind::from_extension(extension.trim_start_matches('.')).is_some()
}

/// 解析配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserOptions {
    /// PDF 合成段落的宽度，0 表示使用默认值
    pub pdf_paragraph_width: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            pdf_paragraph_width: DEFAULT_PDF_PARAGRAPH_WIDTH,
        }
    }
}

/// 文件内容来源
#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// 待导入的文件
///
/// 文件名只用于识别类型，内容可以来自磁盘或内存
#[derive(Debug, Clone)]
pub struct InputFile {
    name: String,
    source: FileSource,
}

impl InputFile {
    /// 从磁盘路径创建
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    /// 从内存中的字节创建
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Bytes(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 读取完整的文件内容
    pub async fn read(&self) -> std::io::Result<Cow<'_, [u8]>> {
        match &self.source {
            FileSource::Path(path) => Ok(Cow::Owned(tokio::fs::read(path).await?)),
            FileSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

/// Parser trait
///
/// 所有格式解析器必须实现此 trait
pub trait Parser: Send + Sync {
    /// 解析文件内容
    ///
    /// # 参数
    /// - `bytes`: 完整的文件字节
    ///
    /// # 返回
    /// 解析结果，包含全文、章节和段落分界
    fn parse(&self, bytes: &[u8]) -> Result<ParsedContent>;

    /// 获取支持的文件扩展名列表
    fn supported_extensions(&self) -> Vec<&str>;
}

/// Parser 路由器
///
/// 根据文件扩展名路由到对应的解析器
pub struct ParserRouter {
    /// 扩展名到解析器的映射
    parsers: HashMap<String, Box<dyn Parser>>,
}

impl ParserRouter {
    /// 创建新的路由器实例
    ///
    /// 注册所有可用的解析器
    pub fn new() -> Self {
        Self::with_options(&ParserOptions::default())
    }

    /// 使用指定配置创建路由器
    pub fn with_options(options: &ParserOptions) -> Self {
        let mut parsers: HashMap<String, Box<dyn Parser>> = HashMap::new();

        // 注册 EPUB 解析器
        let epub = epub_parser::EpubParser::new();
        for ext in epub.supported_extensions() {
            parsers.insert(ext.to_string(), Box::new(epub.clone()));
        }

        // 注册 PDF 解析器
        let pdf = pdf_parser::PdfParser::with_paragraph_width(options.pdf_paragraph_width);
        for ext in pdf.supported_extensions() {
            parsers.insert(ext.to_string(), Box::new(pdf.clone()));
        }

        Self { parsers }
    }

    /// 根据文件名路由到对应的解析器
    ///
    /// # 参数
    /// - `file_name`: 文件名，只看后缀且不区分大小写
    ///
    /// # 返回
    /// 对应的解析器引用，如果不支持该格式则返回 `UnsupportedFormat`
    pub fn route(&self, file_name: &str) -> Result<&dyn Parser> {
        let lowered = file_name.to_lowercase();

        DocumentKind::from_file_name(&lowered)
            .and_then(|kind| self.parsers.get(kind.extension()))
            .map(|p| p.as_ref())
            .ok_or(ParseError::UnsupportedFormat(lowered))
    }
}

impl Default for ParserRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// 识别文件类型并解析
pub async fn parse_file(file: &InputFile) -> Result<ParsedContent> {
    parse_file_with(file, &ParserOptions::default()).await
}

/// 使用指定配置识别文件类型并解析
///
/// 不支持的扩展名在读取文件之前就会失败
pub async fn parse_file_with(file: &InputFile, options: &ParserOptions) -> Result<ParsedContent> {
    let router = ParserRouter::with_options(options);
    let parser = router.route(file.name())?;

    let bytes = file.read().await?;
    let content = parser.parse(&bytes)?;

    tracing::info!(
        file = file.name(),
        words = content.word_count(),
        chapters = content.chapters.len(),
        paragraphs = content.paragraph_breaks.len(),
        "文档解析完成"
    );

    Ok(content)
}

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static REPEATED_TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2,}|!{2,}|\?{2,}").expect("terminator pattern is valid"));

/// 清理并规范化提取的文本
///
/// 连续空白合并为一个空格，连续重复的 `.`、`!`、`?` 合并为一个，最后去掉首尾空白
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    let deduped = REPEATED_TERMINATOR.replace_all(&collapsed, |caps: &Captures| caps[0][..1].to_string());
    deduped.trim().to_string()
}

/// 按空白切分单词
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
