use super::*;

/// PDF 解析器（基础版）
///
/// 支持纯文本 PDF 的解析。PDF 没有可用的段落标记，段落分界按固定宽度合成
#[derive(Clone)]
pub struct PdfParser {
    /// 每个合成段落的单词数
    paragraph_width: usize,
}

impl PdfParser {
    /// 创建新的 PDF 解析器实例
    pub fn new() -> Self {
        Self::with_paragraph_width(DEFAULT_PDF_PARAGRAPH_WIDTH)
    }

    /// 使用指定的合成段落宽度创建解析器，0 表示默认宽度
    pub fn with_paragraph_width(paragraph_width: usize) -> Self {
        let paragraph_width = if paragraph_width == 0 {
            DEFAULT_PDF_PARAGRAPH_WIDTH
        } else {
            paragraph_width
        };
        Self { paragraph_width }
    }

    pub fn paragraph_width(&self) -> usize {
        self.paragraph_width
    }

    /// 提取每一页的文本项
    ///
    /// 逐页提取文本，页内每一行作为一个文本项
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ParseError::Pdf(e.to_string()))?;

        Ok(pages
            .iter()
            .map(|page| page.lines().map(str::to_string).collect())
            .collect())
    }

    /// 从页面列表构建解析结果
    pub fn content_from_pages(&self, pages: &[Vec<String>]) -> ParsedContent {
        let text = pdf_text_from_pages(pages);
        let word_count = split_words(&text).len();
        let paragraph_breaks = synthetic_paragraph_breaks(word_count, self.paragraph_width);

        ParsedContent::new(text, Vec::new(), paragraph_breaks)
    }
}

impl Parser for PdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedContent> {
        let pages = self.extract_pages(bytes)?;
        let content = self.content_from_pages(&pages);

        // 扫描版 PDF 没有文本层，返回空结果而不是报错
        if content.text.is_empty() {
            tracing::warn!(pages = pages.len(), "PDF 中没有可提取的文本，可能是扫描版");
        }

        Ok(content)
    }

    fn supported_extensions(&self) -> Vec<&str> {
        vec!["pdf"]
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 拼接页面文本并清理
///
/// 页内文本项以单个空格连接，每页之后追加一个空格
pub fn pdf_text_from_pages(pages: &[Vec<String>]) -> String {
    let mut full_text = String::new();
    for page in pages {
        full_text.push_str(&page.join(" "));
        full_text.push(' ');
    }
    clean_text(&full_text)
}

/// 生成固定宽度的合成段落分界：0, width, 2*width, ...
pub fn synthetic_paragraph_breaks(word_count: usize, width: usize) -> Vec<usize> {
    let width = if width == 0 { DEFAULT_PDF_PARAGRAPH_WIDTH } else { width };
    (0..word_count).step_by(width).collect()
}
