use scraper::{ElementRef, Html, Selector};

/// 块级元素选择器
const BLOCK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, div, li, blockquote";

/// 章节的块级文本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionBlocks {
    /// 所有块的文本，以单个空格连接
    pub text: String,
    /// 每个块起始处的局部单词计数
    pub paragraph_starts: Vec<usize>,
}

/// 判断元素内部是否还嵌套了段落或 div
fn has_nested_block(element: &ElementRef) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|child| matches!(child.value().name(), "p" | "div"))
}

/// 从章节 HTML 中提取块级文本，同时记录段落边界
///
/// 含有嵌套段落/div 的块会被跳过，避免同一段文字被计算两次。
/// 如果找不到任何有文本的块，整个 body 的文本作为一个段落。
///
/// # 参数
/// - `html`: 章节的 HTML/XHTML 字符串
///
/// # 返回
/// 拼接后的文本和段落起始位置
pub fn extract_blocks(html: &str) -> SectionBlocks {
    let document = Html::parse_document(html);

    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let fallback = || SectionBlocks {
        text: body.text().collect::<String>(),
        paragraph_starts: vec![0],
    };

    let block_selector = match Selector::parse(BLOCK_SELECTOR) {
        Ok(selector) => selector,
        Err(_) => return fallback(),
    };

    let mut paragraph_starts = Vec::new();
    let mut text_parts: Vec<String> = Vec::new();
    let mut current_word_count = 0;

    for element in body.select(&block_selector) {
        if has_nested_block(&element) {
            continue;
        }

        let text = element.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        paragraph_starts.push(current_word_count);
        current_word_count += text.split_whitespace().count();
        text_parts.push(text.to_string());
    }

    if text_parts.is_empty() {
        return fallback();
    }

    SectionBlocks {
        text: text_parts.join(" "),
        paragraph_starts,
    }
}
