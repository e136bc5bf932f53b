use serde::Serialize;
use std::borrow::Cow;

/// 单词拆分结果，用于高亮 ORP 字符
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WordParts<'a> {
    pub before: &'a str,
    pub orp: &'a str,
    pub after: &'a str,
}

/// 以当前单词为中心的显示窗口
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFrame<'a> {
    /// 窗口内的连续单词
    pub subset: Cow<'a, [String]>,
    /// 中心单词在窗口内的位置
    pub center_offset: usize,
}

/// 虚拟列表中的一个段落
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordParagraph<'a> {
    pub words: &'a [String],
    /// 起始单词索引
    pub start_index: usize,
    /// 结束单词索引（包含）
    pub end_index: usize,
    /// 段落起始处的章节标题
    pub chapter_title: Option<String>,
    /// 章节嵌套深度（0 为顶层）
    pub chapter_level: u32,
}

impl WordParagraph<'_> {
    /// 判断单词索引是否落在段落内
    pub fn contains(&self, word_index: usize) -> bool {
        word_index >= self.start_index && word_index <= self.end_index
    }
}
