use super::timing::actual_orp_index;
use super::types::{WordFrame, WordParagraph, WordParts};
use crate::parser::Chapter;
use std::borrow::Cow;
use std::collections::HashSet;

/// 合成段落的默认单词数
pub const DEFAULT_WORDS_PER_PARAGRAPH: usize = 50;

/// 将单词拆成 ORP 字符之前、ORP 字符、之后三部分
pub fn split_word_for_display(word: &str) -> WordParts<'_> {
    if word.is_empty() {
        return WordParts::default();
    }

    let orp = actual_orp_index(word);
    match word.char_indices().nth(orp) {
        Some((start, ch)) => {
            let end = start + ch.len_utf8();
            WordParts {
                before: &word[..start],
                orp: &word[start..end],
                after: &word[end..],
            }
        }
        None => WordParts {
            before: word,
            orp: "",
            after: "",
        },
    }
}

/// 提取以当前单词为中心的窗口
///
/// 靠近两端时窗口会被截断，不做填充
///
/// # 参数
/// - `words`: 全部单词
/// - `center`: 中心单词索引
/// - `frame_size`: 期望的窗口宽度，建议为奇数
pub fn extract_word_frame(words: &[String], center: usize, frame_size: usize) -> WordFrame<'_> {
    if frame_size <= 1 || center >= words.len() {
        let subset = match words.get(center) {
            Some(word) => Cow::Borrowed(std::slice::from_ref(word)),
            None => Cow::Owned(vec![String::new()]),
        };
        return WordFrame {
            subset,
            center_offset: 0,
        };
    }

    let radius = frame_size / 2;
    let left = center.saturating_sub(radius);
    let right = (center + radius + 1).min(words.len());

    WordFrame {
        subset: Cow::Borrowed(&words[left..right]),
        center_offset: center - left,
    }
}

/// 按固定单词数将单词分组为段落，用于虚拟列表显示
///
/// `words_per_paragraph` 为 0 时使用默认值
pub fn group_words_into_paragraphs(words: &[String], words_per_paragraph: usize) -> Vec<WordParagraph<'_>> {
    let size = if words_per_paragraph == 0 {
        DEFAULT_WORDS_PER_PARAGRAPH
    } else {
        words_per_paragraph
    };

    words
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| {
            let start_index = i * size;
            WordParagraph {
                words: chunk,
                start_index,
                end_index: start_index + chunk.len() - 1,
                chapter_title: None,
                chapter_level: 0,
            }
        })
        .collect()
}

/// 按真实的段落分界分组，并标注章节标题
///
/// 章节起点不一定正好落在段落分界上，所以只要章节起点落在段落范围内就归属该段落；
/// 每个章节最多归属一个段落。没有分界时退回固定大小分组。
///
/// # 参数
/// - `words`: 全部单词
/// - `paragraph_breaks`: 段落起始的单词索引
/// - `chapters`: 章节元数据
pub fn group_words_into_real_paragraphs<'a>(
    words: &'a [String],
    paragraph_breaks: &[usize],
    chapters: &[Chapter],
) -> Vec<WordParagraph<'a>> {
    if words.is_empty() {
        return Vec::new();
    }
    if paragraph_breaks.is_empty() {
        return group_words_into_paragraphs(words, DEFAULT_WORDS_PER_PARAGRAPH);
    }

    let mut sorted_chapters: Vec<&Chapter> = chapters.iter().collect();
    sorted_chapters.sort_by_key(|chapter| chapter.word_start_index);

    // 已归属的章节
    let mut assigned: HashSet<&str> = HashSet::new();

    let mut breaks = paragraph_breaks.to_vec();
    breaks.sort_unstable();
    breaks.dedup();
    if breaks[0] > 0 {
        breaks.insert(0, 0);
    }

    let last_word = words.len() - 1;
    let mut paragraphs = Vec::with_capacity(breaks.len());

    for (i, &start_index) in breaks.iter().enumerate() {
        if start_index > last_word {
            continue;
        }
        let end_index = match breaks.get(i + 1) {
            Some(&next) => (next - 1).min(last_word),
            None => last_word,
        };

        let matched = sorted_chapters.iter().find(|chapter| {
            !assigned.contains(chapter.id.as_str())
                && chapter.word_start_index >= start_index
                && chapter.word_start_index <= end_index
        });
        if let Some(chapter) = matched {
            assigned.insert(chapter.id.as_str());
        }

        paragraphs.push(WordParagraph {
            words: &words[start_index..=end_index],
            start_index,
            end_index,
            chapter_title: matched
                .map(|chapter| chapter.title.clone())
                .filter(|title| !title.is_empty()),
            chapter_level: matched.map(|chapter| chapter.level).unwrap_or(0),
        });
    }

    paragraphs
}

/// 查找包含指定单词的段落索引
pub fn find_paragraph_for_word_index(paragraphs: &[WordParagraph], word_index: usize) -> Option<usize> {
    paragraphs.iter().position(|paragraph| paragraph.contains(word_index))
}
