use serde::{Deserialize, Serialize};

use super::layout::{extract_word_frame, group_words_into_paragraphs, DEFAULT_WORDS_PER_PARAGRAPH};
use super::timing::{self, DelayOptions, DEFAULT_PUNCTUATION_MULTIPLIER};
use super::types::{WordFrame, WordParagraph};

/// 阅读设置
///
/// 可以从 JSON 加载，缺少的字段使用默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderSettings {
    /// 阅读速度（每分钟单词数）
    pub words_per_minute: f64,
    /// 是否在标点处停顿
    pub pause_on_punctuation: bool,
    /// 句末标点的延迟倍数
    pub punctuation_multiplier: f64,
    /// 长单词每多一个字符增加的百分点
    pub word_length_multiplier: f64,
    /// 每 N 个单词暂停一次，0 表示关闭
    pub pause_after_words: usize,
    /// 同时显示的单词数
    pub frame_size: usize,
    /// 合成段落的单词数
    pub words_per_paragraph: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            words_per_minute: 300.0,
            pause_on_punctuation: true,
            punctuation_multiplier: DEFAULT_PUNCTUATION_MULTIPLIER,
            word_length_multiplier: 0.0,
            pause_after_words: 0,
            frame_size: 1,
            words_per_paragraph: DEFAULT_WORDS_PER_PARAGRAPH,
        }
    }
}

impl ReaderSettings {
    /// 从 JSON 字符串加载设置
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn delay_options(&self) -> DelayOptions {
        DelayOptions {
            pause_on_punctuation: self.pause_on_punctuation,
            punctuation_multiplier: self.punctuation_multiplier,
            word_length_multiplier: self.word_length_multiplier,
        }
    }

    /// 按当前设置计算单词延迟（毫秒）
    pub fn word_delay(&self, word: &str) -> f64 {
        timing::word_delay(word, self.words_per_minute, &self.delay_options())
    }

    pub fn time_remaining(&self, remaining_words: usize) -> String {
        timing::format_time_remaining(remaining_words, self.words_per_minute)
    }

    pub fn should_pause_at_word(&self, word_index: usize) -> bool {
        timing::should_pause_at_word(word_index, self.pause_after_words)
    }

    pub fn frame<'a>(&self, words: &'a [String], center: usize) -> WordFrame<'a> {
        extract_word_frame(words, center, self.frame_size)
    }

    pub fn paragraphs<'a>(&self, words: &'a [String]) -> Vec<WordParagraph<'a>> {
        group_words_into_paragraphs(words, self.words_per_paragraph)
    }
}
