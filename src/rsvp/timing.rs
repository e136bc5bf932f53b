use regex::Regex;
use std::sync::LazyLock;

/// 无效阅读速度时使用的固定延迟（毫秒）
pub const FALLBACK_DELAY_MS: f64 = 200.0;
/// 逗号结尾的延迟倍数
pub const COMMA_MULTIPLIER: f64 = 1.5;
/// 长单词阈值（字符数）
pub const LONG_WORD_THRESHOLD: usize = 12;
/// 句末标点默认的延迟倍数
pub const DEFAULT_PUNCTUATION_MULTIPLIER: f64 = 2.0;

static LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}").expect("letter class is valid"));

/// 单词延迟参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayOptions {
    /// 是否在标点处停顿
    pub pause_on_punctuation: bool,
    /// 句末标点（. ! ? ; :）的延迟倍数
    pub punctuation_multiplier: f64,
    /// 长单词每多一个字符增加的百分点，0 表示关闭
    pub word_length_multiplier: f64,
}

impl Default for DelayOptions {
    fn default() -> Self {
        Self {
            pause_on_punctuation: true,
            punctuation_multiplier: DEFAULT_PUNCTUATION_MULTIPLIER,
            word_length_multiplier: 0.0,
        }
    }
}

/// 将文本按空白切分为单词
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// 统计单词中的字母数（Unicode 字母类别）
pub fn letter_count(word: &str) -> usize {
    LETTER.find_iter(word).count()
}

/// 计算单词的最佳识别点（ORP），返回第几个字母应被高亮
///
/// 1-3 个字母 → 0，4-5 → 1，6-9 → 2，10-12 → 3，更长的单词按 log2 缓慢增长
pub fn orp_index(word: &str) -> usize {
    match letter_count(word) {
        0..=3 => 0,
        4..=5 => 1,
        6..=9 => 2,
        10..=12 => 3,
        n => (n - 1).ilog2() as usize + 1,
    }
}

/// 计算 ORP 在单词中的实际字符位置，跳过开头的标点等非字母字符
///
/// # 参数
/// - `word`: 单词
///
/// # 返回
/// 第 N 个字母的字符索引（N 为 `orp_index`）；字母不足时不超过最后一个字符
pub fn actual_orp_index(word: &str) -> usize {
    if word.is_empty() {
        return 0;
    }

    let target = orp_index(word);
    match LETTER.find_iter(word).nth(target) {
        Some(letter) => word[..letter.start()].chars().count(),
        None => target.min(word.chars().count() - 1),
    }
}

/// 计算单词的显示延迟（毫秒）
///
/// 先按长单词放大，再按结尾标点放大，两者相乘
///
/// # 参数
/// - `word`: 当前单词
/// - `words_per_minute`: 阅读速度
/// - `options`: 停顿参数
pub fn word_delay(word: &str, words_per_minute: f64, options: &DelayOptions) -> f64 {
    if !words_per_minute.is_finite() || words_per_minute <= 0.0 {
        return FALLBACK_DELAY_MS;
    }

    let mut delay = 60_000.0 / words_per_minute;

    let length = word.chars().count();
    if options.word_length_multiplier > 0.0 && length >= LONG_WORD_THRESHOLD {
        delay *= 1.0 + (options.word_length_multiplier / 100.0) * (length - LONG_WORD_THRESHOLD) as f64;
    }

    if options.pause_on_punctuation {
        match word.chars().last() {
            Some('.' | '!' | '?' | ';' | ':') => return delay * options.punctuation_multiplier,
            Some(',') => return delay * COMMA_MULTIPLIER,
            _ => {}
        }
    }

    delay
}

/// 格式化剩余阅读时间为 `分:秒`
pub fn format_time_remaining(remaining_words: usize, words_per_minute: f64) -> String {
    if remaining_words == 0 || !words_per_minute.is_finite() || words_per_minute <= 0.0 {
        return "0:00".to_string();
    }

    let seconds = (remaining_words as f64 / words_per_minute * 60.0).ceil() as u64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// 是否在该单词处按"每 N 个单词暂停"设置停顿
///
/// `pause_after_words` 为 0 时关闭；第 0 个单词从不停顿
pub fn should_pause_at_word(word_index: usize, pause_after_words: usize) -> bool {
    pause_after_words > 0 && word_index > 0 && word_index % pause_after_words == 0
}
