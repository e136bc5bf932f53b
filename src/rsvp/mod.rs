// RSVP 显示工具
// 单词切分、ORP 计算、单词延迟、剩余时间以及虚拟列表的段落分组，全部为无状态的纯函数

pub mod types;
pub mod timing;
pub mod layout;
pub mod settings;

// 重新导出主要类型
pub use types::*;
pub use timing::{
    actual_orp_index, format_time_remaining, letter_count, orp_index, should_pause_at_word, tokenize,
    word_delay, DelayOptions,
};
pub use layout::{
    extract_word_frame, find_paragraph_for_word_index, group_words_into_paragraphs,
    group_words_into_real_paragraphs, split_word_for_display,
};
pub use settings::ReaderSettings;
