pub(crate) fn default_minutes_per_day() -> u32 {
    8
}

pub(crate) fn default_words_per_minute() -> u32 {
    350
}

pub(crate) fn default_snap_window_chars() -> usize {
    100
}

pub(crate) fn default_strip_reference_markers() -> bool {
    true
}

pub(crate) fn default_caption_labels() -> Vec<String> {
    vec!["Рис.".to_string(), "Таблица".to_string()]
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
