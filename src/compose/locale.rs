//! Language of the post, taken from the user's locale.

use crate::config::Config;

/// Fallback when no locale is set
pub const DEFAULT_LANGUAGE: &str = "en";

/// Language subtag of a POSIX locale (`pt_BR.UTF-8` -> `pt`)
pub fn language_from_locale(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next()?;
    let lang = base.split(['_', '-']).next()?.trim();

    if lang.is_empty() || lang.eq_ignore_ascii_case("c") || lang.eq_ignore_ascii_case("posix") {
        return None;
    }
    if !lang.chars().all(|c| c.is_ascii_alphabetic()) || !(2..=3).contains(&lang.len()) {
        return None;
    }
    Some(lang.to_ascii_lowercase())
}

/// First usable language among `LC_ALL`, `LC_MESSAGES` and `LANG`
pub fn detect_language() -> String {
    detect_language_with(|key| std::env::var(key).ok())
}

fn detect_language_with(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find_map(|value| language_from_locale(&value))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// `langs` for new posts: the configured language, or the detected one
pub fn post_languages(config: &Config) -> Vec<String> {
    let lang = config
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(detect_language, str::to_string);
    vec![lang]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_locale() {
        assert_eq!(language_from_locale("en_US.UTF-8").as_deref(), Some("en"));
        assert_eq!(language_from_locale("pt_BR").as_deref(), Some("pt"));
        assert_eq!(language_from_locale("de_DE@euro").as_deref(), Some("de"));
        assert_eq!(language_from_locale("C.UTF-8"), None);
        assert_eq!(language_from_locale("POSIX"), None);
        assert_eq!(language_from_locale(""), None);
    }

    #[test]
    fn test_lookup_order() {
        let lang = detect_language_with(|key| match key {
            "LC_ALL" => Some("C".to_string()),
            "LC_MESSAGES" => Some("fr_FR.UTF-8".to_string()),
            "LANG" => Some("ja_JP.UTF-8".to_string()),
            _ => None,
        });
        assert_eq!(lang, "fr");
    }

    #[test]
    fn test_default_language() {
        assert_eq!(detect_language_with(|_| None), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_config_language_wins() {
        let config = Config {
            language: Some("es".to_string()),
            ..Config::default()
        };
        assert_eq!(post_languages(&config), vec!["es".to_string()]);
    }
}
