use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// UI language. Only affects display text; stored data is locale-free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "pt-BR", alias = "pt-br", alias = "pt_BR")]
    PtBr,
}

impl Locale {
    pub fn title(self) -> &'static str {
        match self {
            Locale::En => "Today",
            Locale::PtBr => "Hoje",
        }
    }

    pub fn invalid_data(self) -> &'static str {
        match self {
            Locale::En => "Invalid data",
            Locale::PtBr => "Dados inválidos!",
        }
    }

    pub fn missing_description(self) -> &'static str {
        match self {
            Locale::En => "Description not provided",
            Locale::PtBr => "Descrição não informada.",
        }
    }

    pub fn invalid_date(self) -> &'static str {
        match self {
            Locale::En => "Invalid date",
            Locale::PtBr => "Data inválida.",
        }
    }

    pub fn empty_list(self) -> &'static str {
        match self {
            Locale::En => "Nothing planned.",
            Locale::PtBr => "Nenhuma tarefa.",
        }
    }

    /// Header date, e.g. "Sat, May 4" or "sáb, 4 de maio".
    pub fn today_label<Tz>(self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            Locale::En => now.format("%a, %B %-d").to_string(),
            Locale::PtBr => now
                .format_localized("%a, %-d de %B", chrono::Locale::pt_BR)
                .to_string(),
        }
    }

    pub fn short_date<Tz>(self, at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            Locale::En => at.format("%Y-%m-%d").to_string(),
            Locale::PtBr => at.format("%d/%m/%Y").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    fn saturday() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-04T10:00:00-03:00").unwrap()
    }

    #[test]
    fn english_header_date() {
        assert_eq!(Locale::En.today_label(&saturday()), "Sat, May 4");
    }

    #[test]
    fn portuguese_header_date() {
        let label = Locale::PtBr.today_label(&saturday());
        assert!(label.ends_with("4 de maio"), "got {label}");
    }

    #[test]
    fn short_dates_follow_locale() {
        let at = saturday().with_timezone(&Utc);
        assert_eq!(Locale::En.short_date(&at), "2024-05-04");
        assert_eq!(Locale::PtBr.short_date(&at), "04/05/2024");
    }

    #[test]
    fn parses_locale_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            locale: Locale,
        }
        let parsed: Wrapper = toml::from_str(r#"locale = "pt-BR""#).unwrap();
        assert_eq!(parsed.locale, Locale::PtBr);
        let parsed: Wrapper = toml::from_str(r#"locale = "en""#).unwrap();
        assert_eq!(parsed.locale, Locale::En);
    }
}
