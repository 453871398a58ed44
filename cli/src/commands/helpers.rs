use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD, today or yesterday")),
        },
    }
}

/// First line of stdin, without the trailing newline.
pub(crate) fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    read_first_line(stdin.lock())
}

fn read_first_line(input: impl BufRead) -> Result<String> {
    let line = input.lines().next().context("No password on stdin")??;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password cannot be empty");
    }
    Ok(password)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Rounded table with the given column range right-aligned.
pub(crate) fn print_table<R: Tabled>(rows: &[R], numeric: std::ops::Range<usize>) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(numeric)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

/// Short form of a uuid for table display.
pub(crate) fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Match `given` against full ids, accepting any unambiguous prefix.
pub(crate) fn resolve_id<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    given: &str,
) -> Result<String> {
    let mut matches = Vec::new();
    for id in ids {
        if id == given {
            return Ok(id.to_string());
        }
        if id.starts_with(given) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [] => bail!("No record with id '{given}'"),
        [one] => Ok((*one).to_string()),
        _ => bail!("Id '{given}' is ambiguous ({} matches)", matches.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
        assert!(parse_date(Some("2024-02-30".to_string())).is_err());
    }

    #[test]
    fn test_read_first_line() {
        let pw = read_first_line("hunter2\nsecond line\n".as_bytes()).unwrap();
        assert_eq!(pw, "hunter2");
        let pw = read_first_line("with space \r\n".as_bytes()).unwrap();
        assert_eq!(pw, "with space ");
        assert!(read_first_line("".as_bytes()).is_err());
        assert!(read_first_line("\n".as_bytes()).is_err());
    }

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(80.26), 1), "80.3");
        assert_eq!(fmt_opt(None, 1), "-");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope \"x\""), r#"{"error":"nope \"x\""}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Überkopfdrücken", 10), "Überkop...");
        assert_eq!(truncate("腕立て伏せチャレンジ", 8), "腕立て伏せ...");
        assert_eq!(truncate("Kniebeuge", 10), "Kniebeuge");
    }

    #[test]
    fn test_resolve_id_prefix() {
        let ids = ["abc123", "abd456", "x"];
        assert_eq!(resolve_id(ids, "abc").unwrap(), "abc123");
        assert_eq!(resolve_id(ids, "x").unwrap(), "x");
        assert!(resolve_id(ids, "ab").is_err());
        assert!(resolve_id(ids, "zzz").is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0f8fad5b-d9cb-469f-a165-70867728950e"), "0f8fad5b");
        assert_eq!(short_id("abc"), "abc");
    }
}
