// Numeric extraction utilities for citation and deadline checks
use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Periods such as "10日", "十五个工作日", "30 days", "5 business days"
    static ref PERIOD: Regex = Regex::new(
        r"(?i)([0-9０-９]+|[零〇一二两三四五六七八九十百千]+)\s*个?(?:工作日|日|天)|\b([0-9]+)\s+(?:business\s+|calendar\s+)?days?\b"
    )
    .expect("period pattern is valid");
}

fn digit_value(ch: char) -> Option<u32> {
    match ch {
        '0'..='9' => ch.to_digit(10),
        '０'..='９' => Some(ch as u32 - '０' as u32),
        '零' | '〇' => Some(0),
        '一' => Some(1),
        '二' | '两' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

/// Parse a Chinese numeral such as "一千二百六十" or "十五".
///
/// Bare digit sequences ("一二六〇") are read positionally.
pub fn parse_chinese_numeral(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    let mut total: u32 = 0;
    let mut section: u32 = 0;
    let mut number: u32 = 0;
    let mut pending_digit = false;

    for ch in s.chars() {
        if let Some(d) = digit_value(ch) {
            number = if pending_digit {
                number.checked_mul(10)?.checked_add(d)?
            } else {
                d
            };
            pending_digit = true;
            continue;
        }

        let unit = match ch {
            '十' => 10,
            '百' => 100,
            '千' => 1_000,
            '万' => 10_000,
            _ => return None,
        };
        if unit == 10_000 {
            section = section.checked_add(number)?;
            total = total.checked_add(section.checked_mul(unit)?)?;
            section = 0;
        } else {
            let multiplier = if pending_digit { number } else { 1 };
            section = section.checked_add(multiplier.checked_mul(unit)?)?;
        }
        number = 0;
        pending_digit = false;
    }

    total.checked_add(section)?.checked_add(number)
}

/// Parse an article number written with ASCII, full-width or Chinese digits.
pub fn parse_article_number(s: &str) -> Option<u32> {
    if s.chars().all(|c| c.is_ascii_digit() || ('０'..='９').contains(&c)) {
        s.chars().try_fold(0u32, |acc, c| {
            acc.checked_mul(10)?.checked_add(digit_value(c)?)
        })
    } else {
        parse_chinese_numeral(s)
    }
}

/// First time period in `text`, as a number of days and its byte range.
pub fn find_period_days(text: &str) -> Option<(u32, Range<usize>)> {
    PERIOD.captures_iter(text).find_map(|cap| {
        let whole = cap.get(0)?;
        let number = cap.get(1).or_else(|| cap.get(2))?;
        let days = parse_article_number(number.as_str())?;
        Some((days, whole.range()))
    })
}
