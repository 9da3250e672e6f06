//! Card and bank push-notification parsing
//!
//! Turns text like `신한카드(1234) 김*수님 15,000원 승인 02/15 13:00 스타벅스강남점`
//! into an amount, a vendor and a transaction date.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{flexible_datetime, NewTransaction};

/// Fields recovered from a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedNotification {
    pub amount: i64,
    pub vendor: String,
    #[serde(with = "flexible_datetime")]
    pub transaction_date: NaiveDateTime,
}

impl ParsedNotification {
    /// A transaction for `user_id` carrying the original text
    pub fn into_transaction(self, user_id: &str, raw_text: &str) -> NewTransaction {
        NewTransaction {
            user_id: user_id.to_string(),
            amount: self.amount,
            vendor: self.vendor,
            raw_text: raw_text.to_string(),
            transaction_date: self.transaction_date,
        }
    }
}

/// Removed from the text before the vendor is picked, in this order
const NOISE_PATTERNS: &[&str] = &[
    r"[\d,]+\s*원",
    r"\d{1,2}[/.]\d{1,2}",
    r"\d{1,2}:\d{2}",
    r"승인|입금|출금|결제|이체|취소",
    r"\(.*?\)",
    r"[가-힣]{1,3}\*[가-힣]님?",
    r"[가-힣]{2,4}님",
    r"\b\d{4}\b",
    r"신한카드|KB국민카드|카카오뱅크|토스뱅크|우리카드|하나카드|삼성카드|현대카드|롯데카드|NH카드|BC카드",
];

/// Compiled notification patterns
///
/// Build once and share; compiling is the only fallible step.
#[derive(Debug, Clone)]
pub struct NotificationParser {
    amount: Regex,
    date_time: Regex,
    date_only: Regex,
    noise: Vec<Regex>,
    non_word: Regex,
    whitespace: Regex,
}

impl NotificationParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            amount: Regex::new(r"([\d,]+)\s*원")?,
            date_time: Regex::new(r"(\d{1,2})[/.:](\d{1,2})\s+(\d{1,2}):(\d{2})")?,
            date_only: Regex::new(r"(\d{1,2})[/.](\d{1,2})")?,
            noise: NOISE_PATTERNS
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<_, _>>()?,
            non_word: Regex::new(r"[^\w\s]")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Parse a notification; None when there is no amount or no vendor
    ///
    /// Dates carry no year, so the year of `now` is assumed. Missing or
    /// impossible dates resolve to `now`.
    pub fn parse(&self, raw_text: &str, now: NaiveDateTime) -> Option<ParsedNotification> {
        let amount = self.extract_amount(raw_text)?;
        let vendor = self.extract_vendor(raw_text)?;
        Some(ParsedNotification {
            amount,
            vendor,
            transaction_date: self.extract_date(raw_text, now),
        })
    }

    fn extract_amount(&self, text: &str) -> Option<i64> {
        let caps = self.amount.captures(text)?;
        caps[1].replace(',', "").parse().ok()
    }

    fn extract_date(&self, text: &str, now: NaiveDateTime) -> NaiveDateTime {
        if let Some(caps) = self.date_time.captures(text) {
            return date_in_year(now.year(), &caps, true).unwrap_or(now);
        }
        if let Some(caps) = self.date_only.captures(text) {
            return date_in_year(now.year(), &caps, false).unwrap_or(now);
        }
        now
    }

    fn extract_vendor(&self, text: &str) -> Option<String> {
        let mut cleaned = text.to_string();
        for pattern in &self.noise {
            cleaned = pattern.replace_all(&cleaned, " ").into_owned();
        }
        let cleaned = self.non_word.replace_all(&cleaned, " ");
        let cleaned = self.whitespace.replace_all(&cleaned, " ");

        // Longest token wins; the first one on ties
        cleaned
            .split(' ')
            .filter(|token| token.chars().count() >= 2)
            .fold(None::<&str>, |best, token| match best {
                Some(b) if b.chars().count() >= token.chars().count() => Some(b),
                _ => Some(token),
            })
            .map(str::to_string)
    }
}

/// Build a date from month/day (and optionally hour/minute) captures
fn date_in_year(year: i32, caps: &regex::Captures, with_time: bool) -> Option<NaiveDateTime> {
    let number = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let date = NaiveDate::from_ymd_opt(year, number(1)?, number(2)?)?;
    if with_time {
        date.and_hms_opt(number(3)?, number(4)?, 0)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
}
