//! Domain models for FinTrack

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spending category assigned to a transaction
///
/// Serialized with the Korean label the mobile client displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "식비")]
    Food,
    #[serde(rename = "교통")]
    Transport,
    #[serde(rename = "쇼핑")]
    Shopping,
    #[serde(rename = "의료")]
    Medical,
    #[serde(rename = "주거")]
    Housing,
    #[serde(rename = "금융")]
    Finance,
    #[serde(rename = "기타")]
    Other,
}

impl Category {
    /// Every category, in rule-priority order with `Other` last
    pub const ALL: [Category; 7] = [
        Self::Food,
        Self::Transport,
        Self::Shopping,
        Self::Medical,
        Self::Housing,
        Self::Finance,
        Self::Other,
    ];

    /// Korean label (storage and wire format)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "식비",
            Self::Transport => "교통",
            Self::Shopping => "쇼핑",
            Self::Medical => "의료",
            Self::Housing => "주거",
            Self::Finance => "금융",
            Self::Other => "기타",
        }
    }

    /// English name, accepted on input and used in CLI output
    pub fn english_name(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Shopping => "shopping",
            Self::Medical => "medical",
            Self::Housing => "housing",
            Self::Finance => "finance",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.english_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded spending transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    /// Minor currency unit (KRW has none, so this is whole won)
    pub amount: i64,
    pub vendor: String,
    /// Unset until the background classifier has run
    pub category: Option<Category>,
    pub raw_text: String,
    pub transaction_date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to be stored (before DB insertion)
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub amount: i64,
    pub vendor: String,
    /// Required on the wire; may be empty for manual entries
    pub raw_text: String,
    #[serde(with = "flexible_datetime")]
    pub transaction_date: NaiveDateTime,
}

impl NewTransaction {
    /// Reject input that would store an unusable record
    pub fn validate(&self) -> crate::Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(crate::Error::Validation("user_id must not be empty".into()));
        }
        Ok(())
    }
}

/// A budget owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub monthly_budget: i64,
    pub fixed_expenses: i64,
}

pub const DEFAULT_USER_NAME: &str = "사용자";
pub const DEFAULT_MONTHLY_BUDGET: i64 = 1_000_000;
pub const DEFAULT_FIXED_EXPENSES: i64 = 300_000;

fn default_user_name() -> String {
    DEFAULT_USER_NAME.to_string()
}

fn default_monthly_budget() -> i64 {
    DEFAULT_MONTHLY_BUDGET
}

fn default_fixed_expenses() -> i64 {
    DEFAULT_FIXED_EXPENSES
}

/// A new user to be stored
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub user_id: String,
    #[serde(default = "default_user_name")]
    pub name: String,
    #[serde(default = "default_monthly_budget")]
    pub monthly_budget: i64,
    #[serde(default = "default_fixed_expenses")]
    pub fixed_expenses: i64,
}

impl NewUser {
    /// A user with the default name and budget
    pub fn with_defaults(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: default_user_name(),
            monthly_budget: DEFAULT_MONTHLY_BUDGET,
            fixed_expenses: DEFAULT_FIXED_EXPENSES,
        }
    }
}

/// A beta-program participant awaiting manual addition to the store test track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tester {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Flips to true once, after the operator alert went out
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

/// A tester registration request
#[derive(Debug, Clone, Deserialize)]
pub struct NewTester {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl NewTester {
    pub fn validate(&self) -> crate::Result<()> {
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
            .unwrap_or(false);
        if !well_formed || email.contains(char::is_whitespace) {
            return Err(crate::Error::Validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }
}

/// Tester emails formatted for pasting into the store console
#[derive(Debug, Clone, Serialize)]
pub struct TesterEmailExport {
    pub count: usize,
    pub emails: Vec<String>,
    pub csv: String,
}

impl TesterEmailExport {
    pub fn new(emails: Vec<String>) -> Self {
        Self {
            count: emails.len(),
            csv: emails.join(","),
            emails,
        }
    }
}

/// Result of the "safe to spend today" computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBudget {
    pub daily_budget: i64,
    /// Clamped at zero even when the month is overspent
    pub remaining_this_month: i64,
    /// Days left in the month, today included
    pub days_left: i64,
    pub spent_this_month: i64,
}

/// Result of the savings goal projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub achievable: bool,
    pub monthly_saving_avg: i64,
    pub projected_total: i64,
    pub deficit: i64,
}

/// Serde adapter for transaction dates
///
/// Accepts naive ISO date-times (taken as UTC) and RFC 3339 strings with an
/// offset (converted to UTC). Always writes the naive form.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid transaction_date: {}", raw))
        })
    }
}
