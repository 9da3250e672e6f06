//! Vendor categorization
//!
//! A configured AI backend is asked first. An unusable answer (a label
//! outside the category set, a timeout, a non-2xx reply) falls back to
//! ordered keyword rules, so classification itself never fails.

use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient};
use crate::db::Database;
use crate::error::Result;
use crate::models::Category;

const FOOD_KEYWORDS: &[&str] = &[
    "스타벅스", "카페", "커피", "맥도날드", "버거킹", "롯데리아", "배달의민족", "요기요",
    "쿠팡이츠", "편의점", "cu", "gs25", "세븐일레븐", "이마트24", "김밥", "치킨", "피자",
    "족발", "bbq", "bhc", "교촌", "떡볶이", "식당", "레스토랑", "한식", "중식", "일식", "분식",
    "베이커리", "빵", "마라탕", "샐러드", "도시락", "반찬", "고기", "삼겹살", "회",
];

const TRANSPORT_KEYWORDS: &[&str] = &[
    "지하철", "버스", "택시", "카카오t", "타다", "코레일", "ktx", "srt", "고속버스", "주유소",
    "gs칼텍스", "sk에너지", "s-oil", "주차", "톨게이트", "하이패스",
];

const SHOPPING_KEYWORDS: &[&str] = &[
    "올리브영", "다이소", "쿠팡", "네이버", "무신사", "지그재그", "이마트", "홈플러스",
    "롯데마트", "코스트코", "하이마트", "백화점", "아울렛", "마켓", "쇼핑",
];

const MEDICAL_KEYWORDS: &[&str] = &[
    "병원", "의원", "클리닉", "약국", "치과", "안과", "피부과", "정형외과", "내과",
    "이비인후과", "세브란스", "삼성서울", "아산",
];

const HOUSING_KEYWORDS: &[&str] = &[
    "관리비", "월세", "전기", "가스", "수도", "통신", "kt", "skt", "lg유플러스", "인터넷",
    "아파트",
];

const FINANCE_KEYWORDS: &[&str] = &[
    "보험", "적금", "대출", "증권", "투자", "은행", "카드", "수수료", "이자",
];

/// Keyword lists in match priority order
const RULES: [(Category, &[&str]); 6] = [
    (Category::Food, FOOD_KEYWORDS),
    (Category::Transport, TRANSPORT_KEYWORDS),
    (Category::Shopping, SHOPPING_KEYWORDS),
    (Category::Medical, MEDICAL_KEYWORDS),
    (Category::Housing, HOUSING_KEYWORDS),
    (Category::Finance, FINANCE_KEYWORDS),
];

/// Classify a vendor by keyword containment alone
///
/// Lists are tried in priority order and the first hit wins, so a vendor
/// matching both a food and a shopping keyword is food.
pub fn classify_by_rules(vendor: &str) -> Category {
    let vendor = vendor.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| vendor.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Where a classification came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    /// The AI backend answered with a valid label
    Remote,
    /// Keyword rules (no backend, or the backend's answer was unusable)
    Rules,
}

/// Result of a backfill run over uncategorized transactions
#[derive(Debug, Clone, Default)]
pub struct BackfillResult {
    pub transactions_processed: usize,
    pub by_remote: usize,
    pub by_rules: usize,
    /// Rows that disappeared between listing and writing
    pub missing: usize,
}

/// Vendor classifier with an optional AI backend
///
/// Cheap to clone; created once at startup and shared by every worker.
#[derive(Clone, Default)]
pub struct CategoryClassifier {
    ai: Option<AIClient>,
}

impl CategoryClassifier {
    pub fn new(ai: Option<AIClient>) -> Self {
        Self { ai }
    }

    /// A classifier that only ever uses keyword rules
    pub fn rules_only() -> Self {
        Self { ai: None }
    }

    /// Build from `AI_BACKEND` and the backend's own variables
    pub fn from_env() -> Self {
        Self::new(AIClient::from_env())
    }

    /// The configured backend, if any
    pub fn backend(&self) -> Option<&AIClient> {
        self.ai.as_ref()
    }

    /// Classify a vendor; always yields a category
    pub async fn classify(&self, vendor: &str) -> Category {
        self.classify_with_source(vendor).await.0
    }

    /// Classify a vendor and report which path produced the answer
    pub async fn classify_with_source(&self, vendor: &str) -> (Category, ClassificationSource) {
        let Some(ai) = &self.ai else {
            return (classify_by_rules(vendor), ClassificationSource::Rules);
        };

        match ai.classify_vendor(vendor).await {
            Ok(label) => match label.parse::<Category>() {
                Ok(category) => {
                    debug!(vendor = %vendor, category = %category, "Classified by {}", ai.model());
                    return (category, ClassificationSource::Remote);
                }
                Err(_) => {
                    warn!(vendor = %vendor, label = %label, "Backend returned an unknown category, using rules");
                }
            },
            Err(e) => {
                warn!(
                    vendor = %vendor,
                    transient = e.is_transient(),
                    "Classification via {} failed, using rules: {}",
                    ai.host(),
                    e
                );
            }
        }

        (classify_by_rules(vendor), ClassificationSource::Rules)
    }

    /// Classify a vendor and store the category on a transaction
    ///
    /// Returns the category written, or None when the transaction no longer
    /// exists (logged; nobody is waiting on this).
    pub async fn classify_and_update(
        &self,
        db: &Database,
        transaction_id: i64,
        vendor: &str,
    ) -> Result<Option<Category>> {
        let category = self.classify(vendor).await;
        if db.update_transaction_category(transaction_id, category)? {
            debug!(transaction_id, category = %category, "Stored category");
            Ok(Some(category))
        } else {
            warn!(transaction_id, "Transaction vanished before its category was stored");
            Ok(None)
        }
    }

    /// Classify up to `limit` transactions that still have no category
    pub async fn backfill(&self, db: &Database, limit: i64) -> Result<BackfillResult> {
        let pending = db.list_uncategorized_transactions(limit)?;
        let mut result = BackfillResult {
            transactions_processed: pending.len(),
            ..Default::default()
        };

        for tx in &pending {
            let (category, source) = self.classify_with_source(&tx.vendor).await;
            if !db.update_transaction_category(tx.id, category)? {
                result.missing += 1;
                continue;
            }
            match source {
                ClassificationSource::Remote => result.by_remote += 1,
                ClassificationSource::Rules => result.by_rules += 1,
            }
        }

        Ok(result)
    }
}
