//! Query classification and routing for KisaanMitra.
//!
//! Handles:
//! - Explicit agent prefixes (`@MIA what is the wheat price?`)
//! - Deciding which agent answers an utterance, and with what reply
//!
//! Rules are evaluated in a fixed order and the first match wins:
//! 1. fraud/safety override (beats explicit routing)
//! 2. explicit target
//! 3. keyword inference (agronomy, then market, then finance)
//! 4. master fallback

use regex::Regex;
use std::sync::Arc;

use super::message::Status;
use crate::agent::{AgentCatalog, AgentId};

/// Credential-like tokens that trigger the fraud override. They match whole
/// words only (plurals included), so "spinach" or "shipping" never fire.
pub const FRAUD_TOKENS: [&str; 3] = ["pin", "password", "otp"];

const FRAUD_WARNING: &str = "FRAUD ALERT: Never share your OTP, PIN, CVV or password with anyone. Bank and government staff will never ask for them by phone or SMS. If someone has asked, treat it as a scam, block the caller and report it on the 1930 cyber fraud helpline.";
const FRAUD_CONFIDENCE: u8 = 95;

/// Keyword families in scan order. Ties resolve by position in this table.
const KEYWORD_FAMILIES: [(AgentId, &[&str]); 3] = [
    (
        AgentId::Gaa,
        &["crop", "disease", "pest", "leaf", "yield", "soil"],
    ),
    (AgentId::Mia, &["price", "market", "mandi", "sell"]),
    (AgentId::Fia, &["loan", "credit", "kcc", "subsidy"]),
];

/// Which rule produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    FraudOverride,
    ExplicitTarget,
    Keyword,
    Fallback,
}

/// Outcome of classifying one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub agent: AgentId,
    pub content: String,
    pub status: Status,
    pub confidence: u8,
    pub rule: Rule,
}

/// Pure, deterministic utterance classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    catalog: Arc<AgentCatalog>,
}

impl Classifier {
    pub fn new(catalog: Arc<AgentCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    /// Decide which agent answers `utterance`.
    ///
    /// `target` is a raw agent id; unknown values fall through to keyword
    /// inference without error.
    pub fn classify(&self, utterance: &str, target: Option<&str>) -> ClassificationResult {
        let text = utterance.to_lowercase();

        if mentions_credentials(&text) {
            return ClassificationResult {
                agent: AgentId::Fia,
                content: FRAUD_WARNING.to_string(),
                status: Status::Danger,
                confidence: FRAUD_CONFIDENCE,
                rule: Rule::FraudOverride,
            };
        }

        if let Some(agent) = target.and_then(|t| self.catalog.resolve(t)) {
            return self.from_template(agent, Rule::ExplicitTarget);
        }

        for (agent, keywords) in KEYWORD_FAMILIES.iter() {
            if keywords.iter().any(|k| text.contains(k)) {
                return self.from_template(*agent, Rule::Keyword);
            }
        }

        self.from_template(AgentId::Master, Rule::Fallback)
    }

    fn from_template(&self, agent: AgentId, rule: Rule) -> ClassificationResult {
        match self.catalog.template(agent) {
            Some(t) => ClassificationResult {
                agent,
                content: t.content.clone(),
                status: t.status,
                confidence: t.confidence,
                rule,
            },
            // Only reachable with a catalog missing entries.
            None => ClassificationResult {
                agent,
                content: format!("{} has received your question.", agent),
                status: Status::Success,
                confidence: 50,
                rule,
            },
        }
    }
}

/// True if any word of `text` (already lower-cased) is a fraud token.
fn mentions_credentials(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .any(|word| {
            let singular = word.strip_suffix('s').unwrap_or(word);
            FRAUD_TOKENS.contains(&word) || FRAUD_TOKENS.contains(&singular)
        })
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Arc::new(AgentCatalog::standard()))
    }
}

/// Parse an explicit agent prefix.
///
/// Returns the raw target and the remaining text if the message starts with
/// `@target `. The target is not validated here.
///
/// # Examples
///
/// ```
/// use kisaanmitra::core::routing::parse_agent_routing;
///
/// let (agent, message) = parse_agent_routing("@mia wheat price today").unwrap();
/// assert_eq!(agent, "MIA");
/// assert_eq!(message, "wheat price today");
/// ```
pub fn parse_agent_routing(message: &str) -> Option<(String, String)> {
    let re = Regex::new(r"^\s*@(\w+)\s+([\s\S]+)$").ok()?;

    let caps = re.captures(message)?;
    let agent_id = caps.get(1)?.as_str().to_uppercase();
    let remaining = caps.get(2)?.as_str().trim();

    Some((agent_id, remaining.to_string()))
}
