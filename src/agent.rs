//! Agent catalog: the seven domain specialists, the master fallback, and
//! their canned response templates.
//!
//! The catalog is immutable reference data. Build it once at startup with
//! [`AgentCatalog::standard`] (or [`AgentCatalog::from_settings`]) and pass it
//! explicitly to whatever needs it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::core::message::Status;

/// Agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AgentId {
    /// Collective Market Governance
    Cmga,
    /// Market Intelligence
    Mia,
    /// Geo-Agronomy
    Gaa,
    /// Climate & Resource
    Cra,
    /// Financial Inclusion
    Fia,
    /// Logistics & Infrastructure
    Lia,
    /// Human Interface
    Hia,
    /// Synthetic fallback; never a valid explicit target.
    Master,
}

impl AgentId {
    /// The seven routable specialists, in display order.
    pub const SPECIALISTS: [AgentId; 7] = [
        AgentId::Cmga,
        AgentId::Mia,
        AgentId::Gaa,
        AgentId::Cra,
        AgentId::Fia,
        AgentId::Lia,
        AgentId::Hia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Cmga => "CMGA",
            AgentId::Mia => "MIA",
            AgentId::Gaa => "GAA",
            AgentId::Cra => "CRA",
            AgentId::Fia => "FIA",
            AgentId::Lia => "LIA",
            AgentId::Hia => "HIA",
            AgentId::Master => "MASTER",
        }
    }

    pub fn is_specialist(&self) -> bool {
        !matches!(self, AgentId::Master)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CMGA" => Ok(AgentId::Cmga),
            "MIA" => Ok(AgentId::Mia),
            "GAA" => Ok(AgentId::Gaa),
            "CRA" => Ok(AgentId::Cra),
            "FIA" => Ok(AgentId::Fia),
            "LIA" => Ok(AgentId::Lia),
            "HIA" => Ok(AgentId::Hia),
            "MASTER" => Ok(AgentId::Master),
            _ => Err(format!("Unknown agent id: {}", s)),
        }
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.as_str().to_string()
    }
}

impl TryFrom<String> for AgentId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Static description of one agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentProfile {
    pub id: AgentId,
    pub name: String,
    pub domain: String,
    pub capabilities: Vec<String>,
}

/// A fixed reply with its severity and confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTemplate {
    pub content: String,
    pub status: Status,
    pub confidence: u8,
}

impl ResponseTemplate {
    fn new(content: &str, status: Status, confidence: u8) -> Self {
        Self {
            content: content.to_string(),
            status,
            confidence,
        }
    }
}

/// Immutable agent reference data.
#[derive(Debug, Clone)]
pub struct AgentCatalog {
    profiles: Vec<AgentProfile>,
    templates: HashMap<AgentId, ResponseTemplate>,
}

impl AgentCatalog {
    /// The built-in catalog.
    pub fn standard() -> Self {
        let profiles = vec![
            profile(
                AgentId::Cmga,
                "Collective Market Governance Agent",
                "FPO governance, pooled selling and profit distribution",
                &["portfolio_optimization", "profit_distribution", "fraud_reporting"],
            ),
            profile(
                AgentId::Mia,
                "Market Intelligence Agent",
                "Mandi prices, demand forecasts and market trends",
                &["mandi_prices", "demand_forecast", "price_prediction"],
            ),
            profile(
                AgentId::Gaa,
                "Geo-Agronomy Agent",
                "Crop health, NDVI analysis and yield forecasting",
                &["ndvi_analysis", "crop_stress_detection", "yield_forecast"],
            ),
            profile(
                AgentId::Cra,
                "Climate & Resource Agent",
                "Weather, irrigation scheduling and water budgets",
                &["irrigation_schedule", "climate_resilience", "water_budget"],
            ),
            profile(
                AgentId::Fia,
                "Financial Inclusion Agent",
                "Credit, insurance, government schemes and fraud prevention",
                &["credit_advisory", "insurance_info", "fraud_prevention"],
            ),
            profile(
                AgentId::Lia,
                "Logistics & Infrastructure Agent",
                "Transport routing, cold chain and storage",
                &["route_optimization", "cold_chain", "storage_booking"],
            ),
            profile(
                AgentId::Hia,
                "Human Interface Agent",
                "Multilingual conversation and voice assistance",
                &["translation", "voice_input", "text_to_speech"],
            ),
        ];

        let templates = HashMap::from([
            (
                AgentId::Cmga,
                ResponseTemplate::new(
                    "Your FPO's collective portfolio looks balanced. Pooling produce with the other member farmers can cut per-quintal transport cost by about 18% and strengthens your bargaining position at the mandi.",
                    Status::Success,
                    88,
                ),
            ),
            (
                AgentId::Mia,
                ResponseTemplate::new(
                    "Wheat is trading at ₹2,275/quintal at your nearest mandi, up 3.2% this week. Demand is forecast to stay firm for the next 10 days, so consider selling in two lots.",
                    Status::Success,
                    89,
                ),
            ),
            (
                AgentId::Gaa,
                ResponseTemplate::new(
                    "NDVI for your plot dropped from 0.72 to 0.61 over the last 14 days, an early sign of crop stress. Inspect the lower leaves for yellowing or spots and check soil moisture before the next spray.",
                    Status::Warning,
                    82,
                ),
            ),
            (
                AgentId::Cra,
                ResponseTemplate::new(
                    "Light rainfall (about 8 mm) is expected in 3 days. Delay the next irrigation by 2 days to save roughly 15% water. Heat stress risk is moderate this week.",
                    Status::Warning,
                    84,
                ),
            ),
            (
                AgentId::Fia,
                ResponseTemplate::new(
                    "You are eligible for a Kisan Credit Card (KCC) loan at 7% interest, reduced to 4% on prompt repayment. The short-term limit is typically up to ₹3,00,000. Keep your Aadhaar, farmer ID and land records ready.",
                    Status::Success,
                    91,
                ),
            ),
            (
                AgentId::Lia,
                ResponseTemplate::new(
                    "The nearest cold storage with free capacity is 14 km away. A shared truck leaves tomorrow at 6 AM; booking a slot now keeps transport near ₹1.8/kg.",
                    Status::Success,
                    87,
                ),
            ),
            (
                AgentId::Hia,
                ResponseTemplate::new(
                    "Namaste! I can talk with you in Hindi, Marathi, Tamil or English and read replies aloud. Tell me what you need: prices, crop health, weather, loans or transport.",
                    Status::Success,
                    93,
                ),
            ),
            (
                AgentId::Master,
                ResponseTemplate::new(
                    "I've shared your question with the specialist agents. Ask about crop health, mandi prices, weather and water, loans and schemes, transport, or your FPO and I'll route it to the right expert.",
                    Status::Success,
                    85,
                ),
            ),
        ]);

        Self {
            profiles,
            templates,
        }
    }

    /// The built-in catalog with display-name overrides applied.
    ///
    /// Override keys that do not name a specialist are ignored with a warning.
    pub fn from_settings(name_overrides: &HashMap<String, String>) -> Self {
        let mut catalog = Self::standard();

        for (key, name) in name_overrides {
            match key.parse::<AgentId>() {
                Ok(id) if id.is_specialist() => {
                    if let Some(p) = catalog.profiles.iter_mut().find(|p| p.id == id) {
                        p.name = name.clone();
                    }
                }
                _ => tracing::warn!("Ignoring name override for unknown agent '{}'", key),
            }
        }

        catalog
    }

    /// Look up a specialist by id (case-insensitive). `MASTER` is not listed.
    pub fn get(&self, id: &str) -> Option<&AgentProfile> {
        let id = id.parse::<AgentId>().ok()?;
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Resolve a raw target string to a routable specialist id.
    pub fn resolve(&self, target: &str) -> Option<AgentId> {
        self.get(target).map(|p| p.id)
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        self.profiles.iter()
    }

    /// Canned reply for an agent.
    pub fn template(&self, id: AgentId) -> Option<&ResponseTemplate> {
        self.templates.get(&id)
    }
}

impl Default for AgentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn profile(id: AgentId, name: &str, domain: &str, capabilities: &[&str]) -> AgentProfile {
    AgentProfile {
        id,
        name: name.to_string(),
        domain: domain.to_string(),
        capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_parse() {
        assert_eq!("mia".parse::<AgentId>().unwrap(), AgentId::Mia);
        assert_eq!(" CMGA ".parse::<AgentId>().unwrap(), AgentId::Cmga);
        assert!("XYZ".parse::<AgentId>().is_err());
        assert_eq!(AgentId::Master.to_string(), "MASTER");
    }

    #[test]
    fn test_agent_id_serde() {
        let json = serde_json::to_string(&AgentId::Fia).unwrap();
        assert_eq!(json, "\"FIA\"");

        let id: AgentId = serde_json::from_str("\"gaa\"").unwrap();
        assert_eq!(id, AgentId::Gaa);
    }

    #[test]
    fn test_catalog_known_agents() {
        let catalog = AgentCatalog::standard();
        assert_eq!(catalog.iter().count(), 7);

        for id in ["CMGA", "MIA", "GAA", "CRA", "FIA", "LIA", "HIA"] {
            assert!(catalog.is_known(id), "{} should be known", id);
        }

        // Master is a fallback, not a target
        assert!(!catalog.is_known("MASTER"));
        assert!(!catalog.is_known("farmer"));
    }

    #[test]
    fn test_every_agent_has_template() {
        let catalog = AgentCatalog::standard();
        for id in AgentId::SPECIALISTS {
            let t = catalog.template(id).unwrap();
            assert!(!t.content.is_empty());
            assert!(t.confidence <= 100);
        }

        let master = catalog.template(AgentId::Master).unwrap();
        assert_eq!(master.status, Status::Success);
        assert_eq!(master.confidence, 85);
    }

    #[test]
    fn test_name_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert("mia".to_string(), "Mandi Mitra".to_string());
        overrides.insert("nobody".to_string(), "Ghost".to_string());

        let catalog = AgentCatalog::from_settings(&overrides);
        assert_eq!(catalog.get("MIA").unwrap().name, "Mandi Mitra");
        assert_eq!(catalog.get("FIA").unwrap().name, "Financial Inclusion Agent");
    }
}
