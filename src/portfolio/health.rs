use crate::models::PricedAsset;
use serde::Serialize;
use std::fmt;

const BLUE_CHIPS: &[&str] = &["BTC", "ETH", "WBTC", "WETH"];
const STABLECOINS: &[&str] = &["USDT", "USDC", "DAI", "FDUSD"];
const MAX_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Unknown,
    FortressGrade,
    Balanced,
    HighRisk,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Unknown => write!(f, "Unknown"),
            HealthStatus::FortressGrade => write!(f, "Fortress Grade"),
            HealthStatus::Balanced => write!(f, "Balanced"),
            HealthStatus::HighRisk => write!(f, "High Risk Exposure"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Danger,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub text: String,
}

impl Recommendation {
    fn new(kind: RecommendationKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub score: u8,
    pub status: HealthStatus,
    pub recommendations: Vec<Recommendation>,
}

/// Diversification audit of a priced asset list.
///
/// Blue chips add one point per percent of the portfolio, a stablecoin
/// reserve of at least 10% adds ten, holding at least three assets above 5%
/// adds five, and a single asset above half the portfolio costs twenty.
pub fn assess(assets: &[PricedAsset]) -> HealthReport {
    let total: f64 = assets.iter().map(PricedAsset::value_or_zero).sum();
    if total <= 0.0 {
        return HealthReport {
            score: 0,
            status: HealthStatus::Unknown,
            recommendations: vec![Recommendation::new(
                RecommendationKind::Info,
                "Add assets to get your portfolio audit.",
            )],
        };
    }

    let mut blue_chip = 0.0;
    let mut stable = 0.0;
    let mut largest: Option<(&str, f64)> = None;
    let mut significant = 0;

    for asset in assets {
        let value = asset.value_or_zero();
        let percent = value / total * 100.0;
        let symbol = asset.asset.symbol.to_uppercase();

        if largest.map_or(true, |(_, max)| percent > max) {
            largest = Some((asset.asset.symbol.as_str(), percent));
        }
        if BLUE_CHIPS.contains(&symbol.as_str()) {
            blue_chip += value;
        }
        if STABLECOINS.contains(&symbol.as_str()) {
            stable += value;
        }
        if percent > 5.0 {
            significant += 1;
        }
    }

    let mut score = (blue_chip / total * 100.0).round() as i32;
    let mut recommendations = Vec::new();

    if stable / total * 100.0 >= 10.0 {
        score += 10;
    } else {
        recommendations.push(Recommendation::new(
            RecommendationKind::Warning,
            "Low liquidity. Keep at least 10% in stablecoins.",
        ));
    }

    if let Some((symbol, percent)) = largest.filter(|(_, p)| *p > 50.0) {
        score -= 20;
        recommendations.push(Recommendation::new(
            RecommendationKind::Danger,
            format!("Overexposed to {} ({:.0}% of the portfolio).", symbol.to_uppercase(), percent),
        ));
    }

    if significant < 3 {
        recommendations.push(Recommendation::new(
            RecommendationKind::Info,
            "Diversify: aim for at least 3 major assets.",
        ));
    } else {
        score += 5;
    }

    let score = score.clamp(0, 100) as u8;
    let status = if score >= 80 {
        if recommendations.is_empty() {
            recommendations.push(Recommendation::new(RecommendationKind::Success, "Portfolio is well balanced."));
        }
        HealthStatus::FortressGrade
    } else if score >= 50 {
        HealthStatus::Balanced
    } else {
        if recommendations.len() < 2 {
            recommendations.push(Recommendation::new(RecommendationKind::Danger, "High risk of total loss."));
        }
        HealthStatus::HighRisk
    };

    recommendations.truncate(MAX_RECOMMENDATIONS);
    HealthReport { score, status, recommendations }
}
