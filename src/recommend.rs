//! Bộ gợi ý staking tĩnh
//!
//! Chấm điểm từng vToken trong danh mục theo hồ sơ người dùng bằng các quy tắc
//! cộng/trừ điểm cố định. Hàm thuần: không I/O, cùng đầu vào cho cùng kết quả.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::tokens::{
    ChainFamily, LiquidityTier, MarketData, MarketDataSource, PopularityTier, TokenSymbol, VTOKEN_CATALOG,
};

pub const BASE_SCORE: i32 = 50;
/// Tỷ lệ tối đa của số vốn cho một token
pub const MAX_ALLOCATION_SHARE: f64 = 0.6;
pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for RiskTolerance {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(WalletError::Config(format!("unknown risk tolerance: {}", other))),
        }
    }
}

impl FromStr for Experience {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(WalletError::Config(format!("unknown experience level: {}", other))),
        }
    }
}

/// Hồ sơ người dùng
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub risk_tolerance: RiskTolerance,
    pub investment_amount: f64,
    pub preferred_chains: Vec<ChainFamily>,
    pub experience: Experience,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            risk_tolerance: RiskTolerance::Balanced,
            investment_amount: 1000.0,
            preferred_chains: vec![ChainFamily::Polkadot],
            experience: Experience::Intermediate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub token: TokenSymbol,
    pub underlying: &'static str,
    pub apy: f64,
    pub score: i32,
    pub risk_level: RiskLevel,
    pub reason: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub recommended_amount: f64,
    pub color: &'static str,
}

/// Chấm điểm một token theo dữ liệu thị trường của nó
pub fn score_token(symbol: TokenSymbol, data: &MarketData, profile: &UserProfile) -> Recommendation {
    let record = symbol.record();
    let mut score = BASE_SCORE;
    let mut pros = Vec::new();
    let mut cons = Vec::new();

    if data.apy > 15.0 {
        score += 15;
        pros.push("High yield".to_string());
    } else if data.apy > 12.0 {
        score += 10;
        pros.push("Good yield".to_string());
    } else {
        score += 5;
        pros.push("Stable yield".to_string());
    }

    match data.liquidity {
        LiquidityTier::High => {
            score += 15;
            pros.push("High liquidity, easy to trade".to_string());
        }
        LiquidityTier::Medium => {
            score += 10;
            pros.push("Moderate liquidity".to_string());
        }
        LiquidityTier::Low => {
            score += 5;
            cons.push("Low liquidity".to_string());
        }
    }

    match data.popularity {
        PopularityTier::VeryHigh => {
            score += 12;
            pros.push("Widely adopted".to_string());
        }
        PopularityTier::High => {
            score += 8;
            pros.push("Popular".to_string());
        }
        PopularityTier::Medium | PopularityTier::Low => {
            score += 3;
            cons.push("Niche market".to_string());
        }
    }

    if profile.preferred_chains.contains(&record.chain) {
        score += 10;
        pros.push("Matches your chain preference".to_string());
    }

    if profile.risk_tolerance == RiskTolerance::Conservative && data.liquidity == LiquidityTier::Low {
        score -= 15;
        cons.push("Elevated liquidity risk".to_string());
    } else if profile.risk_tolerance == RiskTolerance::Aggressive && data.apy > 15.0 {
        score += 8;
        pros.push("Matches your risk appetite".to_string());
    }

    if profile.experience == Experience::Beginner && data.popularity != PopularityTier::VeryHigh {
        score -= 5;
        cons.push("Better suited to experienced users".to_string());
    }

    let risk_level = if data.liquidity == LiquidityTier::High && data.popularity == PopularityTier::VeryHigh {
        RiskLevel::Low
    } else if data.liquidity == LiquidityTier::Low || data.popularity == PopularityTier::Low {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };

    let reason = if score >= 80 {
        format!("Strongly recommended: {}, with excellent yield and liquidity.", record.description)
    } else if score >= 65 {
        format!("Recommended: {}, balancing yield and risk for your profile.", record.description)
    } else if score >= 50 {
        format!("Worth considering: {}, weigh the yield against the risk.", record.description)
    } else {
        format!("Consider with caution: {}, higher risk or modest yield.", record.description)
    };

    let amount = profile.investment_amount.max(0.0);
    let recommended_amount = (amount * score as f64 / 100.0).min(amount * MAX_ALLOCATION_SHARE);

    Recommendation {
        token: symbol,
        underlying: record.underlying,
        apy: data.apy,
        score,
        risk_level,
        reason,
        pros,
        cons,
        recommended_amount,
        color: record.color,
    }
}

/// Xếp hạng toàn bộ danh mục vToken theo điểm giảm dần
///
/// Token không có dữ liệu thị trường bị loại; điểm bằng nhau giữ thứ tự danh mục.
pub fn rank(profile: &UserProfile, market: &dyn MarketDataSource) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = VTOKEN_CATALOG
        .iter()
        .filter_map(|symbol| market.market_data(*symbol).map(|data| score_token(*symbol, &data, profile)))
        .collect();
    recommendations.sort_by(|a, b| b.score.cmp(&a.score));
    recommendations
}

/// `top_n` gợi ý tốt nhất
pub fn recommend(profile: &UserProfile, market: &dyn MarketDataSource, top_n: usize) -> Vec<Recommendation> {
    let mut ranked = rank(profile, market);
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::StaticMarketTable;

    fn cautious_beginner() -> UserProfile {
        UserProfile {
            risk_tolerance: RiskTolerance::Conservative,
            investment_amount: 1000.0,
            preferred_chains: vec![ChainFamily::Polkadot],
            experience: Experience::Beginner,
        }
    }

    #[test]
    fn test_cautious_beginner_scores() {
        let ranked = rank(&cautious_beginner(), &StaticMarketTable::new());
        let score_of = |symbol| ranked.iter().find(|r| r.token == symbol).map(|r| r.score);

        assert_eq!(ranked[0].token, TokenSymbol::VDot);
        assert_eq!(score_of(TokenSymbol::VDot), Some(97));
        assert_eq!(score_of(TokenSymbol::VFil), Some(63));
        assert_eq!(ranked[0].risk_level, RiskLevel::Low);
        assert!(ranked[0].recommended_amount <= 600.0);
    }

    #[test]
    fn test_conservative_penalty_only_on_low_liquidity() {
        let market = StaticMarketTable::new();
        let vfil = market.market_data(TokenSymbol::VFil).unwrap();
        let mut balanced = cautious_beginner();
        balanced.risk_tolerance = RiskTolerance::Balanced;

        let conservative = score_token(TokenSymbol::VFil, &vfil, &cautious_beginner());
        let neutral = score_token(TokenSymbol::VFil, &vfil, &balanced);
        assert_eq!(neutral.score - conservative.score, 15);
        assert_eq!(conservative.risk_level, RiskLevel::High);

        let vdot = market.market_data(TokenSymbol::VDot).unwrap();
        assert_eq!(
            score_token(TokenSymbol::VDot, &vdot, &cautious_beginner()).score,
            score_token(TokenSymbol::VDot, &vdot, &balanced).score
        );
    }

    #[test]
    fn test_missing_market_data_excludes_token() {
        let market = StaticMarketTable::new().without_market_data(TokenSymbol::VGlmr);
        let ranked = rank(&UserProfile::default(), &market);
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|r| r.token != TokenSymbol::VGlmr));
    }

    #[test]
    fn test_recommend_truncates() {
        let top = recommend(&UserProfile::default(), &StaticMarketTable::new(), DEFAULT_TOP_N);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[test]
    fn test_reason_bands() {
        let market = StaticMarketTable::new();
        let top = recommend(&cautious_beginner(), &market, 1);
        assert!(top[0].reason.starts_with("Strongly recommended"));
    }
}
