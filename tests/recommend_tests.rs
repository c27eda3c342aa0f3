//! Integration tests cho gợi ý vToken

use lstfi_hub::recommend::{rank, recommend, Experience, RiskTolerance, MAX_ALLOCATION_SHARE};
use lstfi_hub::tokens::{ChainFamily, LiquidityTier, MarketData, PopularityTier, VTOKEN_CATALOG};
use lstfi_hub::{StaticMarketTable, TokenSymbol, UserProfile};

#[test]
fn test_default_profile_ranking() {
    let ranked = rank(&UserProfile::default(), &StaticMarketTable::new());
    let order: Vec<(TokenSymbol, i32)> = ranked.iter().map(|r| (r.token, r.score)).collect();
    assert_eq!(
        order,
        vec![
            (TokenSymbol::VDot, 97),
            (TokenSymbol::VAstr, 93),
            (TokenSymbol::VGlmr, 88),
            // Điểm bằng nhau giữ thứ tự danh mục
            (TokenSymbol::VKsm, 83),
            (TokenSymbol::VFil, 83),
        ]
    );
}

#[test]
fn test_ranking_is_deterministic() {
    let market = StaticMarketTable::new();
    let profile = UserProfile {
        risk_tolerance: RiskTolerance::Aggressive,
        preferred_chains: vec![ChainFamily::Kusama, ChainFamily::Moonbeam],
        ..UserProfile::default()
    };
    let first = rank(&profile, &market);
    let second = rank(&profile, &market);
    assert_eq!(first, second);

    for pair in first.windows(2) {
        assert!(pair[0].score >= pair[1].score, "Phải sắp xếp giảm dần");
        if pair[0].score == pair[1].score {
            let position = |symbol| VTOKEN_CATALOG.iter().position(|s| *s == symbol);
            assert!(position(pair[0].token) < position(pair[1].token));
        }
    }
}

#[test]
fn test_allocation_never_exceeds_share() {
    let market = StaticMarketTable::new();
    let risks = [RiskTolerance::Conservative, RiskTolerance::Balanced, RiskTolerance::Aggressive];
    let levels = [Experience::Beginner, Experience::Intermediate, Experience::Advanced];

    for risk in risks {
        for experience in levels {
            for amount in [0.0, 1.0, 1000.0, 250_000.0] {
                let profile = UserProfile {
                    risk_tolerance: risk,
                    investment_amount: amount,
                    experience,
                    ..UserProfile::default()
                };
                for r in rank(&profile, &market) {
                    assert!(r.recommended_amount >= 0.0);
                    assert!(
                        r.recommended_amount <= amount * MAX_ALLOCATION_SHARE + 1e-9,
                        "{} phân bổ {} vượt quá 60% của {}",
                        r.token,
                        r.recommended_amount,
                        amount
                    );
                }
            }
        }
    }
}

#[test]
fn test_cautious_beginner_keeps_top_choice() {
    let profile = UserProfile {
        risk_tolerance: RiskTolerance::Conservative,
        experience: Experience::Beginner,
        ..UserProfile::default()
    };
    let top = recommend(&profile, &StaticMarketTable::new(), 3);
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].token, TokenSymbol::VDot);
    assert_eq!(top[0].score, 97);
    assert_eq!(top[0].recommended_amount, 600.0);
    assert!(top.iter().all(|r| r.token != TokenSymbol::VFil), "vFIL thanh khoản thấp bị đẩy xuống");
}

#[test]
fn test_market_override_changes_order() {
    let market = StaticMarketTable::new().with_market_data(
        TokenSymbol::VFil,
        MarketData {
            apy: 20.0,
            liquidity: LiquidityTier::High,
            popularity: PopularityTier::VeryHigh,
        },
    );
    let top = recommend(&UserProfile::default(), &market, 1);
    assert_eq!(top[0].token, TokenSymbol::VFil);
    assert_eq!(top[0].score, 102);
}
