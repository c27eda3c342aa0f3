//! Danh mục token và dữ liệu thị trường

pub mod catalog;
pub mod market;

pub use catalog::{
    parse_amount, parse_amount_u128, to_display_amount, u256_to_display_amount, ChainFamily,
    TokenKind, TokenRecord, TokenSymbol, ASSET_CATALOG, MOONBASE_CATALOG, VTOKEN_CATALOG,
};
pub use market::{
    LiquidityTier, MarketData, MarketDataSource, PopularityTier, PriceSource, StaticMarketTable,
};
