//! Thao tác staking: vToken trên Bifrost, xcvToken trên Moonbase

pub mod bifrost;
pub mod moonbase;

pub use bifrost::{BifrostStaking, MintingAction};
pub use moonbase::{mint_xc_token, redeem_xc_token};
