//! Shared types and pure mint-eligibility logic for the Dropfront storefront.
//! No networking or runtime dependency, so the service and tests share it.

mod claim;
mod eligibility;
mod notify;
mod read;
mod revert;
pub mod units;

pub use claim::{
    parse_ineligibility, ClaimCondition, ClaimerProof, ContractMetadata, CurrencyMetadata,
    IneligibilityReason, DEFAULT_DECIMALS,
};
pub use eligibility::{
    format_price, DropState, MintRequest, QuantityError, LABEL_CHECKING, LABEL_SOLD_OUT,
    LABEL_UNAVAILABLE, MAX_QUANTITY, UNLIMITED,
};
pub use notify::{Notification, Variant, DEFAULT_DURATION_MS};
pub use read::ReadState;
pub use revert::{RevertEntry, RevertKind, RevertTable};
