//! Typed shapes of the PAYDA backend resources.

pub mod coupon;
pub mod donation;
pub mod need;
pub mod timestamp;

pub use coupon::{
    AssignCouponRequest, Coupon, CouponQuery, CouponStatus, OperationStatus, PoolSummary,
    ShowcaseItem, UseCouponRequest,
};
pub use donation::Donation;
pub use need::{CreatedNeed, NewNeed, Need, NeedStatus};
