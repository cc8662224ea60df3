pub mod user_totp;

pub use user_totp::{EnrollmentState, UserTotpRecord};
