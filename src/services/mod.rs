pub mod auth;
pub mod enrollment;
pub mod nonce;
pub mod totp;
pub mod verification;

pub use auth::{AuthPipeline, AuthStep, LoginSubmission, StepDecision};
pub use enrollment::{AccessPolicy, EnrollmentPage, EnrollmentService, ProfileSubmission, SelfEditPolicy};
pub use nonce::NonceService;
pub use totp::TotpService;
pub use verification::TotpGate;
