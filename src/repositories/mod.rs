pub mod attribute_store;
pub mod user_totp;

pub use attribute_store::{AttributeStore, MemoryAttributeStore};
pub use user_totp::UserTotpRepository;
