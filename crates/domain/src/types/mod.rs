//! Domain types and models

pub mod companion;
pub mod interest;
pub mod profile;
pub mod theme;
pub mod wire;

pub use companion::{Companion, CompanionCatalog, CompanionId};
pub use interest::{Interest, TaggedInterest};
pub use profile::{ProfileField, ProfileFields, ProfileRecord};
pub use theme::Theme;
pub use wire::{CompanionPayload, CreateRecordRequest, ProfileSection, UpdateRecordRequest};
