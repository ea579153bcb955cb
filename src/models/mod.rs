pub mod entry;
pub mod enums;
pub mod identity;

pub use entry::SymptomEntry;
pub use enums::Severity;
pub use identity::Identity;
