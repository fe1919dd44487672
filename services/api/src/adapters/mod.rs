pub mod classifier;
pub mod db;
pub mod notifier;

pub use classifier::{KeywordCategoryAdapter, OpenAiCategoryAdapter};
pub use db::DbAdapter;
pub use notifier::LogNotificationAdapter;
