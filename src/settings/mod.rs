pub mod manager;


pub use manager::{ApiSettings, ModelSettings, Settings, SettingsManager, TokenBudgets};
