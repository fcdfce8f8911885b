pub mod acquisition;
pub mod calculators;
pub mod returns;
pub mod sensitivity;

/// What every command hands back to `main` for formatting.
pub type CommandResult = Result<serde_json::Value, Box<dyn std::error::Error>>;
