pub mod account;
pub mod loaders;
pub mod risk;
pub mod task;

pub use account::{AccountSession, FileConfig, GlobalSettings, PushConfig, UserConfig};
pub use loaders::{load_accounts, load_config_file, LoadedAccount};
pub use risk::{ApiResponse, RiskDescriptor};
pub use task::{TaskKind, TaskOutcome};
