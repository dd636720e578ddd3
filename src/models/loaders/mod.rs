pub mod config_loader;

pub use config_loader::{
    load_accounts, load_config_file, load_cookies, parse_config, save_cookies, validate_push,
    LoadedAccount,
};
