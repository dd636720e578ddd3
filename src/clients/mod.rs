pub mod captcha_oracle;
pub mod endpoints;
pub mod qidian_client;
pub mod signing;

pub use captcha_oracle::{CaptchaOracle, CaptchaReply, HttpCaptchaOracle, OracleReply};
pub use qidian_client::QidianClient;
pub use signing::{HttpSigningOracle, SignContext, SignKind, SigningOracle};
