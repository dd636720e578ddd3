pub mod captcha_resolver;
pub mod notifier;
pub mod push;

pub use captcha_resolver::{CaptchaResolution, CaptchaResolver};
pub use notifier::{build_summary, Notifier};
pub use push::{build_channel, PushChannel, PushReceipt};
