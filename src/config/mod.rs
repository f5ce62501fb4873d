mod env_vars;
mod targets;
mod upload_config;

pub use env_vars::expand_env_vars;
pub use targets::Target;
pub use upload_config::{InputSource, UploadConfig, UploadPlan};
