//! Configuration module

mod site;

pub use site::BlogConfig;
pub use site::CmsConfig;
pub use site::MissingPostPolicy;
pub use site::ServerConfig;
pub use site::ACCESS_TOKEN_ENV;
