//! Access-control bridge configuration object and helpers.
mod loading;
mod object;
mod registration;

pub use self::loading::load;
pub use self::loading::Error;
pub use self::object::AuthConf;
pub use self::object::Conf;
pub use self::registration::RegistrationConf;
pub use self::registration::ZookeeperConf;
