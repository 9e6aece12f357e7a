mod api;
mod audit;
mod certificate;
mod user;

pub use api::*;
pub use audit::*;
pub use certificate::*;
pub use user::*;
