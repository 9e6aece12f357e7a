//! API endpoint modules.

mod certificates;
mod history;
mod users;

pub use certificates::CertificatesApi;
pub use history::HistoryApi;
pub use users::UsersApi;
