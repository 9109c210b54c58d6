pub mod http;
pub mod remote;
pub mod traits;
