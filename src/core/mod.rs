pub mod db;
pub mod errors;
pub mod flash;
pub mod helpers;
pub mod pagination;
pub mod static_server;
