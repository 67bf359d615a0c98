pub mod health;
pub mod lifecycle;
pub mod mutations;
pub mod records;
pub mod storage;
pub mod triggers;
