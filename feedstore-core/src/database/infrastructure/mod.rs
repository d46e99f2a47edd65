pub mod cache;
#[cfg(feature = "postgres")]
pub mod postgres;
