pub mod feeds;
pub mod followers;
pub mod images;
pub mod likes;
pub mod views;
