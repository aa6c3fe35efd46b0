pub mod feed;
pub mod live;
