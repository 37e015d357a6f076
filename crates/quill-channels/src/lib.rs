pub mod base;
pub mod manager;
pub mod web;
pub mod web_assets;

pub use base::Channel;
pub use manager::ChannelManager;
pub use web::WebChannel;
