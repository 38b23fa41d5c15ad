//! HTTP request handlers organized by functionality.

pub mod search;
pub mod torrents;

pub use search::{SearchQuery, search_torrents};
pub use torrents::{
    SwarmUpdate, delete_torrent, download_torrent, torrent_details, update_swarm, upload_torrent,
};
