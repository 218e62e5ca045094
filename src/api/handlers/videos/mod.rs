pub mod list;
pub mod types;
pub mod upload;
pub mod watch;

pub use types::*;

pub use list::get_videos;
pub use upload::upload_video;
pub use watch::watch_video;
