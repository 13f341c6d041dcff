//! Pipeline entry points for novel downloads.
//!
//! - `discover`: Resolve a name or catalog URL into a [`NovelRecord`]
//! - `run_download`: Discover a novel, then fetch and merge all its chapters
//!
//! [`NovelRecord`]: crate::models::NovelRecord

mod download;
mod partition;
mod run;

pub use download::DownloadCoordinator;
pub use partition::partition;
pub use run::{Target, discover, run_download};
