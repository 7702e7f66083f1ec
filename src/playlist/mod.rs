/*!
 * Master playlist model and rendition selection.
 */

pub mod filter;
pub mod master;

pub use filter::{select, AllowedValue, FilterRules, LANGUAGE_ATTRIBUTE};
pub use master::{MasterPlaylist, MediaType, PlaylistEntry, SubtitlesType};
