//! Localized string lookup
//!
//! The core only needs a handful of labels: the "Unknown" sentinels and the
//! smart playlist defaults.

/// Key of the label used for the unknown artist.
pub const UNKNOWN_ARTIST: &str = "unknown_artist";

/// Key of the label used for the unknown genre.
pub const UNKNOWN_GENRE: &str = "unknown_genre";

pub const NEW_PLAYLIST: &str = "new_playlist";
pub const SONGS: &str = "songs";
pub const GIGABYTES_SHORT: &str = "gigabytes_short";
pub const MEGABYTES_SHORT: &str = "megabytes_short";
pub const MINUTES: &str = "minutes";


/// Resolves a resource key to a display string.
pub trait Strings: Send + Sync {
    fn get( &self, key: &str ) -> String;
}


/// Built-in English labels.
#[derive( Debug, Clone, Copy, Default )]
pub struct DefaultStrings;


impl Strings for DefaultStrings {
    fn get( &self, key: &str ) -> String {
        let label = match key {
            UNKNOWN_ARTIST => "Unknown Artist",
            UNKNOWN_GENRE => "Unknown Genre",
            NEW_PLAYLIST => "New playlist",
            SONGS => "songs",
            GIGABYTES_SHORT => "GB",
            MEGABYTES_SHORT => "MB",
            MINUTES => "minutes",
            // Unknown keys are shown as-is
            other => other,
        };
        label.to_string()
    }
}
