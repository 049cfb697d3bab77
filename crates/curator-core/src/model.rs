//! Collection data model
//!
//! Folders, tracks and the verdicts reported by batch operations.

use std::path::{ Path, PathBuf };

use serde::{ Deserialize, Serialize };
use thiserror::Error;


/// Errors that can occur while talking to collection collaborators.
#[derive( Debug, Error )]
pub enum CoreError {
    #[error( "IO error: {0}" )]
    Io( #[from] std::io::Error ),

    #[error( "Path not found: {0}" )]
    NotFound( PathBuf ),

    #[error( "Storage error: {0}" )]
    Storage( String ),

    #[error( "Trash error: {0}" )]
    Trash( String ),

    #[error( "Serialization error: {0}" )]
    Serialization( String ),

    #[error( "Background task failed: {0}" )]
    Task( String ),
}


/// A library root directory.
///
/// Two folders refer to the same root when their paths are equal; the
/// visibility flag is the only mutable attribute.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct Folder {
    pub path: PathBuf,
    #[serde( default = "default_show" )]
    pub show_in_collection: bool,
}


fn default_show() -> bool {
    true
}


impl Folder {
    /// Creates a visible folder.
    pub fn new( path: impl Into<PathBuf> ) -> Self {
        Self {
            path: path.into(),
            show_in_collection: true,
        }
    }


    /// Returns a copy with the given visibility.
    pub fn with_visibility( mut self, show_in_collection: bool ) -> Self {
        self.show_in_collection = show_in_collection;
        self
    }


    /// Returns true if `other` identifies the same library root.
    pub fn same_root( &self, other: &Folder ) -> bool {
        self.path == other.path
    }
}


/// Catalog metadata of a track.
#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
#[serde( default )]
pub struct TrackMetadata {
    pub artists: Vec<String>,
    pub album_artists: Vec<String>,
    pub genres: Vec<String>,
    pub album: Option<String>,
}


/// A playable catalog entry.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    #[serde( default )]
    pub metadata: TrackMetadata,
}


impl Track {
    /// Creates a track without metadata, titled after the file stem.
    pub fn from_path( path: impl Into<PathBuf> ) -> Self {
        let path = path.into();
        let title = path.file_stem()
            .map( |s| s.to_string_lossy().into_owned() )
            .unwrap_or_default();
        Self { path, title, metadata: TrackMetadata::default() }
    }


    /// Sets the track artists.
    pub fn with_artists<I, S>( mut self, artists: I ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.artists = artists.into_iter().map( Into::into ).collect();
        self
    }


    /// Sets the album artists.
    pub fn with_album_artists<I, S>( mut self, artists: I ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.album_artists = artists.into_iter().map( Into::into ).collect();
        self
    }


    /// Sets the genres.
    pub fn with_genres<I, S>( mut self, genres: I ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.genres = genres.into_iter().map( Into::into ).collect();
        self
    }


    /// Returns true if the track lives below `root`.
    pub fn is_under( &self, root: &Path ) -> bool {
        self.path.starts_with( root )
    }
}


/// Outcome of a batch removal.
///
/// A batch is reported as one verdict; there is no per-item result.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum RemoveTracksResult {
    Success,
    Error,
}


impl RemoveTracksResult {
    pub fn is_success( self ) -> bool {
        self == RemoveTracksResult::Success
    }
}


/// Which artist role to list.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum ArtistScope {
    #[default]
    All,
    Track,
    Album,
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_folder_identity_is_path() {
        let a = Folder::new( "/music" );
        let b = Folder::new( "/music" ).with_visibility( false );
        assert!( a.same_root( &b ) );
        assert_ne!( a, b );
    }


    #[test]
    fn test_track_title_from_stem() {
        let track = Track::from_path( "/music/Artist/01 Song.flac" );
        assert_eq!( track.title, "01 Song" );
        assert!( track.is_under( Path::new( "/music" ) ) );
        assert!( !track.is_under( Path::new( "/other" ) ) );
    }


    #[test]
    fn test_folder_visibility_defaults_to_shown() {
        let folder: Folder = serde_json::from_str( r#"{ "path": "/music" }"# ).unwrap();
        assert!( folder.show_in_collection );
    }
}
