//! Application settings management
//!
//! Handles the persistent settings: where the catalog, trash and playlists
//! live, and how long folder edits are debounced.

use std::fs;
use std::path::{ Path, PathBuf };
use std::time::Duration;

use serde::{ Deserialize, Serialize };


/// Application settings.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct Settings {
    /// Quiet period before folder visibility edits are saved
    pub flush_delay_ms: u64,

    /// Catalog file (defaults to the data directory)
    pub catalog_path: Option<PathBuf>,

    /// Trash directory (defaults to the data directory)
    pub trash_dir: Option<PathBuf>,

    /// Directory holding saved playlists
    pub playlist_dir: Option<PathBuf>,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            flush_delay_ms: 2000,
            catalog_path: None,
            trash_dir: None,
            playlist_dir: None,
        }
    }
}


impl Settings {
    /// Returns the path to the settings file.
    fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map( |p| p.join( "curator" ).join( "settings.json" ) )
    }


    fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else( std::env::temp_dir )
            .join( "curator" )
    }


    /// Loads settings from disk, or returns defaults if not found.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some( path ) => Self::load_from( &path ),
            None => Self::default(),
        }
    }


    /// Loads settings from `path`; missing or invalid files yield defaults.
    pub fn load_from( path: &Path ) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string( path ) {
            Ok( contents ) => {
                serde_json::from_str( &contents ).unwrap_or_else( |e| {
                    tracing::warn!( "Invalid settings in {:?}: {}", path, e );
                    Self::default()
                })
            }
            Err( e ) => {
                tracing::warn!( "Failed to read settings: {}", e );
                Self::default()
            }
        }
    }


    pub fn flush_delay( &self ) -> Duration {
        Duration::from_millis( self.flush_delay_ms )
    }


    pub fn catalog_path( &self ) -> PathBuf {
        self.catalog_path.clone().unwrap_or_else( || Self::data_dir().join( "catalog.json" ) )
    }


    pub fn trash_dir( &self ) -> PathBuf {
        self.trash_dir.clone().unwrap_or_else( || Self::data_dir().join( "trash" ) )
    }


    pub fn playlist_dir( &self ) -> PathBuf {
        self.playlist_dir.clone().unwrap_or_else( || Self::data_dir().join( "playlists" ) )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from( &dir.path().join( "settings.json" ) );
        assert_eq!( settings, Settings::default() );
        assert_eq!( settings.flush_delay(), Duration::from_millis( 2000 ) );
    }


    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, r#"{ "trash_dir": "/tmp/bin" }"# ).unwrap();

        let settings = Settings::load_from( &path );
        assert_eq!( settings.flush_delay_ms, 2000 );
        assert_eq!( settings.trash_dir(), PathBuf::from( "/tmp/bin" ) );
    }


    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "settings.json" );
        fs::write( &path, "not json" ).unwrap();
        assert_eq!( Settings::load_from( &path ), Settings::default() );
    }
}
