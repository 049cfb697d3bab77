//! Library folder scanning
//!
//! Discovers audio files below a library folder so that the folder and its
//! tracks can be registered in the catalog.

use std::path::Path;

use crate::model::{ CoreError, Track };


/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "m4a", "aac", "opus", "wma", "aiff", "alac",
];


/// Recursively collects the audio files below `root`, sorted by path.
///
/// Directories that cannot be read for lack of permission are skipped.
pub fn scan_folder( root: &Path ) -> Result<Vec<Track>, CoreError> {
    let mut tracks = Vec::new();

    tracing::info!( "Scanning: {:?}", root );
    scan_recursive( root, &mut tracks )?;
    tracks.sort_by( |a, b| a.path.cmp( &b.path ) );

    tracing::info!( "Found {} tracks", tracks.len() );
    Ok( tracks )
}


fn scan_recursive( dir: &Path, tracks: &mut Vec<Track> ) -> Result<(), CoreError> {
    let entries = match std::fs::read_dir( dir ) {
        Ok( e ) => e,
        Err( e ) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            tracing::warn!( "Access denied: {:?}", dir );
            return Ok(());
        }
        Err( e ) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err( CoreError::NotFound( dir.to_path_buf() ) );
        }
        Err( e ) => return Err( CoreError::Io( e ) ),
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_dir() {
            scan_recursive( &path, tracks )?;
        } else if is_audio_file( &path ) {
            tracks.push( Track::from_path( path ) );
        }
    }

    Ok(())
}


/// Checks if a file has a supported audio extension.
pub fn is_audio_file( path: &Path ) -> bool {
    path.extension()
        .and_then( |e| e.to_str() )
        .map( |e| SUPPORTED_EXTENSIONS.contains( &e.to_lowercase().as_str() ) )
        .unwrap_or( false )
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_scan_finds_audio_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let album = dir.path().join( "Artist" ).join( "Album" );
        std::fs::create_dir_all( &album ).unwrap();
        std::fs::write( album.join( "02 Two.FLAC" ), b"" ).unwrap();
        std::fs::write( album.join( "01 One.mp3" ), b"" ).unwrap();
        std::fs::write( album.join( "cover.jpg" ), b"" ).unwrap();

        let tracks = scan_folder( dir.path() ).unwrap();
        let titles: Vec<_> = tracks.iter().map( |t| t.title.as_str() ).collect();
        assert_eq!( titles, vec![ "01 One", "02 Two" ] );
    }


    #[test]
    fn test_scan_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_folder( &dir.path().join( "missing" ) );
        assert!( matches!( result, Err( CoreError::NotFound( _ ) ) ) );
    }


    #[test]
    fn test_is_audio_file() {
        assert!( is_audio_file( Path::new( "a.Mp3" ) ) );
        assert!( !is_audio_file( Path::new( "a.txt" ) ) );
        assert!( !is_audio_file( Path::new( "noext" ) ) );
    }
}
