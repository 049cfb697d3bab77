//! Reversible file deletion
//!
//! Files are never unlinked. They are moved into a trash directory next to
//! a small `.origin` sidecar recording where they came from, so they can be
//! put back later.

use std::io::ErrorKind;
use std::path::{ Path, PathBuf };

use async_trait::async_trait;
use tokio::fs;

use crate::model::CoreError;


const ORIGIN_EXTENSION: &str = "origin";


/// Moves files to a reversible trash location.
#[async_trait]
pub trait Trash: Send + Sync {
    async fn send_to_trash( &self, path: &Path ) -> Result<(), CoreError>;
}


/// Trash backed by a plain directory.
#[derive( Debug, Clone )]
pub struct TrashDir {
    root: PathBuf,
}


impl TrashDir {
    pub fn new( root: impl Into<PathBuf> ) -> Self {
        Self { root: root.into() }
    }


    pub fn root( &self ) -> &Path {
        &self.root
    }


    /// Moves `path` into the trash and returns its new location.
    pub async fn trash( &self, path: &Path ) -> Result<PathBuf, CoreError> {
        let name = path.file_name()
            .ok_or_else( || CoreError::Trash( format!( "Not a file: {}", path.display() ) ) )?;

        if !fs::try_exists( path ).await? {
            return Err( CoreError::NotFound( path.to_path_buf() ) );
        }

        fs::create_dir_all( &self.root ).await?;
        let target = self.free_target( Path::new( name ) ).await?;

        move_file( path, &target ).await?;
        fs::write( origin_path( &target ), path.to_string_lossy().into_owned() ).await?;

        tracing::debug!( "Trashed {:?} as {:?}", path, target );
        Ok( target )
    }


    /// Moves a trashed file back to where it came from.
    pub async fn restore( &self, trashed: &Path ) -> Result<PathBuf, CoreError> {
        let sidecar = origin_path( trashed );
        let original = match fs::read_to_string( &sidecar ).await {
            Ok( s ) => PathBuf::from( s ),
            Err( e ) if e.kind() == ErrorKind::NotFound => {
                return Err( CoreError::NotFound( sidecar ) );
            }
            Err( e ) => return Err( CoreError::Io( e ) ),
        };

        if fs::try_exists( &original ).await? {
            return Err( CoreError::Trash( format!( "Restore target exists: {}", original.display() ) ) );
        }

        if let Some( parent ) = original.parent() {
            fs::create_dir_all( parent ).await?;
        }

        move_file( trashed, &original ).await?;
        fs::remove_file( &sidecar ).await?;

        tracing::info!( "Restored {:?}", original );
        Ok( original )
    }


    /// Picks `name`, or `stem (n).ext` if that is taken.
    async fn free_target( &self, name: &Path ) -> Result<PathBuf, CoreError> {
        let candidate = self.root.join( name );
        if !fs::try_exists( &candidate ).await? {
            return Ok( candidate );
        }

        let stem = name.file_stem().map( |s| s.to_string_lossy().into_owned() ).unwrap_or_default();
        let ext = name.extension().map( |e| e.to_string_lossy().into_owned() );

        for n in 2.. {
            let file_name = match &ext {
                Some( ext ) => format!( "{} ({}).{}", stem, n, ext ),
                None => format!( "{} ({})", stem, n ),
            };
            let candidate = self.root.join( file_name );
            if !fs::try_exists( &candidate ).await? {
                return Ok( candidate );
            }
        }

        unreachable!( "unbounded range" )
    }
}


#[async_trait]
impl Trash for TrashDir {
    async fn send_to_trash( &self, path: &Path ) -> Result<(), CoreError> {
        self.trash( path ).await.map( |_| () )
    }
}


fn origin_path( trashed: &Path ) -> PathBuf {
    let mut name = trashed.as_os_str().to_owned();
    name.push( "." );
    name.push( ORIGIN_EXTENSION );
    PathBuf::from( name )
}


/// Renames, falling back to copy and delete when renaming is not possible
/// (e.g. the trash lives on another filesystem).
async fn move_file( from: &Path, to: &Path ) -> Result<(), CoreError> {
    let rename_err = match fs::rename( from, to ).await {
        Ok( () ) => return Ok(()),
        Err( e ) => e,
    };

    if fs::copy( from, to ).await.is_err() {
        return Err( CoreError::Io( rename_err ) );
    }
    fs::remove_file( from ).await?;
    Ok(())
}


#[cfg( test )]
mod tests {
    use super::*;


    #[tokio::test]
    async fn test_trash_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join( "music" ).join( "song.mp3" );
        std::fs::create_dir_all( song.parent().unwrap() ).unwrap();
        std::fs::write( &song, b"data" ).unwrap();

        let trash = TrashDir::new( dir.path().join( "trash" ) );
        let trashed = trash.trash( &song ).await.unwrap();

        assert!( !song.exists() );
        assert!( trashed.exists() );

        let restored = trash.restore( &trashed ).await.unwrap();
        assert_eq!( restored, song );
        assert_eq!( std::fs::read( &song ).unwrap(), b"data" );
        assert!( !origin_path( &trashed ).exists() );
    }


    #[tokio::test]
    async fn test_name_collision_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let trash = TrashDir::new( dir.path().join( "trash" ) );

        for sub in [ "a", "b" ] {
            let song = dir.path().join( sub ).join( "song.mp3" );
            std::fs::create_dir_all( song.parent().unwrap() ).unwrap();
            std::fs::write( &song, sub ).unwrap();
            trash.send_to_trash( &song ).await.unwrap();
        }

        assert!( dir.path().join( "trash" ).join( "song.mp3" ).exists() );
        assert!( dir.path().join( "trash" ).join( "song (2).mp3" ).exists() );
    }


    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let trash = TrashDir::new( dir.path().join( "trash" ) );
        let result = trash.send_to_trash( &dir.path().join( "gone.mp3" ) ).await;
        assert!( matches!( result, Err( CoreError::NotFound( _ ) ) ) );
    }
}
