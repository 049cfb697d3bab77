//! JSON file catalog
//!
//! Keeps the whole catalog in one JSON file. Every change is applied to a
//! copy, written to a temporary file and renamed over the old one; the
//! in-memory state only moves on once the file is safely on disk.

use std::path::{ Path, PathBuf };

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use curator_core::{ CatalogState, CatalogStore, CoreError, Folder, RemoveTracksResult, Track };


pub struct JsonCatalog {
    path: PathBuf,
    state: Mutex<CatalogState>,
}


impl JsonCatalog {
    /// Opens the catalog at `path`, starting empty if the file does not exist.
    pub async fn open( path: PathBuf ) -> Result<Self, CoreError> {
        let state = match fs::read_to_string( &path ).await {
            Ok( contents ) => serde_json::from_str( &contents )
                .map_err( |e| CoreError::Serialization( format!( "{}: {}", path.display(), e ) ) )?,
            Err( e ) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!( "No catalog at {:?}, starting empty", path );
                CatalogState::default()
            }
            Err( e ) => return Err( CoreError::Io( e ) ),
        };

        Ok( Self { path, state: Mutex::new( state ) } )
    }


    pub fn path( &self ) -> &Path {
        &self.path
    }


    /// Applies `change` to a copy of the state and commits it once saved.
    async fn commit<T>(
        &self,
        change: impl FnOnce( &mut CatalogState ) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let value = change( &mut next )?;

        self.save( &next ).await?;
        *state = next;
        Ok( value )
    }


    async fn save( &self, state: &CatalogState ) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty( state )
            .map_err( |e| CoreError::Serialization( e.to_string() ) )?;

        if let Some( parent ) = self.path.parent() {
            fs::create_dir_all( parent ).await?;
        }

        let tmp = self.path.with_extension( "json.tmp" );
        fs::write( &tmp, json ).await?;
        fs::rename( &tmp, &self.path ).await?;
        tracing::debug!( "Saved catalog to {:?}", self.path );
        Ok(())
    }


    async fn names( &self, select: fn( &Track ) -> &[String] ) -> Vec<String> {
        self.state.lock().await.names( select )
    }
}


#[async_trait]
impl CatalogStore for JsonCatalog {
    async fn folders( &self ) -> Result<Vec<Folder>, CoreError> {
        Ok( self.state.lock().await.folders.clone() )
    }


    async fn tracks( &self ) -> Result<Vec<Track>, CoreError> {
        Ok( self.state.lock().await.tracks.clone() )
    }


    async fn add_folder( &self, folder: Folder, tracks: Vec<Track> ) -> Result<(), CoreError> {
        self.commit( |state| {
            state.add_folder( folder, tracks );
            Ok(())
        }).await
    }


    async fn update_folders( &self, folders: &[Folder] ) -> Result<(), CoreError> {
        self.commit( |state| state.update_folders( folders ) ).await
    }


    async fn remove_tracks( &self, tracks: &[Track] ) -> RemoveTracksResult {
        let result = self.commit( |state| match state.remove_tracks( tracks ) {
            RemoveTracksResult::Success => Ok(()),
            RemoveTracksResult::Error => Err( CoreError::Storage( "some tracks are not in the catalog".into() ) ),
        }).await;

        match result {
            Ok( () ) => RemoveTracksResult::Success,
            Err( e ) => {
                tracing::error!( "Failed to remove tracks: {}", e );
                RemoveTracksResult::Error
            }
        }
    }


    async fn all_genre_names( &self ) -> Result<Vec<String>, CoreError> {
        Ok( self.names( |t| t.metadata.genres.as_slice() ).await )
    }


    async fn all_track_artist_names( &self ) -> Result<Vec<String>, CoreError> {
        Ok( self.names( |t| t.metadata.artists.as_slice() ).await )
    }


    async fn all_album_artist_names( &self ) -> Result<Vec<String>, CoreError> {
        Ok( self.names( |t| t.metadata.album_artists.as_slice() ).await )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[tokio::test]
    async fn test_changes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "catalog.json" );

        let catalog = JsonCatalog::open( path.clone() ).await.unwrap();
        catalog.add_folder( Folder::new( "/m" ), vec![
            Track::from_path( "/m/a.mp3" ).with_genres( ["Jazz"] ),
            Track::from_path( "/m/b.mp3" ),
        ]).await.unwrap();
        catalog.update_folders( &[ Folder::new( "/m" ).with_visibility( false ) ] ).await.unwrap();

        let reopened = JsonCatalog::open( path ).await.unwrap();
        assert_eq!( reopened.tracks().await.unwrap().len(), 2 );
        assert!( !reopened.folders().await.unwrap()[ 0 ].show_in_collection );
    }


    #[tokio::test]
    async fn test_failed_removal_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "catalog.json" );

        let catalog = JsonCatalog::open( path.clone() ).await.unwrap();
        catalog.add_folder( Folder::new( "/m" ), vec![ Track::from_path( "/m/a.mp3" ) ] ).await.unwrap();
        let before = std::fs::read_to_string( &path ).unwrap();

        let batch = vec![ Track::from_path( "/m/a.mp3" ), Track::from_path( "/m/x.mp3" ) ];
        assert_eq!( catalog.remove_tracks( &batch ).await, RemoveTracksResult::Error );
        assert_eq!( std::fs::read_to_string( &path ).unwrap(), before );
        assert_eq!( catalog.tracks().await.unwrap().len(), 1 );

        assert_eq!( catalog.remove_tracks( &batch[ ..1 ] ).await, RemoveTracksResult::Success );
        assert!( JsonCatalog::open( path ).await.unwrap().tracks().await.unwrap().is_empty() );
    }


    #[tokio::test]
    async fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "catalog.json" );
        std::fs::write( &path, "{" ).unwrap();

        assert!( matches!( JsonCatalog::open( path ).await, Err( CoreError::Serialization( _ ) ) ) );
    }
}
