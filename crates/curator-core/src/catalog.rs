//! Catalog store contract
//!
//! The catalog persists library folders and tracks. Bulk operations are
//! all-or-nothing: either every item of a batch is applied or none is.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{ Deserialize, Serialize };

use crate::model::{ CoreError, Folder, RemoveTracksResult, Track };


/// Backing store for folders and tracks.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Lists all registered folders.
    async fn folders( &self ) -> Result<Vec<Folder>, CoreError>;

    /// Lists all tracks.
    async fn tracks( &self ) -> Result<Vec<Track>, CoreError>;

    /// Registers a folder together with the tracks found below it.
    async fn add_folder( &self, folder: Folder, tracks: Vec<Track> ) -> Result<(), CoreError>;

    /// Persists the visibility of a batch of known folders.
    async fn update_folders( &self, folders: &[Folder] ) -> Result<(), CoreError>;

    /// Removes a batch of tracks, all or nothing.
    async fn remove_tracks( &self, tracks: &[Track] ) -> RemoveTracksResult;

    async fn all_genre_names( &self ) -> Result<Vec<String>, CoreError>;

    async fn all_track_artist_names( &self ) -> Result<Vec<String>, CoreError>;

    async fn all_album_artist_names( &self ) -> Result<Vec<String>, CoreError>;
}


/// Plain catalog contents.
#[derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize )]
#[serde( default )]
pub struct CatalogState {
    pub folders: Vec<Folder>,
    pub tracks: Vec<Track>,
}


impl CatalogState {
    /// Replaces or appends a folder and merges its tracks by path.
    pub fn add_folder( &mut self, folder: Folder, tracks: Vec<Track> ) {
        match self.folders.iter_mut().find( |f| f.same_root( &folder ) ) {
            Some( existing ) => *existing = folder,
            None => self.folders.push( folder ),
        }

        for track in tracks {
            match self.tracks.iter_mut().find( |t| t.path == track.path ) {
                Some( existing ) => *existing = track,
                None => self.tracks.push( track ),
            }
        }
    }


    /// Applies visibility changes, failing without any change if a folder is unknown.
    pub fn update_folders( &mut self, folders: &[Folder] ) -> Result<(), CoreError> {
        if let Some( unknown ) = folders.iter()
            .find( |f| !self.folders.iter().any( |known| known.same_root( f ) ) )
        {
            return Err( CoreError::NotFound( unknown.path.clone() ) );
        }

        for folder in folders {
            if let Some( existing ) = self.folders.iter_mut().find( |f| f.same_root( folder ) ) {
                existing.show_in_collection = folder.show_in_collection;
            }
        }

        Ok(())
    }


    /// Removes the given tracks, failing without any change if one is missing.
    pub fn remove_tracks( &mut self, tracks: &[Track] ) -> RemoveTracksResult {
        let all_present = tracks.iter()
            .all( |track| self.tracks.iter().any( |t| t.path == track.path ) );

        if !all_present {
            return RemoveTracksResult::Error;
        }

        self.tracks.retain( |t| !tracks.iter().any( |removed| removed.path == t.path ) );
        RemoveTracksResult::Success
    }


    /// Tracks that are not below a hidden folder.
    pub fn visible_tracks( &self ) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter( move |track| {
            !self.folders.iter()
                .any( |f| !f.show_in_collection && track.is_under( &f.path ) )
        })
    }


    /// Collects non-blank names from the visible tracks, in catalog order.
    pub fn names<F>( &self, select: F ) -> Vec<String>
    where
        F: Fn( &Track ) -> &[String],
    {
        self.visible_tracks()
            .flat_map( |t| select( t ).iter() )
            .filter( |name| !name.trim().is_empty() )
            .cloned()
            .collect()
    }
}


/// In-memory catalog.
#[derive( Debug, Default )]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}


impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }


    /// Creates a catalog holding the given contents.
    pub fn with_state( state: CatalogState ) -> Self {
        Self { state: RwLock::new( state ) }
    }


    /// Returns a copy of the current contents.
    pub fn snapshot( &self ) -> Result<CatalogState, CoreError> {
        self.read( |state| state.clone() )
    }


    fn read<T>( &self, f: impl FnOnce( &CatalogState ) -> T ) -> Result<T, CoreError> {
        let state = self.state.read()
            .map_err( |_| CoreError::Storage( "catalog lock poisoned".into() ) )?;
        Ok( f( &state ) )
    }


    fn write<T>( &self, f: impl FnOnce( &mut CatalogState ) -> T ) -> Result<T, CoreError> {
        let mut state = self.state.write()
            .map_err( |_| CoreError::Storage( "catalog lock poisoned".into() ) )?;
        Ok( f( &mut state ) )
    }
}


#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn folders( &self ) -> Result<Vec<Folder>, CoreError> {
        self.read( |state| state.folders.clone() )
    }


    async fn tracks( &self ) -> Result<Vec<Track>, CoreError> {
        self.read( |state| state.tracks.clone() )
    }


    async fn add_folder( &self, folder: Folder, tracks: Vec<Track> ) -> Result<(), CoreError> {
        self.write( |state| state.add_folder( folder, tracks ) )
    }


    async fn update_folders( &self, folders: &[Folder] ) -> Result<(), CoreError> {
        self.write( |state| state.update_folders( folders ) )?
    }


    async fn remove_tracks( &self, tracks: &[Track] ) -> RemoveTracksResult {
        match self.write( |state| state.remove_tracks( tracks ) ) {
            Ok( result ) => result,
            Err( e ) => {
                tracing::error!( "Failed to remove tracks: {}", e );
                RemoveTracksResult::Error
            }
        }
    }


    async fn all_genre_names( &self ) -> Result<Vec<String>, CoreError> {
        self.read( |state| state.names( |t| t.metadata.genres.as_slice() ) )
    }


    async fn all_track_artist_names( &self ) -> Result<Vec<String>, CoreError> {
        self.read( |state| state.names( |t| t.metadata.artists.as_slice() ) )
    }


    async fn all_album_artist_names( &self ) -> Result<Vec<String>, CoreError> {
        self.read( |state| state.names( |t| t.metadata.album_artists.as_slice() ) )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    fn catalog() -> MemoryCatalog {
        let mut state = CatalogState::default();
        state.add_folder( Folder::new( "/music" ), vec![
            Track::from_path( "/music/a.mp3" ).with_artists( ["A"] ).with_genres( ["Rock"] ),
            Track::from_path( "/music/b.mp3" ).with_artists( ["B", " "] ),
        ]);
        state.add_folder( Folder::new( "/podcasts" ), vec![
            Track::from_path( "/podcasts/c.mp3" ).with_artists( ["C"] ),
        ]);
        MemoryCatalog::with_state( state )
    }


    #[tokio::test]
    async fn test_remove_tracks_is_all_or_nothing() {
        let catalog = catalog();
        let batch = vec![
            Track::from_path( "/music/a.mp3" ),
            Track::from_path( "/music/missing.mp3" ),
        ];

        assert_eq!( catalog.remove_tracks( &batch ).await, RemoveTracksResult::Error );
        assert_eq!( catalog.tracks().await.unwrap().len(), 3 );

        let batch = vec![ Track::from_path( "/music/a.mp3" ) ];
        assert_eq!( catalog.remove_tracks( &batch ).await, RemoveTracksResult::Success );
        assert_eq!( catalog.tracks().await.unwrap().len(), 2 );
    }


    #[tokio::test]
    async fn test_update_unknown_folder_changes_nothing() {
        let catalog = catalog();
        let batch = vec![
            Folder::new( "/music" ).with_visibility( false ),
            Folder::new( "/nowhere" ),
        ];

        assert!( matches!( catalog.update_folders( &batch ).await, Err( CoreError::NotFound( _ ) ) ) );
        assert!( catalog.folders().await.unwrap().iter().all( |f| f.show_in_collection ) );
    }


    #[tokio::test]
    async fn test_hidden_folder_excludes_names() {
        let catalog = catalog();
        assert_eq!( catalog.all_track_artist_names().await.unwrap(), vec![ "A", "B", "C" ] );

        catalog.update_folders( &[ Folder::new( "/podcasts" ).with_visibility( false ) ] ).await.unwrap();
        assert_eq!( catalog.all_track_artist_names().await.unwrap(), vec![ "A", "B" ] );
        assert_eq!( catalog.all_genre_names().await.unwrap(), vec![ "Rock" ] );
    }
}
