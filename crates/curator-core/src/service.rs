//! Collection service
//!
//! Single entry point for the application shell: wires the catalog,
//! playback, trash and strings collaborators into the folder marker, the
//! removal workflow and the artist/genre listings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::catalog::CatalogStore;
use crate::entity::{ self, Entity };
use crate::events::{ CollectionChanged, CollectionEvents };
use crate::folders::{ FlushOutcome, FolderMarker, DEFAULT_FLUSH_DELAY };
use crate::model::{ ArtistScope, CoreError, Folder, RemoveTracksResult, Track };
use crate::playback::PlaybackControl;
use crate::removal::{ RemovalReport, TrackRemover };
use crate::scan;
use crate::strings::{ self, Strings };
use crate::trash::Trash;


/// Collection maintenance and browsing.
pub struct CollectionService {
    store: Arc<dyn CatalogStore>,
    strings: Arc<dyn Strings>,
    events: CollectionEvents,
    marker: FolderMarker,
    remover: TrackRemover,
}


impl CollectionService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        playback: Arc<dyn PlaybackControl>,
        trash: Arc<dyn Trash>,
        strings: Arc<dyn Strings>,
    ) -> Self {
        Self::with_flush_delay( store, playback, trash, strings, DEFAULT_FLUSH_DELAY )
    }


    /// Like [`new`](Self::new) with a custom folder flush delay.
    pub fn with_flush_delay(
        store: Arc<dyn CatalogStore>,
        playback: Arc<dyn PlaybackControl>,
        trash: Arc<dyn Trash>,
        strings: Arc<dyn Strings>,
        flush_delay: Duration,
    ) -> Self {
        let events = CollectionEvents::new();
        let marker = FolderMarker::with_delay( Arc::clone( &store ), events.clone(), flush_delay );
        let remover = TrackRemover::new( Arc::clone( &store ), playback, trash, events.clone() );

        Self { store, strings, events, marker, remover }
    }


    /// Subscribes to collection change notifications.
    pub fn subscribe( &self ) -> broadcast::Receiver<CollectionChanged> {
        self.events.subscribe()
    }


    pub fn strings( &self ) -> &dyn Strings {
        self.strings.as_ref()
    }


    pub async fn folders( &self ) -> Result<Vec<Folder>, CoreError> {
        self.store.folders().await
    }


    pub async fn tracks( &self ) -> Result<Vec<Track>, CoreError> {
        self.store.tracks().await
    }


    /// Scans `path` and registers it with its tracks. Returns the track count.
    pub async fn add_folder( &self, path: PathBuf ) -> Result<usize, CoreError> {
        let root = path.clone();
        let tracks = tokio::task::spawn_blocking( move || scan::scan_folder( &root ) )
            .await
            .map_err( |e| CoreError::Task( e.to_string() ) )??;

        let count = tracks.len();
        self.store.add_folder( Folder::new( path ), tracks ).await?;
        self.events.notify();
        Ok( count )
    }


    /// Queues a visibility change; see [`FolderMarker::mark`].
    pub async fn mark_folder( &self, folder: Folder ) {
        self.marker.mark( folder ).await;
    }


    /// Writes pending folder edits immediately.
    pub async fn flush_folders( &self ) -> FlushOutcome {
        self.marker.flush().await
    }


    pub fn pending_folders( &self ) -> Vec<Folder> {
        self.marker.pending()
    }


    pub async fn remove_tracks_from_collection( &self, tracks: &[Track] ) -> RemoveTracksResult {
        self.remover.remove_from_collection( tracks ).await
    }


    pub async fn remove_tracks_from_disk( &self, tracks: &[Track] ) -> RemoveTracksResult {
        self.remover.remove_from_disk( tracks ).await
    }


    pub async fn remove_tracks_from_disk_with_report( &self, tracks: &[Track] ) -> RemovalReport {
        self.remover.remove_from_disk_with_report( tracks ).await
    }


    /// All genres, `#` group first, then by name.
    pub async fn all_genres( &self ) -> Result<Vec<Entity>, CoreError> {
        let names = self.store.all_genre_names().await?;
        self.materialize( names, strings::UNKNOWN_GENRE ).await
    }


    /// All artists of the given role, `#` group first, then by name.
    ///
    /// [`ArtistScope::All`] merges track and album artists before
    /// deduplicating, so an artist in both roles is listed once.
    pub async fn all_artists( &self, scope: ArtistScope ) -> Result<Vec<Entity>, CoreError> {
        let names = match scope {
            ArtistScope::All => {
                let mut names = self.store.all_track_artist_names().await?;
                names.extend( self.store.all_album_artist_names().await? );
                names
            }
            ArtistScope::Track => self.store.all_track_artist_names().await?,
            ArtistScope::Album => self.store.all_album_artist_names().await?,
        };

        self.materialize( names, strings::UNKNOWN_ARTIST ).await
    }


    async fn materialize( &self, names: Vec<String>, unknown_key: &str ) -> Result<Vec<Entity>, CoreError> {
        let unknown = self.strings.get( unknown_key );

        tokio::task::spawn_blocking( move || {
            let mut entities = entity::distinct( &names, &unknown );
            entity::order_for_display( &mut entities );
            entities
        })
        .await
        .map_err( |e| CoreError::Task( e.to_string() ) )
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use crate::catalog::{ CatalogState, MemoryCatalog };
    use crate::playback::NowPlaying;
    use crate::strings::DefaultStrings;
    use crate::trash::TrashDir;


    fn service( state: CatalogState, trash_root: PathBuf ) -> ( Arc<MemoryCatalog>, CollectionService ) {
        let catalog = Arc::new( MemoryCatalog::with_state( state ) );
        let service = CollectionService::new(
            catalog.clone(),
            Arc::new( NowPlaying::new() ),
            Arc::new( TrashDir::new( trash_root ) ),
            Arc::new( DefaultStrings ),
        );
        ( catalog, service )
    }


    fn names( entities: &[Entity] ) -> Vec<&str> {
        entities.iter().map( Entity::name ).collect()
    }


    fn artists_state() -> CatalogState {
        let mut state = CatalogState::default();
        state.add_folder( Folder::new( "/m" ), vec![
            Track::from_path( "/m/1.mp3" ).with_artists( ["A"] ).with_album_artists( ["B"] ),
            Track::from_path( "/m/2.mp3" ).with_artists( ["B"] ).with_album_artists( ["C"] ),
        ]);
        state
    }


    #[tokio::test]
    async fn test_all_artists_merges_roles() {
        let ( _catalog, service ) = service( artists_state(), PathBuf::from( "/unused" ) );

        let all = service.all_artists( ArtistScope::All ).await.unwrap();
        assert_eq!( names( &all ), vec![ "A", "B", "C", "Unknown Artist" ] );

        let track = service.all_artists( ArtistScope::Track ).await.unwrap();
        assert_eq!( names( &track ), vec![ "A", "B", "Unknown Artist" ] );

        let album = service.all_artists( ArtistScope::Album ).await.unwrap();
        assert_eq!( names( &album ), vec![ "B", "C", "Unknown Artist" ] );
    }


    #[tokio::test]
    async fn test_all_genres_sorted_with_hash_group_first() {
        let mut state = CatalogState::default();
        state.add_folder( Folder::new( "/m" ), vec![
            Track::from_path( "/m/1.mp3" ).with_genres( [ "Rock", "80s" ] ),
            Track::from_path( "/m/2.mp3" ).with_genres( [ "Ambient", "Rock", "(Other)" ] ),
        ]);
        let ( _catalog, service ) = service( state, PathBuf::from( "/unused" ) );

        let genres = service.all_genres().await.unwrap();
        assert_eq!( names( &genres ), vec![ "(Other)", "80s", "Ambient", "Rock", "Unknown Genre" ] );
        assert_eq!( genres[ 2 ].header(), 'A' );
    }


    #[tokio::test( start_paused = true )]
    async fn test_hidden_folder_disappears_after_flush() {
        let ( catalog, service ) = service( artists_state(), PathBuf::from( "/unused" ) );
        let mut rx = service.subscribe();

        service.mark_folder( Folder::new( "/m" ).with_visibility( false ) ).await;
        assert_eq!( service.pending_folders().len(), 1 );

        tokio::time::sleep( DEFAULT_FLUSH_DELAY + Duration::from_millis( 100 ) ).await;

        assert!( rx.try_recv().is_ok() );
        assert!( !catalog.snapshot().unwrap().folders[ 0 ].show_in_collection );
        let all = service.all_artists( ArtistScope::All ).await.unwrap();
        assert_eq!( names( &all ), vec![ "Unknown Artist" ] );
    }


    #[tokio::test]
    async fn test_add_folder_and_remove_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let music = dir.path().join( "music" );
        std::fs::create_dir_all( &music ).unwrap();
        std::fs::write( music.join( "one.mp3" ), b"1" ).unwrap();
        std::fs::write( music.join( "two.ogg" ), b"2" ).unwrap();

        let ( catalog, service ) = service( CatalogState::default(), dir.path().join( "trash" ) );
        let mut rx = service.subscribe();

        assert_eq!( service.add_folder( music.clone() ).await.unwrap(), 2 );
        assert!( rx.try_recv().is_ok() );

        let tracks = service.tracks().await.unwrap();
        let result = service.remove_tracks_from_disk( &tracks[ ..1 ] ).await;

        assert_eq!( result, RemoveTracksResult::Success );
        assert!( !music.join( "one.mp3" ).exists() );
        assert!( dir.path().join( "trash" ).join( "one.mp3" ).exists() );
        assert_eq!( catalog.snapshot().unwrap().tracks.len(), 1 );
        assert!( rx.try_recv().is_ok() );
    }


    #[tokio::test]
    async fn test_missing_file_degrades_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = CatalogState::default();
        state.add_folder( Folder::new( dir.path() ), vec![ Track::from_path( dir.path().join( "ghost.mp3" ) ) ] );
        let ( catalog, service ) = service( state, dir.path().join( "trash" ) );

        let tracks = service.tracks().await.unwrap();
        let report = service.remove_tracks_from_disk_with_report( &tracks ).await;

        assert_eq!( report.verdict(), RemoveTracksResult::Error );
        assert!( report.catalog_changed() );
        assert!( catalog.snapshot().unwrap().tracks.is_empty() );
    }
}
