//! Track removal workflow
//!
//! Removing tracks always goes through the catalog first. Only a batch the
//! catalog removed completely is deleted from disk, one file at a time,
//! after making sure playback no longer holds the file open.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::events::CollectionEvents;
use crate::model::{ RemoveTracksResult, Track };
use crate::playback::PlaybackControl;
use crate::trash::Trash;


/// Detailed outcome of a removal from disk.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct RemovalReport {
    /// Verdict of the catalog removal.
    pub catalog: RemoveTracksResult,
    /// Files that could not be moved to the trash.
    pub failed: Vec<PathBuf>,
}


impl RemovalReport {
    /// Folds the report into the two-valued verdict.
    ///
    /// Note that `Error` does not say whether the catalog was changed: the
    /// catalog removal may have succeeded while some files stayed on disk.
    pub fn verdict( &self ) -> RemoveTracksResult {
        if self.catalog.is_success() && self.failed.is_empty() {
            RemoveTracksResult::Success
        } else {
            RemoveTracksResult::Error
        }
    }


    /// True if the catalog was modified.
    pub fn catalog_changed( &self ) -> bool {
        self.catalog.is_success()
    }
}


/// Removes tracks from the catalog and optionally from disk.
#[derive( Clone )]
pub struct TrackRemover {
    store: Arc<dyn CatalogStore>,
    playback: Arc<dyn PlaybackControl>,
    trash: Arc<dyn Trash>,
    events: CollectionEvents,
}


impl TrackRemover {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        playback: Arc<dyn PlaybackControl>,
        trash: Arc<dyn Trash>,
        events: CollectionEvents,
    ) -> Self {
        Self { store, playback, trash, events }
    }


    /// Removes the batch from the catalog only.
    ///
    /// The catalog applies the batch all or nothing. Listeners are notified
    /// only when it succeeded.
    pub async fn remove_from_collection( &self, tracks: &[Track] ) -> RemoveTracksResult {
        let result = self.store.remove_tracks( tracks ).await;

        match result {
            RemoveTracksResult::Success => {
                tracing::info!( "Removed {} track(s) from the collection", tracks.len() );
                self.events.notify();
            }
            RemoveTracksResult::Error => {
                tracing::warn!( "Catalog refused to remove {} track(s)", tracks.len() );
            }
        }

        result
    }


    /// Removes the batch from the catalog, then moves the files to the trash.
    pub async fn remove_from_disk( &self, tracks: &[Track] ) -> RemoveTracksResult {
        self.remove_from_disk_with_report( tracks ).await.verdict()
    }


    /// Like [`remove_from_disk`](Self::remove_from_disk), reporting which files failed.
    pub async fn remove_from_disk_with_report( &self, tracks: &[Track] ) -> RemovalReport {
        let catalog = self.store.remove_tracks( tracks ).await;

        if !catalog.is_success() {
            // Nothing was removed from the catalog, so nothing on disk is touched
            tracing::warn!( "Catalog refused to remove {} track(s), keeping files", tracks.len() );
            return RemovalReport { catalog, failed: Vec::new() };
        }

        let mut failed = Vec::new();

        for track in tracks {
            // Playback must let go of the file before it can be moved
            self.playback.stop_if_playing( track ).await;

            if let Err( e ) = self.trash.send_to_trash( &track.path ).await {
                tracing::error!( "Error while removing track '{}' from disk. Exception: {}", track.title, e );
                failed.push( track.path.clone() );
            }
        }

        tracing::info!(
            "Removed {} track(s) from the collection, {} file(s) left on disk",
            tracks.len(),
            failed.len()
        );

        // The catalog changed regardless of how the files fared
        self.events.notify();

        RemovalReport { catalog, failed }
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::catalog::{ CatalogState, MemoryCatalog };
    use crate::model::{ CoreError, Folder };


    /// Records the order of playback and trash calls.
    #[derive( Default )]
    struct Journal {
        calls: Mutex<Vec<String>>,
        failing: Vec<PathBuf>,
    }


    impl Journal {
        fn failing( paths: &[&str] ) -> Self {
            Self {
                failing: paths.iter().map( PathBuf::from ).collect(),
                ..Default::default()
            }
        }


        fn calls( &self ) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }


    #[async_trait]
    impl PlaybackControl for Journal {
        async fn stop_if_playing( &self, track: &Track ) {
            self.calls.lock().unwrap().push( format!( "stop {}", track.path.display() ) );
        }
    }


    #[async_trait]
    impl Trash for Journal {
        async fn send_to_trash( &self, path: &Path ) -> Result<(), CoreError> {
            self.calls.lock().unwrap().push( format!( "trash {}", path.display() ) );
            if self.failing.iter().any( |p| p == path ) {
                Err( CoreError::Trash( "in use".into() ) )
            } else {
                Ok(())
            }
        }
    }


    fn tracks() -> Vec<Track> {
        [ "/m/1.mp3", "/m/2.mp3", "/m/3.mp3" ].into_iter().map( |p| Track::from_path( p ) ).collect()
    }


    fn setup( journal: Journal ) -> ( Arc<MemoryCatalog>, Arc<Journal>, CollectionEvents, TrackRemover ) {
        let mut state = CatalogState::default();
        state.add_folder( Folder::new( "/m" ), tracks() );
        let catalog = Arc::new( MemoryCatalog::with_state( state ) );
        let journal = Arc::new( journal );
        let events = CollectionEvents::new();
        let remover = TrackRemover::new( catalog.clone(), journal.clone(), journal.clone(), events.clone() );
        ( catalog, journal, events, remover )
    }


    #[tokio::test]
    async fn test_remove_from_collection_notifies_on_success() {
        let ( catalog, journal, events, remover ) = setup( Journal::default() );
        let mut rx = events.subscribe();

        let result = remover.remove_from_collection( &tracks()[ ..2 ] ).await;

        assert_eq!( result, RemoveTracksResult::Success );
        assert_eq!( catalog.snapshot().unwrap().tracks, tracks()[ 2.. ].to_vec() );
        assert!( journal.calls().is_empty() );
        assert!( rx.try_recv().is_ok() );
    }


    #[tokio::test]
    async fn test_catalog_failure_touches_nothing() {
        let ( catalog, journal, events, remover ) = setup( Journal::default() );
        let mut rx = events.subscribe();

        let mut batch = tracks();
        batch.push( Track::from_path( "/m/unknown.mp3" ) );

        assert_eq!( remover.remove_from_collection( &batch ).await, RemoveTracksResult::Error );
        assert_eq!( remover.remove_from_disk( &batch ).await, RemoveTracksResult::Error );

        assert!( journal.calls().is_empty() );
        assert_eq!( catalog.snapshot().unwrap().tracks.len(), 3 );
        assert!( rx.try_recv().is_err() );
    }


    #[tokio::test]
    async fn test_partial_disk_failure_continues() {
        let ( catalog, journal, events, remover ) = setup( Journal::failing( &[ "/m/2.mp3" ] ) );
        let mut rx = events.subscribe();

        let report = remover.remove_from_disk_with_report( &tracks() ).await;

        assert_eq!( journal.calls(), vec![
            "stop /m/1.mp3", "trash /m/1.mp3",
            "stop /m/2.mp3", "trash /m/2.mp3",
            "stop /m/3.mp3", "trash /m/3.mp3",
        ]);
        assert_eq!( report.verdict(), RemoveTracksResult::Error );
        assert!( report.catalog_changed() );
        assert_eq!( report.failed, vec![ PathBuf::from( "/m/2.mp3" ) ] );

        // The catalog removal is not rolled back
        assert!( catalog.snapshot().unwrap().tracks.is_empty() );
        assert!( rx.try_recv().is_ok() );
        assert!( rx.try_recv().is_err() );
    }


    #[tokio::test]
    async fn test_remove_from_disk_success() {
        let ( _catalog, journal, events, remover ) = setup( Journal::default() );
        let mut rx = events.subscribe();

        assert_eq!( remover.remove_from_disk( &tracks() ).await, RemoveTracksResult::Success );
        assert_eq!( journal.calls().len(), 6 );
        assert!( rx.try_recv().is_ok() );
    }
}
