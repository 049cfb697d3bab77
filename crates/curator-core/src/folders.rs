//! Debounced folder visibility persistence
//!
//! Toggling "show in collection" on a folder is cheap and often done in
//! bursts. `FolderMarker` collects the edits, keeps only the latest one per
//! folder path, and writes the whole batch to the catalog once no new edit
//! has arrived for the flush delay.
//!
//! The timer has two states: idle (no task) and armed (a sleeping task in
//! `timer`). Every mark aborts the armed task and spawns a fresh one; an
//! expired timer hands the flush to its own task so that a later abort can
//! never cancel a flush that is already writing.

use std::sync::{ Arc, Mutex };
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::catalog::CatalogStore;
use crate::events::CollectionEvents;
use crate::model::{ CoreError, Folder };


/// Quiet period after the last mark before pending edits are written.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis( 2000 );


/// What a flush did.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum FlushOutcome {
    /// Nothing was pending.
    Empty,
    /// The given number of folders was written.
    Saved( usize ),
    /// Writing the given number of folders failed; the edits were dropped.
    Failed( usize ),
}


impl FlushOutcome {
    /// True if the flush touched the collection, whether or not it succeeded.
    pub fn changed_collection( self ) -> bool {
        !matches!( self, FlushOutcome::Empty )
    }
}


struct Inner {
    store: Arc<dyn CatalogStore>,
    events: CollectionEvents,
    delay: Duration,
    pending: Mutex<Vec<Folder>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}


/// Coalesces folder visibility edits and flushes them after a quiet period.
#[derive( Clone )]
pub struct FolderMarker {
    inner: Arc<Inner>,
}


impl FolderMarker {
    pub fn new( store: Arc<dyn CatalogStore>, events: CollectionEvents ) -> Self {
        Self::with_delay( store, events, DEFAULT_FLUSH_DELAY )
    }


    pub fn with_delay( store: Arc<dyn CatalogStore>, events: CollectionEvents, delay: Duration ) -> Self {
        Self {
            inner: Arc::new( Inner {
                store,
                events,
                delay,
                pending: Mutex::new( Vec::new() ),
                timer: Mutex::new( None ),
            }),
        }
    }


    /// Records the folder's current visibility for the next flush.
    ///
    /// A pending edit for the same path is overwritten. Restarts the flush
    /// timer. Never fails: a mark that cannot be recorded is logged and lost.
    pub async fn mark( &self, folder: Folder ) {
        self.disarm();

        match self.inner.record( &folder ) {
            Ok( () ) => self.arm(),
            Err( e ) => {
                tracing::error!( "Error marking folder with path={:?}: {}", folder.path, e );
            }
        }
    }


    /// Writes all pending edits now.
    ///
    /// Used on shutdown so that edits inside the debounce window are kept.
    pub async fn flush( &self ) -> FlushOutcome {
        self.disarm();
        self.inner.flush().await
    }


    /// Snapshot of the pending edits, in order of first mark.
    pub fn pending( &self ) -> Vec<Folder> {
        match self.inner.pending.lock() {
            Ok( pending ) => pending.clone(),
            Err( poisoned ) => poisoned.into_inner().clone(),
        }
    }


    /// Returns true while a flush timer is armed.
    pub fn is_armed( &self ) -> bool {
        self.inner.timer.lock()
            .map( |t| t.as_ref().is_some_and( |h| !h.is_finished() ) )
            .unwrap_or( false )
    }


    fn disarm( &self ) {
        if let Ok( mut timer ) = self.inner.timer.lock() {
            if let Some( handle ) = timer.take() {
                handle.abort();
            }
        }
    }


    fn arm( &self ) {
        let inner = Arc::clone( &self.inner );
        let handle = tokio::spawn( async move {
            tokio::time::sleep( inner.delay ).await;
            // Detach the flush from the timer so aborting the timer cannot cancel it
            tokio::spawn( async move {
                inner.flush().await;
            });
        });

        match self.inner.timer.lock() {
            Ok( mut timer ) => {
                if let Some( previous ) = timer.replace( handle ) {
                    previous.abort();
                }
            }
            Err( _ ) => {
                tracing::warn!( "Flush timer lock poisoned, timer cannot be reset" );
            }
        }
    }
}


impl Inner {
    fn record( &self, folder: &Folder ) -> Result<(), CoreError> {
        let mut pending = self.pending.lock()
            .map_err( |_| CoreError::Storage( "pending folder lock poisoned".into() ) )?;

        match pending.iter_mut().find( |f| f.same_root( folder ) ) {
            Some( existing ) => existing.show_in_collection = folder.show_in_collection,
            None => pending.push( folder.clone() ),
        }

        tracing::debug!( "Marked {:?} (show={}), {} pending", folder.path, folder.show_in_collection, pending.len() );
        Ok(())
    }


    async fn flush( &self ) -> FlushOutcome {
        // Drain under the lock; marks arriving while the store works start a new batch.
        let batch = match self.pending.lock() {
            Ok( mut pending ) => std::mem::take( &mut *pending ),
            Err( poisoned ) => std::mem::take( &mut *poisoned.into_inner() ),
        };

        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let outcome = match self.store.update_folders( &batch ).await {
            Ok( () ) => {
                tracing::info!( "Saved {} folder(s)", batch.len() );
                FlushOutcome::Saved( batch.len() )
            }
            Err( e ) => {
                tracing::error!( "Error updating folders. Exception: {}", e );
                FlushOutcome::Failed( batch.len() )
            }
        };

        self.events.notify();
        outcome
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::model::{ RemoveTracksResult, Track };


    #[derive( Default )]
    struct RecordingStore {
        fail: bool,
        updates: Mutex<Vec<Vec<Folder>>>,
    }


    impl RecordingStore {
        fn updates( &self ) -> Vec<Vec<Folder>> {
            self.updates.lock().unwrap().clone()
        }
    }


    #[async_trait]
    impl CatalogStore for RecordingStore {
        async fn folders( &self ) -> Result<Vec<Folder>, CoreError> {
            Ok( Vec::new() )
        }

        async fn tracks( &self ) -> Result<Vec<Track>, CoreError> {
            Ok( Vec::new() )
        }

        async fn add_folder( &self, _folder: Folder, _tracks: Vec<Track> ) -> Result<(), CoreError> {
            Ok(())
        }

        async fn update_folders( &self, folders: &[Folder] ) -> Result<(), CoreError> {
            self.updates.lock().unwrap().push( folders.to_vec() );
            if self.fail {
                Err( CoreError::Storage( "disk full".into() ) )
            } else {
                Ok(())
            }
        }

        async fn remove_tracks( &self, _tracks: &[Track] ) -> RemoveTracksResult {
            RemoveTracksResult::Success
        }

        async fn all_genre_names( &self ) -> Result<Vec<String>, CoreError> {
            Ok( Vec::new() )
        }

        async fn all_track_artist_names( &self ) -> Result<Vec<String>, CoreError> {
            Ok( Vec::new() )
        }

        async fn all_album_artist_names( &self ) -> Result<Vec<String>, CoreError> {
            Ok( Vec::new() )
        }
    }


    fn setup( fail: bool ) -> ( Arc<RecordingStore>, CollectionEvents, FolderMarker ) {
        let store = Arc::new( RecordingStore { fail, ..Default::default() } );
        let events = CollectionEvents::new();
        let marker = FolderMarker::new( store.clone(), events.clone() );
        ( store, events, marker )
    }


    async fn sleep_ms( ms: u64 ) {
        tokio::time::sleep( Duration::from_millis( ms ) ).await;
    }


    #[tokio::test( start_paused = true )]
    async fn test_repeated_marks_coalesce_into_one_flush() {
        let ( store, events, marker ) = setup( false );
        let mut rx = events.subscribe();

        marker.mark( Folder::new( "/music" ).with_visibility( false ) ).await;
        sleep_ms( 500 ).await;
        marker.mark( Folder::new( "/music" ).with_visibility( true ) ).await;
        sleep_ms( 1500 ).await;
        marker.mark( Folder::new( "/music" ).with_visibility( false ) ).await;
        sleep_ms( 2500 ).await;

        assert_eq!( store.updates(), vec![ vec![ Folder::new( "/music" ).with_visibility( false ) ] ] );
        assert!( rx.try_recv().is_ok() );
        assert!( rx.try_recv().is_err() );
    }


    #[tokio::test( start_paused = true )]
    async fn test_flush_waits_for_quiet_period() {
        let ( store, _events, marker ) = setup( false );

        marker.mark( Folder::new( "/a" ) ).await;
        sleep_ms( 1500 ).await;
        marker.mark( Folder::new( "/a" ).with_visibility( false ) ).await;
        sleep_ms( 1000 ).await;

        // 2500 ms after the first mark, but only 1000 ms after the last one
        assert!( store.updates().is_empty() );
        assert!( marker.is_armed() );

        sleep_ms( 1100 ).await;
        assert_eq!( store.updates().len(), 1 );
        assert!( !marker.is_armed() );
    }


    #[tokio::test( start_paused = true )]
    async fn test_different_folders_share_one_flush() {
        let ( store, _events, marker ) = setup( false );

        marker.mark( Folder::new( "/a" ).with_visibility( false ) ).await;
        marker.mark( Folder::new( "/b" ).with_visibility( false ) ).await;
        marker.mark( Folder::new( "/a" ).with_visibility( true ) ).await;
        sleep_ms( 2100 ).await;

        assert_eq!( store.updates(), vec![ vec![
            Folder::new( "/a" ).with_visibility( true ),
            Folder::new( "/b" ).with_visibility( false ),
        ]]);
    }


    #[tokio::test( start_paused = true )]
    async fn test_failed_flush_drains_and_still_notifies() {
        let ( store, events, marker ) = setup( true );
        let mut rx = events.subscribe();

        marker.mark( Folder::new( "/a" ) ).await;
        sleep_ms( 2100 ).await;

        assert_eq!( store.updates().len(), 1 );
        assert!( marker.pending().is_empty() );
        assert!( rx.try_recv().is_ok() );
        assert!( rx.try_recv().is_err() );

        // A new mark starts a fresh batch
        marker.mark( Folder::new( "/b" ) ).await;
        assert_eq!( marker.pending(), vec![ Folder::new( "/b" ) ] );
        sleep_ms( 2100 ).await;
        assert_eq!( store.updates()[ 1 ], vec![ Folder::new( "/b" ) ] );
    }


    #[tokio::test( start_paused = true )]
    async fn test_empty_flush_does_not_notify() {
        let ( store, events, marker ) = setup( false );
        let mut rx = events.subscribe();

        let outcome = marker.flush().await;
        assert_eq!( outcome, FlushOutcome::Empty );
        assert!( !outcome.changed_collection() );
        assert!( store.updates().is_empty() );
        assert!( rx.try_recv().is_err() );
    }


    #[tokio::test( start_paused = true )]
    async fn test_explicit_flush_cancels_timer() {
        let ( store, events, marker ) = setup( false );
        let mut rx = events.subscribe();

        marker.mark( Folder::new( "/a" ) ).await;
        let outcome = marker.flush().await;
        assert_eq!( outcome, FlushOutcome::Saved( 1 ) );
        assert!( outcome.changed_collection() );
        assert!( rx.try_recv().is_ok() );

        sleep_ms( 3000 ).await;
        assert_eq!( store.updates().len(), 1 );
        assert!( rx.try_recv().is_err() );
    }
}
