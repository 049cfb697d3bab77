//! Collection change notification
//!
//! A single zero-payload event fanned out to any number of subscribers.
//! Each subscriber drains its own receiver on the task that owns its state,
//! so listeners never run on the task that raised the event.

use tokio::sync::broadcast;


const CHANNEL_CAPACITY: usize = 16;


/// The collection has changed and listings should be refreshed.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub struct CollectionChanged;


/// Publisher side of the change notification.
#[derive( Debug, Clone )]
pub struct CollectionEvents {
    tx: broadcast::Sender<CollectionChanged>,
}


impl CollectionEvents {
    pub fn new() -> Self {
        let ( tx, _rx ) = broadcast::channel( CHANNEL_CAPACITY );
        Self { tx }
    }


    /// Registers a new listener.
    ///
    /// A listener that falls behind gets `RecvError::Lagged`, which only
    /// means "changed at least once more" and can be treated as one event.
    pub fn subscribe( &self ) -> broadcast::Receiver<CollectionChanged> {
        self.tx.subscribe()
    }


    /// Raises the event. Returns the number of listeners reached.
    pub fn notify( &self ) -> usize {
        match self.tx.send( CollectionChanged ) {
            Ok( n ) => {
                tracing::debug!( "Collection changed, notified {} listener(s)", n );
                n
            }
            // No listeners
            Err( _ ) => 0,
        }
    }
}


impl Default for CollectionEvents {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[tokio::test]
    async fn test_fans_out_to_all_listeners() {
        let events = CollectionEvents::new();
        let mut a = events.subscribe();
        let mut b = events.subscribe();

        assert_eq!( events.notify(), 2 );
        assert_eq!( a.recv().await.unwrap(), CollectionChanged );
        assert_eq!( b.recv().await.unwrap(), CollectionChanged );
        assert!( a.try_recv().is_err() );
    }


    #[test]
    fn test_notify_without_listeners() {
        assert_eq!( CollectionEvents::new().notify(), 0 );
    }
}
