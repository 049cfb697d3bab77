//! Playback control seam
//!
//! The removal workflow must make sure no open handle is held on a file
//! before it moves that file to the trash. `NowPlaying` keeps the file of
//! the current track open for as long as it is playing or paused.

use std::fs::File;
use std::path::{ Path, PathBuf };
use std::sync::RwLock;

use async_trait::async_trait;

use crate::model::{ CoreError, Track };


/// Current playback state.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}


/// Controls the currently playing track.
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    /// Stops playback if `track` is the current track.
    ///
    /// Returns once any file handle on that track has been released. Does
    /// nothing for any other track.
    async fn stop_if_playing( &self, track: &Track );
}


struct Current {
    path: PathBuf,
    // Dropping the handle releases the file.
    _file: File,
}


/// Tracks the playing file and owns its handle.
pub struct NowPlaying {
    state: RwLock<PlaybackState>,
    current: RwLock<Option<Current>>,
}


impl NowPlaying {
    pub fn new() -> Self {
        Self {
            state: RwLock::new( PlaybackState::Stopped ),
            current: RwLock::new( None ),
        }
    }


    /// Opens `path` and marks it as playing, replacing any current track.
    pub fn play( &self, path: PathBuf ) -> Result<(), CoreError> {
        let file = File::open( &path ).map_err( |e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound( path.clone() ),
            _ => CoreError::Io( e ),
        })?;

        tracing::info!( "Playing: {:?}", path );

        *self.current_mut()? = Some( Current { path, _file: file } );
        self.set_state( PlaybackState::Playing );
        Ok(())
    }


    /// Pauses playback; the file stays open.
    pub fn pause( &self ) {
        if self.state() == PlaybackState::Playing {
            self.set_state( PlaybackState::Paused );
        }
    }


    /// Stops playback and releases the file handle.
    pub fn stop( &self ) -> Result<(), CoreError> {
        if let Some( current ) = self.current_mut()?.take() {
            tracing::info!( "Stopped: {:?}", current.path );
        }
        self.set_state( PlaybackState::Stopped );
        Ok(())
    }


    /// Gets the current playback state.
    pub fn state( &self ) -> PlaybackState {
        self.state.read()
            .map( |s| *s )
            .unwrap_or( PlaybackState::Stopped )
    }


    /// Gets the current track path, if any.
    pub fn current_track( &self ) -> Option<PathBuf> {
        self.current.read().ok()?
            .as_ref()
            .map( |c| c.path.clone() )
    }


    /// Returns true if `path` is the current track.
    pub fn is_current( &self, path: &Path ) -> bool {
        self.current.read()
            .map( |c| c.as_ref().is_some_and( |c| c.path == path ) )
            .unwrap_or( false )
    }


    fn set_state( &self, new_state: PlaybackState ) {
        if let Ok( mut state ) = self.state.write() {
            *state = new_state;
        }
    }


    fn current_mut( &self ) -> Result<std::sync::RwLockWriteGuard<'_, Option<Current>>, CoreError> {
        self.current.write()
            .map_err( |_| CoreError::Storage( "playback lock poisoned".into() ) )
    }
}


impl Default for NowPlaying {
    fn default() -> Self {
        Self::new()
    }
}


#[async_trait]
impl PlaybackControl for NowPlaying {
    async fn stop_if_playing( &self, track: &Track ) {
        if !self.is_current( &track.path ) {
            return;
        }

        if let Err( e ) = self.stop() {
            tracing::error!( "Failed to stop {:?}: {}", track.path, e );
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[tokio::test]
    async fn test_stop_if_playing_releases_current_only() {
        let dir = tempfile::tempdir().unwrap();
        let playing = dir.path().join( "playing.mp3" );
        let other = dir.path().join( "other.mp3" );
        std::fs::write( &playing, b"" ).unwrap();
        std::fs::write( &other, b"" ).unwrap();

        let now_playing = NowPlaying::new();
        now_playing.play( playing.clone() ).unwrap();

        now_playing.stop_if_playing( &Track::from_path( &other ) ).await;
        assert_eq!( now_playing.state(), PlaybackState::Playing );
        assert_eq!( now_playing.current_track(), Some( playing.clone() ) );

        now_playing.stop_if_playing( &Track::from_path( &playing ) ).await;
        assert_eq!( now_playing.state(), PlaybackState::Stopped );
        assert_eq!( now_playing.current_track(), None );
    }


    #[test]
    fn test_play_missing_file() {
        let now_playing = NowPlaying::new();
        let result = now_playing.play( PathBuf::from( "/definitely/not/here.mp3" ) );
        assert!( matches!( result, Err( CoreError::NotFound( _ ) ) ) );
        assert_eq!( now_playing.state(), PlaybackState::Stopped );
    }


    #[test]
    fn test_pause_keeps_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "song.flac" );
        std::fs::write( &path, b"" ).unwrap();

        let now_playing = NowPlaying::new();
        now_playing.pause();
        assert_eq!( now_playing.state(), PlaybackState::Stopped );

        now_playing.play( path.clone() ).unwrap();
        now_playing.pause();
        assert_eq!( now_playing.state(), PlaybackState::Paused );
        assert!( now_playing.is_current( &path ) );
    }
}
