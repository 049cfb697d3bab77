//! Curator Core - Collection maintenance
//!
//! This crate keeps a music collection's catalog in shape: it persists
//! folder visibility edits with debouncing, removes tracks from the catalog
//! and from disk, and lists the distinct artists and genres for browsing.

pub mod catalog;
pub mod entity;
pub mod events;
pub mod folders;
pub mod model;
pub mod playback;
pub mod removal;
pub mod scan;
pub mod service;
pub mod smart_playlist;
pub mod strings;
pub mod trash;

pub use catalog::{ CatalogState, CatalogStore, MemoryCatalog };
pub use entity::Entity;
pub use events::{ CollectionChanged, CollectionEvents };
pub use folders::{ FlushOutcome, FolderMarker };
pub use model::{ ArtistScope, CoreError, Folder, RemoveTracksResult, Track, TrackMetadata };
pub use playback::{ NowPlaying, PlaybackControl };
pub use removal::{ RemovalReport, TrackRemover };
pub use service::CollectionService;
pub use smart_playlist::SmartPlaylistDraft;
pub use strings::{ DefaultStrings, Strings };
pub use trash::{ Trash, TrashDir };
