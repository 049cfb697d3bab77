//! Curator CLI - collection maintenance from the terminal

mod cli;
mod settings;
mod store;

use std::path::{ Path, PathBuf };
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ Context, Result };
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::Level;

use cli::{ Args, Command };
use settings::Settings;
use store::JsonCatalog;

use curator_core::{
    CollectionService, DefaultStrings, Entity, FlushOutcome, Folder, NowPlaying,
    RemoveTracksResult, SmartPlaylistDraft, Track, TrashDir,
};


#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level( if args.verbose { Level::DEBUG } else { Level::INFO } )
        .with_writer( std::io::stderr )
        .init();

    let settings = Settings::load();
    let catalog_path = args.catalog.clone().unwrap_or_else( || settings.catalog_path() );
    let catalog = JsonCatalog::open( catalog_path.clone() )
        .await
        .with_context( || format!( "Failed to open catalog {}", catalog_path.display() ) )?;
    tracing::debug!( "Using catalog {:?}", catalog.path() );

    let trash = TrashDir::new( settings.trash_dir() );
    tracing::debug!( "Using trash {:?}", trash.root() );
    let service = CollectionService::with_flush_delay(
        Arc::new( catalog ),
        Arc::new( NowPlaying::new() ),
        Arc::new( trash.clone() ),
        Arc::new( DefaultStrings ),
        settings.flush_delay(),
    );

    // Change notifications are handled on this task only
    let mut changes = service.subscribe();
    let listener = tokio::spawn( async move {
        loop {
            match changes.recv().await {
                Ok( _ ) | Err( RecvError::Lagged( _ ) ) => {
                    tracing::info!( "Collection changed" );
                }
                Err( RecvError::Closed ) => break,
            }
        }
    });

    let result = run( &args.command, &service, &trash, &settings ).await;

    // Keep edits still waiting for the debounce timer
    match service.flush_folders().await {
        FlushOutcome::Failed( n ) => tracing::error!( "Failed to save {} folder change(s)", n ),
        FlushOutcome::Saved( n ) => tracing::debug!( "Saved {} folder change(s) on exit", n ),
        FlushOutcome::Empty => {}
    }

    // The channel closes once the service and its timer tasks are gone
    drop( service );
    if tokio::time::timeout( Duration::from_secs( 1 ), listener ).await.is_err() {
        tracing::debug!( "Change listener still running at exit" );
    }

    result
}


async fn run( command: &Command, service: &CollectionService, trash: &TrashDir, settings: &Settings ) -> Result<()> {
    match command {
        Command::Folders => {
            for folder in service.folders().await? {
                let mark = if folder.show_in_collection { "shown " } else { "hidden" };
                println!( "{}  {}", mark, folder.path.display() );
            }
        }

        Command::AddFolder { path } => {
            let path = absolute( path )?;
            let count = service.add_folder( path.clone() )
                .await
                .with_context( || format!( "Failed to add {}", path.display() ) )?;
            println!( "Added {} ({} tracks)", path.display(), count );
        }

        Command::Show { paths } => mark_folders( service, paths, true ).await?,
        Command::Hide { paths } => mark_folders( service, paths, false ).await?,

        Command::Artists { scope } => {
            print_grouped( &service.all_artists( ( *scope ).into() ).await? );
        }

        Command::Genres => {
            print_grouped( &service.all_genres().await? );
        }

        Command::Remove { paths, disk } => {
            let tracks = resolve_tracks( service, paths ).await?;

            let result = if *disk {
                let report = service.remove_tracks_from_disk_with_report( &tracks ).await;
                for path in &report.failed {
                    eprintln!( "Could not trash {}", path.display() );
                }
                report.verdict()
            } else {
                service.remove_tracks_from_collection( &tracks ).await
            };

            match result {
                RemoveTracksResult::Success => println!( "Removed {} track(s)", tracks.len() ),
                RemoveTracksResult::Error => anyhow::bail!( "Removing {} track(s) failed", tracks.len() ),
            }
        }

        Command::Restore { path } => {
            let restored = trash.restore( path )
                .await
                .with_context( || format!( "Failed to restore {}", path.display() ) )?;
            println!( "Restored {}", restored.display() );
        }

        Command::NewPlaylist => {
            let existing = playlist_names( &settings.playlist_dir() );
            let draft = SmartPlaylistDraft::new( &existing, service.strings() );

            println!( "Name:  {}", draft.name );
            println!( "Rules: {}", draft.rules.len() );
            println!( "Limit: {} (disabled)", draft.limit );
            let units: Vec<_> = draft.limit_options().iter().map( |o| o.label.as_str() ).collect();
            println!( "Units: {}", units.join( ", " ) );
        }
    }

    Ok(())
}


/// Marks each known folder; unknown paths are reported and skipped.
async fn mark_folders( service: &CollectionService, paths: &[PathBuf], show: bool ) -> Result<()> {
    let known = service.folders().await?;

    for path in paths {
        let path = absolute( path )?;
        match known.iter().find( |f| f.path == path ) {
            Some( folder ) => {
                service.mark_folder( Folder::new( folder.path.clone() ).with_visibility( show ) ).await;
            }
            None => eprintln!( "Not a library folder: {}", path.display() ),
        }
    }

    Ok(())
}


/// Looks up catalog tracks by path. Unknown paths are kept so that the
/// catalog rejects the whole batch.
async fn resolve_tracks( service: &CollectionService, paths: &[PathBuf] ) -> Result<Vec<Track>> {
    let catalog = service.tracks().await?;
    let mut tracks = Vec::with_capacity( paths.len() );

    for path in paths {
        let path = absolute( path )?;
        match catalog.iter().find( |t| t.path == path ) {
            Some( track ) => tracks.push( track.clone() ),
            None => {
                eprintln!( "Not in the catalog: {}", path.display() );
                tracks.push( Track::from_path( path ) );
            }
        }
    }

    Ok( tracks )
}


fn absolute( path: &Path ) -> Result<PathBuf> {
    std::path::absolute( path ).with_context( || format!( "Invalid path {}", path.display() ) )
}


/// Names of the saved playlists (file stems of `*.m3u`).
fn playlist_names( dir: &Path ) -> Vec<String> {
    let Ok( entries ) = std::fs::read_dir( dir ) else {
        return Vec::new();
    };

    entries.flatten()
        .map( |e| e.path() )
        .filter( |p| p.extension().is_some_and( |e| e.eq_ignore_ascii_case( "m3u" ) ) )
        .filter_map( |p| p.file_stem().map( |s| s.to_string_lossy().into_owned() ) )
        .collect()
}


/// Prints entities under their group headers.
fn print_grouped( entities: &[Entity] ) {
    let mut header = None;

    for entity in entities {
        if header != Some( entity.header() ) {
            header = Some( entity.header() );
            println!( "[{}]", entity.header() );
        }
        println!( "  {}", entity.name() );
    }
}
