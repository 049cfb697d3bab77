//! Command-line argument parsing for Curator.

use std::path::PathBuf;

use clap::{ Parser, Subcommand, ValueEnum };

use curator_core::ArtistScope;


/// Curator - music collection maintenance.
#[derive( Parser, Debug )]
#[command( name = "curator" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Catalog file to use instead of the configured one.
    #[arg( short, long, global = true )]
    pub catalog: Option<PathBuf>,

    /// Log debug output.
    #[arg( short, long, global = true )]
    pub verbose: bool,

    #[command( subcommand )]
    pub command: Command,
}


#[derive( Subcommand, Debug )]
pub enum Command {
    /// List library folders.
    Folders,

    /// Scan a directory and add it as a library folder.
    AddFolder { path: PathBuf },

    /// Show folders in the collection.
    Show {
        #[arg( required = true )]
        paths: Vec<PathBuf>,
    },

    /// Hide folders from the collection.
    Hide {
        #[arg( required = true )]
        paths: Vec<PathBuf>,
    },

    /// List artists.
    Artists {
        #[arg( short, long, value_enum, default_value_t = ScopeArg::All )]
        scope: ScopeArg,
    },

    /// List genres.
    Genres,

    /// Remove tracks from the collection.
    Remove {
        #[arg( required = true )]
        paths: Vec<PathBuf>,

        /// Also move the files to the trash.
        #[arg( short, long )]
        disk: bool,
    },

    /// Put a trashed file back where it came from.
    Restore { path: PathBuf },

    /// Show the defaults of a new smart playlist.
    NewPlaylist,
}


/// Artist role argument for parsing.
#[derive( Debug, Clone, Copy, PartialEq, Eq, ValueEnum )]
pub enum ScopeArg {
    All,
    Track,
    Album,
}


impl From<ScopeArg> for ArtistScope {
    fn from( arg: ScopeArg ) -> Self {
        match arg {
            ScopeArg::All => ArtistScope::All,
            ScopeArg::Track => ArtistScope::Track,
            ScopeArg::Album => ArtistScope::Album,
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_artists_scope() {
        let args = Args::parse_from([ "curator", "artists", "--scope", "album" ]);
        assert!( matches!( args.command, Command::Artists { scope: ScopeArg::Album } ) );
    }


    #[test]
    fn test_parse_remove_disk() {
        let args = Args::parse_from([ "curator", "-v", "remove", "--disk", "/m/a.mp3", "/m/b.mp3" ]);
        assert!( args.verbose );
        match args.command {
            Command::Remove { paths, disk } => {
                assert!( disk );
                assert_eq!( paths.len(), 2 );
            }
            other => panic!( "unexpected command: {:?}", other ),
        }
    }


    #[test]
    fn test_hide_requires_path() {
        assert!( Args::try_parse_from([ "curator", "hide" ]).is_err() );
    }
}
