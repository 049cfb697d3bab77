//! Smart playlist drafts
//!
//! Holds the settings a user fills in before a smart playlist is created:
//! its name, its rules and an optional size limit. Rules are only data
//! here; nothing in this module evaluates them.

use crate::strings::{ self, Strings };


/// Track attribute a rule looks at.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum RuleField {
    #[default]
    Artist,
    AlbumArtist,
    Album,
    Genre,
    Title,
}


/// How a rule compares the field with its value.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum RuleOperator {
    #[default]
    Is,
    IsNot,
    Contains,
    DoesNotContain,
}


/// A single smart playlist rule.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct SmartPlaylistRule {
    pub field: RuleField,
    pub operator: RuleOperator,
    pub value: String,
}


/// Unit of a smart playlist size limit.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum LimitType {
    #[default]
    Songs,
    Gigabytes,
    Megabytes,
    Minutes,
}


impl LimitType {
    pub const ALL: [LimitType; 4] = [
        LimitType::Songs,
        LimitType::Gigabytes,
        LimitType::Megabytes,
        LimitType::Minutes,
    ];


    fn label_key( self ) -> &'static str {
        match self {
            LimitType::Songs => strings::SONGS,
            LimitType::Gigabytes => strings::GIGABYTES_SHORT,
            LimitType::Megabytes => strings::MEGABYTES_SHORT,
            LimitType::Minutes => strings::MINUTES,
        }
    }
}


/// A limit type with its display label.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct LimitOption {
    pub limit_type: LimitType,
    pub label: String,
}


/// Smart playlist settings being edited.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct SmartPlaylistDraft {
    pub name: String,
    pub rules: Vec<SmartPlaylistRule>,
    pub limit: u32,
    pub limit_enabled: bool,
    pub limit_type: LimitType,
    limit_options: Vec<LimitOption>,
}


impl SmartPlaylistDraft {
    /// Creates a draft with one empty rule and a name not yet taken by
    /// any of `existing_names`.
    pub fn new( existing_names: &[String], strings: &dyn Strings ) -> Self {
        let base = strings.get( strings::NEW_PLAYLIST );
        let limit_options = LimitType::ALL.iter()
            .map( |&limit_type| LimitOption {
                limit_type,
                label: strings.get( limit_type.label_key() ),
            })
            .collect();

        Self {
            name: unique_playlist_name( &base, existing_names ),
            rules: vec![ SmartPlaylistRule::default() ],
            limit: 1,
            limit_enabled: false,
            limit_type: LimitType::default(),
            limit_options,
        }
    }


    /// The selectable limit types with their labels.
    pub fn limit_options( &self ) -> &[LimitOption] {
        &self.limit_options
    }


    /// Appends an empty rule.
    pub fn add_rule( &mut self ) {
        self.rules.push( SmartPlaylistRule::default() );
    }


    /// Removes the rule at `index`.
    pub fn remove_rule( &mut self, index: usize ) -> Option<SmartPlaylistRule> {
        if index < self.rules.len() {
            Some( self.rules.remove( index ) )
        } else {
            None
        }
    }


    /// The active limit, if enabled.
    pub fn effective_limit( &self ) -> Option<( u32, LimitType )> {
        self.limit_enabled.then_some(( self.limit, self.limit_type ))
    }
}


/// Returns `base`, or `base (n)` with the smallest n >= 2 that is free.
///
/// Names are compared case-insensitively.
pub fn unique_playlist_name( base: &str, existing: &[String] ) -> String {
    let taken = |candidate: &str| existing.iter().any( |e| e.eq_ignore_ascii_case( candidate ) );

    if !taken( base ) {
        return base.to_string();
    }

    let mut n = 2;
    loop {
        let candidate = format!( "{} ({})", base, n );
        if !taken( &candidate ) {
            return candidate;
        }
        n += 1;
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use crate::strings::DefaultStrings;


    #[test]
    fn test_new_draft_defaults() {
        let draft = SmartPlaylistDraft::new( &[], &DefaultStrings );

        assert_eq!( draft.name, "New playlist" );
        assert_eq!( draft.rules, vec![ SmartPlaylistRule::default() ] );
        assert_eq!( draft.limit, 1 );
        assert_eq!( draft.effective_limit(), None );

        let labels: Vec<_> = draft.limit_options().iter().map( |o| o.label.as_str() ).collect();
        assert_eq!( labels, vec![ "songs", "GB", "MB", "minutes" ] );
    }


    #[test]
    fn test_unique_name_skips_taken() {
        let existing = vec![ "new playlist".to_string(), "New playlist (2)".to_string() ];
        assert_eq!( unique_playlist_name( "New playlist", &existing ), "New playlist (3)" );
        assert_eq!( unique_playlist_name( "Road trip", &existing ), "Road trip" );
    }


    #[test]
    fn test_add_and_remove_rules() {
        let mut draft = SmartPlaylistDraft::new( &[], &DefaultStrings );
        draft.add_rule();
        draft.rules[ 1 ].field = RuleField::Genre;
        draft.rules[ 1 ].value = "Jazz".into();

        let removed = draft.remove_rule( 0 ).unwrap();
        assert_eq!( removed, SmartPlaylistRule::default() );
        assert_eq!( draft.rules.len(), 1 );
        assert_eq!( draft.rules[ 0 ].field, RuleField::Genre );
        assert!( draft.remove_rule( 5 ).is_none() );

        draft.limit_enabled = true;
        draft.limit = 30;
        draft.limit_type = LimitType::Minutes;
        assert_eq!( draft.effective_limit(), Some(( 30, LimitType::Minutes )) );
    }
}
