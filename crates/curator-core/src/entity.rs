//! Distinct artists and genres
//!
//! Turns raw name lists from the catalog into deduplicated entities with a
//! one-character grouping header, ready for browsing.

use std::collections::HashSet;


/// Header of entities whose name does not start with a letter.
pub const NON_ALPHABETIC_HEADER: char = '#';


/// A deduplicated, displayable artist or genre.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct Entity {
    name: String,
    header: char,
}


impl Entity {
    pub fn new( name: impl Into<String> ) -> Self {
        let name = name.into();
        let header = header_of( &name );
        Self { name, header }
    }


    pub fn name( &self ) -> &str {
        &self.name
    }


    /// Grouping header: the uppercased first letter, or `#`.
    pub fn header( &self ) -> char {
        self.header
    }


    pub fn is_non_alphabetic( &self ) -> bool {
        self.header == NON_ALPHABETIC_HEADER
    }
}


fn header_of( name: &str ) -> char {
    match name.trim_start().chars().next() {
        Some( c ) if c.is_alphabetic() => c.to_uppercase().next().unwrap_or( c ),
        _ => NON_ALPHABETIC_HEADER,
    }
}


/// Deduplicates `names` by exact name, keeping the first occurrence, and
/// appends an entity named `unknown_label` unless one is already present.
///
/// The result keeps the order of first appearance.
pub fn distinct<I, S>( names: I, unknown_label: &str ) -> Vec<Entity>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut entities = Vec::new();

    for name in names {
        let name = name.as_ref();
        if seen.insert( name.to_owned() ) {
            entities.push( Entity::new( name ) );
        }
    }

    if !seen.contains( unknown_label ) {
        entities.push( Entity::new( unknown_label ) );
    }

    entities
}


/// Sorts by name and then moves the `#` group to the front.
///
/// Names compare case-insensitively first so that "abba" and "ABBA" sit
/// next to each other; exact name breaks ties. Both steps are stable.
pub fn order_for_display( entities: &mut Vec<Entity> ) {
    entities.sort_by( |a, b| {
        a.name.to_lowercase().cmp( &b.name.to_lowercase() )
            .then_with( || a.name.cmp( &b.name ) )
    });

    let ( mut ordered, rest ): ( Vec<_>, Vec<_> ) = entities
        .drain( .. )
        .partition( Entity::is_non_alphabetic );
    ordered.extend( rest );
    *entities = ordered;
}


#[cfg( test )]
mod tests {
    use super::*;


    fn names( entities: &[Entity] ) -> Vec<&str> {
        entities.iter().map( Entity::name ).collect()
    }


    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let entities = distinct( [ "Rock", "Pop", "Rock" ], "Unknown" );
        assert_eq!( names( &entities ), vec![ "Rock", "Pop", "Unknown" ] );
    }


    #[test]
    fn test_distinct_empty_yields_unknown() {
        let entities = distinct( Vec::<String>::new(), "Unknown" );
        assert_eq!( names( &entities ), vec![ "Unknown" ] );
    }


    #[test]
    fn test_distinct_unknown_present_once() {
        let entities = distinct( [ "Unknown", "Jazz", "Unknown" ], "Unknown" );
        assert_eq!( names( &entities ), vec![ "Unknown", "Jazz" ] );
    }


    #[test]
    fn test_distinct_is_case_sensitive() {
        let entities = distinct( [ "abba", "ABBA" ], "Unknown" );
        assert_eq!( names( &entities ), vec![ "abba", "ABBA", "Unknown" ] );
    }


    #[test]
    fn test_headers() {
        assert_eq!( Entity::new( "beatles" ).header(), 'B' );
        assert_eq!( Entity::new( "Ölfarben" ).header(), 'Ö' );
        assert_eq!( Entity::new( "2Pac" ).header(), '#' );
        assert_eq!( Entity::new( "" ).header(), '#' );
        assert_eq!( Entity::new( "  " ).header(), '#' );
        assert_eq!( Entity::new( "(hed) p.e." ).header(), '#' );
    }


    #[test]
    fn test_order_puts_non_alphabetic_first() {
        let mut entities = distinct( [ "Zappa", "10cc", "abba", "!!!", "Beck" ], "Unknown" );
        order_for_display( &mut entities );
        assert_eq!(
            names( &entities ),
            vec![ "!!!", "10cc", "abba", "Beck", "Unknown", "Zappa" ],
        );
    }
}
