//! Free-text query routing for composite patient search.

/// Which search a free-text query is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRoute {
    /// Shorter than the minimum length; nothing is searched.
    TooShort,
    /// Contains at least one ASCII digit; searched as an identifier pattern.
    Identifier,
    /// Searched as a person name.
    Name,
}

impl QueryRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TooShort => "too_short",
            Self::Identifier => "identifier",
            Self::Name => "name",
        }
    }
}

/// Routes `query` by length (in characters) and digit presence.
///
/// Never routes to both searches, even for names carrying a digit.
pub fn route_query(query: &str, min_query_length: usize) -> QueryRoute {
    if query.chars().count() < min_query_length {
        QueryRoute::TooShort
    } else if query.chars().any(|ch| ch.is_ascii_digit()) {
        QueryRoute::Identifier
    } else {
        QueryRoute::Name
    }
}

#[cfg(test)]
mod tests {
    use super::{route_query, QueryRoute};

    #[test]
    fn short_queries_are_not_searched() {
        assert_eq!(route_query("", 3), QueryRoute::TooShort);
        assert_eq!(route_query("ab", 3), QueryRoute::TooShort);
        assert_eq!(route_query("12", 3), QueryRoute::TooShort);
    }

    #[test]
    fn any_digit_routes_to_identifier_search() {
        assert_eq!(route_query("A12B", 3), QueryRoute::Identifier);
        assert_eq!(route_query("123", 3), QueryRoute::Identifier);
        assert_eq!(route_query("Henry 8", 3), QueryRoute::Identifier);
    }

    #[test]
    fn digit_free_queries_route_to_name_search() {
        assert_eq!(route_query("Smith", 3), QueryRoute::Name);
        assert_eq!(route_query("abc", 3), QueryRoute::Name);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert_eq!(route_query("Zoë", 3), QueryRoute::Name);
        assert_eq!(route_query("Ωμ", 3), QueryRoute::TooShort);
    }

    #[test]
    fn non_ascii_digits_do_not_count() {
        assert_eq!(route_query("abc٣", 3), QueryRoute::Name);
    }

    #[test]
    fn minimum_length_is_configurable() {
        assert_eq!(route_query("ab", 2), QueryRoute::Name);
        assert_eq!(route_query("Smith", 6), QueryRoute::TooShort);
    }
}
