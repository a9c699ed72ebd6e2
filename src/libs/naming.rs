//! Translation between member-style (`cityName`) and column-style (`city_name`)
//! identifiers.
//!
//! The two functions are not perfect inverses. A leading uppercase letter is
//! lowercased without a separator, so `City` becomes `city` and comes back as
//! `city`. Each uppercase letter in a run gets its own separator, so `HTTPCode`
//! becomes `h_t_t_p_code` and comes back as `hTTPCode`. Only names that start
//! lowercase and have no consecutive capitals round-trip.

const SEPARATOR: char = '_';

/// `isMegapolis` -> `is_megapolis`.
pub fn to_column_case(member: &str) -> String {
    let mut out = String::with_capacity(member.len() + 4);
    for (i, c) in member.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `is_megapolis` -> `isMegapolis`.
pub fn to_member_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper_next = false;
    for c in column.chars() {
        if c == SEPARATOR {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_uppercase() {
        assert_eq!(to_column_case("cityName"), "city_name");
        assert_eq!(to_column_case("isMegapolis"), "is_megapolis");
        assert_eq!(to_column_case("population"), "population");
    }

    #[test]
    fn leading_uppercase_gets_no_separator() {
        assert_eq!(to_column_case("City"), "city");
        assert_eq!(to_member_case("city"), "city");
    }

    #[test]
    fn uppercase_runs_do_not_round_trip() {
        assert_eq!(to_column_case("HTTPCode"), "h_t_t_p_code");
        assert_eq!(to_member_case("h_t_t_p_code"), "hTTPCode");
    }

    #[test]
    fn joins_on_separator() {
        assert_eq!(to_member_case("city_name"), "cityName");
        assert_eq!(to_member_case("is_megapolis"), "isMegapolis");
        assert_eq!(to_member_case("trailing_"), "trailing");
        assert_eq!(to_member_case("a__b"), "aB");
    }

    #[test]
    fn compound_names_round_trip() {
        for name in ["cityName", "country", "isMegapolis", "aLongerMemberName", "x1Y2"] {
            assert_eq!(to_member_case(&to_column_case(name)), name);
        }
    }

    #[test]
    fn non_ascii_is_left_alone() {
        assert_eq!(to_column_case("straßeÜber"), "straßeÜber");
    }
}
