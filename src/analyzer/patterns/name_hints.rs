use luana_code_info::ttype::{get_boolean, get_number, get_string, get_unknown, TypeSet};

const COORDINATE_NAMES: [&str; 7] = ["x", "y", "z", "w", "h", "width", "height"];
const COLOR_NAMES: [&str; 4] = ["r", "g", "b", "a"];

/// Conventional parameter names carry enough signal to seed a type. The
/// grouped rules only fire when enough of the group appears together, so a
/// lone `x` stays untyped.
pub fn seed_parameter_types(names: &[&str]) -> Vec<Option<TypeSet>> {
    let coordinate_count = names
        .iter()
        .filter(|name| COORDINATE_NAMES.contains(&name.to_lowercase().as_str()))
        .count();
    let color_count = names
        .iter()
        .filter(|name| COLOR_NAMES.contains(&name.to_lowercase().as_str()))
        .count();
    let has_dx = names.iter().any(|name| name.eq_ignore_ascii_case("dx"));
    let has_dy = names.iter().any(|name| name.eq_ignore_ascii_case("dy"));

    names
        .iter()
        .map(|name| {
            if name.starts_with("do") {
                return None;
            }

            let lower = name.to_lowercase();

            if coordinate_count >= 2 && COORDINATE_NAMES.contains(&lower.as_str()) {
                return Some(get_number());
            }
            if color_count >= 3 && COLOR_NAMES.contains(&lower.as_str()) {
                return Some(get_number());
            }
            if has_dx && has_dy && (lower == "dx" || lower == "dy") {
                return Some(get_number());
            }

            if is_flag_name(name) {
                return Some(get_boolean());
            }

            if lower.ends_with("str") || lower.ends_with("name") || lower.ends_with("title") {
                return Some(get_string());
            }

            if lower.starts_with("num") || lower.ends_with("num") {
                return Some(get_number());
            }

            if lower == "target" || is_positional_name(&lower, "param") || is_positional_name(&lower, "arg")
            {
                return Some(get_unknown());
            }

            None
        })
        .collect()
}

/// `isVisible`, `isX` — an `is` prefix followed by an uppercase letter.
fn is_flag_name(name: &str) -> bool {
    name.strip_prefix("is")
        .and_then(|rest| rest.chars().next())
        .map(|first| first.is_ascii_uppercase())
        .unwrap_or(false)
}

/// `param1`, `arg2`, …
fn is_positional_name(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_pairs_become_numbers() {
        let seeded = seed_parameter_types(&["x", "y", "label"]);

        assert_eq!(seeded[0], Some(get_number()));
        assert_eq!(seeded[1], Some(get_number()));
        assert_eq!(seeded[2], None);
    }

    #[test]
    fn a_lone_coordinate_stays_untyped() {
        let seeded = seed_parameter_types(&["x", "label"]);

        assert_eq!(seeded[0], None);
    }

    #[test]
    fn color_channels_need_three() {
        let seeded = seed_parameter_types(&["r", "g", "b", "a"]);
        assert!(seeded.iter().all(|types| *types == Some(get_number())));

        let seeded = seed_parameter_types(&["r", "g"]);
        assert!(seeded.iter().all(|types| types.is_none()));
    }

    #[test]
    fn do_prefixed_names_are_exempt() {
        // doName would otherwise match the name-suffix rule
        let seeded = seed_parameter_types(&["doName"]);
        assert_eq!(seeded[0], None);
    }

    #[test]
    fn suffix_and_flag_rules() {
        let seeded = seed_parameter_types(&["titleStr", "isOpen", "numItems", "arg1"]);

        assert_eq!(seeded[0], Some(get_string()));
        assert_eq!(seeded[1], Some(get_boolean()));
        assert_eq!(seeded[2], Some(get_number()));
        assert_eq!(seeded[3], Some(get_unknown()));
    }
}
