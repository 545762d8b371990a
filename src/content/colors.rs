//! Label colors

/// Palette used by the CardPress admin when a post has no colors
pub const DEFAULT_PALETTE: [&str; 4] = ["#F97316", "#0EA5E9", "#8B5CF6", "#10B981"];

/// Map a Trello label color name to its hex code
pub fn trello_hex(color: &str) -> Option<&'static str> {
    let hex = match color {
        "green" => "#61BD4F",
        "yellow" => "#F2D600",
        "orange" => "#FF9F1A",
        "red" => "#EB5A46",
        "purple" => "#C377E0",
        "blue" => "#0079BF",
        "sky" => "#00C2E0",
        "pink" => "#FF78CB",
        "black" => "#344563",
        "lime" => "#51e898",
        _ => return None,
    };
    Some(hex)
}

/// The default palette as owned strings
pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

/// Split a comma separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trello_hex() {
        assert_eq!(trello_hex("green"), Some("#61BD4F"));
        assert_eq!(trello_hex("lime"), Some("#51e898"));
        assert_eq!(trello_hex("null"), None);
        assert_eq!(trello_hex("green_dark"), None);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }
}
