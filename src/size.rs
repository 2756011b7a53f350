use lazy_static::lazy_static;
use regex::Regex;

/// Known size labels, smallest first.
///
/// Children's heights come before the letter sizes; a label's position in
/// this list is its sort rank.
pub const SIZE_ORDER: [&str; 20] = [
    "100", "110", "120", "130", "140", "150", "XS", "S", "M", "L", "XL", "2XL", "3XL", "4XL",
    "5XL", "6XL", "7XL", "8XL", "9XL", "10XL",
];

/// Rank given to labels that do not map onto [`SIZE_ORDER`].
pub const UNKNOWN_RANK: usize = SIZE_ORDER.len();

lazy_static! {
    static ref NUMBERED_XL: Regex = Regex::new(r"^(\d+)XL$").unwrap();
}

/// Normalize a size label for display and storage
///
/// The label is upper-cased and trimmed. Repeated-X extra large sizes are
/// rewritten into their numbered form, so `XXL` becomes `2XL` and `xxxl`
/// becomes `3XL`. Every other label is returned unchanged apart from case.
///
/// # Examples
/// ```
/// use size_sorter::size::normalize_size;
///
/// assert_eq!(normalize_size(" xxl "), "2XL");
/// assert_eq!(normalize_size("XL"), "XL");
/// assert_eq!(normalize_size("m"), "M");
/// ```
pub fn normalize_size(raw: &str) -> String {
    let size = raw.trim().to_uppercase();
    if size.ends_with("XL") {
        let x_count = count_x(&size);
        if x_count > 1 {
            return format!("{}XL", x_count);
        }
    }
    size
}

/// Sort rank of a size label
///
/// Returns the label's index in [`SIZE_ORDER`]. Labels not in the list are
/// tried as repeated-X (`XXXXL`) and zero-padded numbered (`04XL`) extra
/// large sizes before falling back to [`UNKNOWN_RANK`].
///
/// # Examples
/// ```
/// use size_sorter::size::{size_rank, UNKNOWN_RANK};
///
/// assert!(size_rank("S") < size_rank("M"));
/// assert_eq!(size_rank("XXL"), size_rank("2XL"));
/// assert_eq!(size_rank("one size"), UNKNOWN_RANK);
/// ```
pub fn size_rank(label: &str) -> usize {
    let size = label.trim().to_uppercase();

    if let Some(rank) = position(&size) {
        return rank;
    }

    if size.ends_with("XL") {
        let x_count = count_x(&size).max(1);
        if let Some(rank) = position(&format!("{}XL", x_count)) {
            return rank;
        }
    }

    if let Some(caps) = NUMBERED_XL.captures(&size) {
        if let Ok(n) = caps[1].parse::<u32>() {
            if let Some(rank) = position(&format!("{}XL", n)) {
                return rank;
            }
        }
    }

    UNKNOWN_RANK
}

fn position(size: &str) -> Option<usize> {
    SIZE_ORDER.iter().position(|s| *s == size)
}

fn count_x(size: &str) -> usize {
    size.chars().filter(|c| *c == 'X').count()
}
