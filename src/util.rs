use itertools::Itertools;


pub fn sort_two<T: Ord>((a, b): (T, T)) -> (T, T) {
    if a < b { (a, b) } else { (b, a) }
}

// If a string consists of a single character, returns the character. Otherwise returns none.
pub fn as_single_char(s: &str) -> Option<char> {
    s.chars().collect_tuple().map(|(single_char,)| single_char)
}
