/// Where a wrong guess is shown on a timeline of `len` songs.
///
/// A missing index counts as 0. Anything outside `0..=len` is appended at
/// the end instead of being rejected.
pub fn wrong_guess_position(last_index: Option<i64>, len: usize) -> usize {
    let index = last_index.unwrap_or(0);
    match usize::try_from(index) {
        Ok(i) if i <= len => i,
        _ => len,
    }
}
