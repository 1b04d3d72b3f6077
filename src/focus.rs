/// A word split around its Optimal Recognition Point.
///
/// `before` is rendered right-aligned against the focus character, `after`
/// flows to the right of it, so the focus character stays in a fixed column
/// while words change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusSplit<'a> {
    pub before: &'a str,
    pub focus: char,
    pub after: &'a str,
    /// Position of `focus` within the word, counted in chars
    pub focus_index: usize,
}

/// Focus position for a word of `len` chars
pub fn focus_index_for_len(len: usize) -> usize {
    match len {
        0..=1 => 0,
        2..=5 => 1,
        6..=9 => 2,
        10..=13 => 3,
        _ => 4,
    }
}

/// Split `word` around its focus character.
///
/// Returns `None` for an empty word; word sequences never contain those.
pub fn compute_focus(word: &str) -> Option<FocusSplit<'_>> {
    let focus_index = focus_index_for_len(word.chars().count());
    let (start, focus) = word.char_indices().nth(focus_index)?;
    let end = start + focus.len_utf8();

    Some(FocusSplit {
        before: &word[..start],
        focus,
        after: &word[end..],
        focus_index,
    })
}
