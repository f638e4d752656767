#[derive(Clone, Copy)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment,
}

pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    (bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')) || bytes[idx] == b'#'
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Advance past a closing quote, treating a doubled quote as an escaped one.
/// Returns the new index and whether the quoted section ended.
pub(super) fn close_quote(bytes: &[u8], idx: usize, quote: u8) -> (usize, bool) {
    if bytes[idx] != quote {
        return (idx, false);
    }
    if bytes.get(idx + 1) == Some(&quote) {
        (idx + 1, false)
    } else {
        (idx, true)
    }
}
