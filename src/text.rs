use heapless::String;

/// Copy `src` into a fixed-capacity string, dropping whatever does not fit.
///
/// Truncation happens on a `char` boundary so the result is always valid
/// UTF-8, which means it can end up to three bytes short of `N`.
pub fn truncate_into<const N: usize>(src: &str) -> String<N> {
    let mut out = String::new();
    push_truncated(&mut out, src);
    out
}

/// Append as much of `src` as fits. Returns `false` if anything was dropped.
pub fn push_truncated<const N: usize>(out: &mut String<N>, src: &str) -> bool {
    if out.push_str(src).is_ok() {
        return true;
    }
    for c in src.chars() {
        if out.push(c).is_err() {
            return false;
        }
    }
    true
}

/// `core::fmt::Write` sink that silently truncates instead of failing.
///
/// Handy for `write!`-ing `Display` values (error messages, paths) into a
/// bounded buffer where a short result is preferable to no result.
pub struct Truncating<'a, const N: usize> {
    out: &'a mut String<N>,
    truncated: bool,
}

impl<'a, const N: usize> Truncating<'a, N> {
    pub fn new(out: &'a mut String<N>) -> Self {
        Self {
            out,
            truncated: false,
        }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<const N: usize> core::fmt::Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        if !self.truncated && !push_truncated(self.out, s) {
            self.truncated = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write as _;

    #[test]
    fn short_strings_are_copied_whole() {
        let s: String<8> = truncate_into("abc");
        assert_eq!(s, "abc");
    }

    #[test]
    fn long_strings_are_cut_to_capacity() {
        let s: String<4> = truncate_into("Testville");
        assert_eq!(s, "Test");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; the second one would not fit.
        let s: String<4> = truncate_into("abcé");
        assert_eq!(s, "abc");
        assert!(s.len() <= 4);
    }

    #[test]
    fn truncating_writer_keeps_prefix() {
        let mut s: String<10> = String::new();
        let mut w = Truncating::new(&mut s);
        let _ = write!(w, "HTTP Error: {}", 404);
        assert!(w.truncated());
        assert_eq!(s, "HTTP Error");
    }

    #[test]
    fn truncating_writer_stops_after_first_overflow() {
        let mut s: String<3> = String::new();
        let mut w = Truncating::new(&mut s);
        let _ = write!(w, "abcd{}", "e");
        assert_eq!(s, "abc");
    }
}
