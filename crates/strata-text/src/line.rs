/// One normalized, non-empty line split into key and value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub key: String,
    pub value: String,
}

impl Line {
    pub fn is_open(&self) -> bool {
        self.key == "{"
    }

    pub fn is_close(&self) -> bool {
        self.key == "}"
    }
}

/// Trim, turn tabs into spaces, and collapse runs of spaces to one.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    let mut out = String::with_capacity(trimmed.len());
    let mut last_space = false;
    for c in trimmed.chars() {
        let c = if c == '\t' { ' ' } else { c };
        if c == ' ' {
            if last_space {
                continue;
            }
            last_space = true;
        } else {
            last_space = false;
        }
        out.push(c);
    }
    out
}

/// Split a raw line. Empty lines yield `None`.
///
/// A single-character line is its own key. Otherwise the key runs up to the
/// first space and the value is everything after it.
pub fn split(raw: &str) -> Option<Line> {
    let line = normalize(raw);
    if line.is_empty() {
        return None;
    }
    if line.chars().count() == 1 {
        return Some(Line {
            key: line,
            value: String::new(),
        });
    }
    let (key, value) = match line.split_once(' ') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (line, String::new()),
    };
    Some(Line { key, value })
}

/// Iterator over the non-empty lines of a text blob, with 1-based numbers.
pub(crate) struct LineReader<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LineReader<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }
}

impl Iterator for LineReader<'_> {
    type Item = (usize, Line);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find_map(|(n, raw)| split(raw).map(|line| (n + 1, line)))
    }
}
