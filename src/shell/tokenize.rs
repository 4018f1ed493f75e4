/// Splits raw input lines into argument vectors
///
/// Quoting is a stateless toggle: every `"` flips the quoted flag and is
/// dropped, and an unterminated quote simply runs to the end of the line.
/// An unquoted `~` expands inline to the home directory.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    home: String,
}

impl Tokenizer {
    pub fn new(home: impl Into<String>) -> Self {
        Self { home: home.into() }
    }

    /// Tokenize one line into its arguments
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut quoted = false;

        for ch in line.chars() {
            match ch {
                '"' => quoted = !quoted,
                '~' if !quoted => current.push_str(&self.home),
                ' ' if !quoted => {
                    if !current.is_empty() {
                        args.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            args.push(current);
        }

        args
    }
}

/// Return the raw remainder of a line after its first unquoted token
///
/// Leading spaces are skipped; the remainder keeps its separating space so it
/// can be appended directly to an alias expansion.
pub fn strip_leading_token(line: &str) -> &str {
    let trimmed = line.trim_start_matches(' ');
    let mut quoted = false;

    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ' ' if !quoted => return &trimmed[idx..],
            _ => {}
        }
    }

    ""
}
