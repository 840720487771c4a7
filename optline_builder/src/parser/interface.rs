use crate::parser::base::ParseError;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

// Target 95% of the total width, so the renderer doesn't literally use the full space.
const TARGET_TOTAL_FACTOR: f64 = 0.95;

// Assuming an average word length of 5, 17 allows precisely 3 words with a space between them.
pub(crate) const MINIMUM_DESCRIPTION_WIDTH: usize = 17;

/// Renders help rows as a left column (ex: option flags) and a word wrapped description column.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ColumnRenderer {
    padding: usize,
    left: usize,
    description: usize,
}

impl ColumnRenderer {
    /// Produce a renderer whose description column fits the total width, when possible.
    pub(crate) fn guided(padding: usize, left: usize, description: usize, total: usize) -> Self {
        let non_description = left + padding;
        let target_total = (total as f64 * TARGET_TOTAL_FACTOR) as usize;
        let guided_description = std::cmp::max(description, MINIMUM_DESCRIPTION_WIDTH);

        if guided_description + non_description <= target_total {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Columns {non_description} and description fit within the target total {target_total}.  Selecting description: {guided_description}.");
            }

            Self::new(padding, left, guided_description)
        } else if non_description < total {
            let calculated = std::cmp::max(total - non_description, MINIMUM_DESCRIPTION_WIDTH);
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Columns {non_description} fit within the total {total}.  Selecting description: {calculated}.");
            }

            Self::new(padding, left, calculated)
        } else {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Columns {non_description} do not fit within the total {total}.  Selecting description: {MINIMUM_DESCRIPTION_WIDTH}.");
            }

            Self::new(padding, left, MINIMUM_DESCRIPTION_WIDTH)
        }
    }

    pub(crate) fn new(padding: usize, left: usize, description: usize) -> Self {
        Self {
            padding,
            left,
            // The description must leave room to hyphenate.
            description: std::cmp::max(description, 2),
        }
    }

    pub(crate) fn render(&self, indent: usize, left: &str, description: &str) -> Vec<String> {
        let left_width = self.left;
        let padding = format!("{:width$}", "", width = self.padding);
        let parts = chunk(description, self.description);
        let mut out = Vec::default();

        for (i, part) in parts.iter().enumerate() {
            let left = if i == 0 { left } else { "" };
            out.push(format!("{:indent$}{left:left_width$}{padding}{part}", ""));
        }

        if out.is_empty() {
            out.push(format!("{:indent$}{left}", ""));
        }

        out
    }

    pub(crate) fn width(&self) -> usize {
        self.left + self.padding + self.description
    }
}

/// Split the paragraph into lines of at most `width` characters, breaking at spaces and hyphenating overlong words.
pub(crate) fn chunk(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::default();
    let mut current = String::default();

    for word in paragraph.split(' ').filter(|word| !word.is_empty()) {
        if current.is_empty() {
            hyphenate(width, &mut lines, &mut current, word);
        } else if current.chars().count() + word.chars().count() < width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            hyphenate(width, &mut lines, &mut current, word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn hyphenate(width: usize, lines: &mut Vec<String>, current: &mut String, word: &str) {
    let chars: Vec<char> = word.chars().collect();
    let increment = width.saturating_sub(1).max(1);
    let mut left = 0;

    while chars.len() - left > width {
        let piece: String = chars[left..left + increment].iter().collect();
        lines.push(format!("{piece}-"));
        left += increment;
    }

    current.extend(&chars[left..]);
}

/// Points at the token where a parse failed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ErrorContext {
    offset: usize,
    tokens: Vec<String>,
}

impl ErrorContext {
    pub(crate) fn new(offset: usize, tokens: &[String]) -> Self {
        Self {
            offset,
            tokens: tokens.to_vec(),
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let projection = self.tokens.join(" ");
        let offset = self
            .tokens
            .iter()
            .take(self.offset)
            .map(|token| token.chars().count() + 1)
            .sum::<usize>();
        let width = std::cmp::min(offset, projection.chars().count().saturating_sub(1));

        write!(f, "{projection}\n{:width$}^", "")
    }
}

pub(crate) trait UserInterface {
    fn print(&self, message: String);
    fn print_error(&self, error: ParseError);
    fn print_error_context(&self, error_context: ErrorContext);
}

#[derive(Default)]
pub(crate) struct ConsoleInterface {}

impl UserInterface for ConsoleInterface {
    fn print(&self, message: String) {
        println!("{message}");
    }

    fn print_error(&self, error: ParseError) {
        eprintln!("{error}");
    }

    fn print_error_context(&self, error_context: ErrorContext) {
        eprintln!("{error_context}");
    }
}
