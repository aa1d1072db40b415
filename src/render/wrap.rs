//! Greedy word wrap.
//!
//! Explicit newlines always break. Within a line, words are separated by
//! single spaces and appended while the measured line stays strictly
//! narrower than the limit. A word that is wider than the limit on its own
//! keeps a line to itself; words are never split.

/// Wrap `text` to `max_width` using `measure` for line widths.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    text.split('\n')
        .flat_map(|line| wrap_line(line, max_width, &measure))
        .collect()
}

/// Wrap a single line (no newlines). Always yields at least one line.
fn wrap_line(line: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    let mut words = line.split(' ');
    let mut lines = Vec::new();
    let mut current = words.next().unwrap_or_default().to_string();

    for word in words {
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) < max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    lines.push(current);
    lines
}
