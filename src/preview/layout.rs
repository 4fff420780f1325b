//! Text layout for placeholder canvases

/// Greedy word wrap.
///
/// Words are packed onto the current line while `measure` of the line stays within
/// `max_width`. A word wider than `max_width` on its own gets a line to itself and is
/// not split.
pub fn wrap_words<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Vertical positions of lines laid out from `top` with a fixed `line_height`,
/// keeping only lines whose top edge lies inside a canvas of `canvas_height`
pub fn visible_line_tops(count: usize, top: u32, line_height: u32, canvas_height: u32) -> Vec<u32> {
    (0..count as u32)
        .map(|i| top + i * line_height)
        .take_while(|&y| y < canvas_height)
        .collect()
}
