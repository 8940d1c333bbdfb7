//! HTML formatting for card faces
//!
//! Two cards are created per word:
//! - image → word: front shows only the image, back shows the word then the content
//! - word → image: front shows only the word, back shows the image then the content

const IMAGE_STYLE: &str = "max-width: 100%; height: auto;";
const WORD_STYLE: &str = "color: #0000FF; font-weight: bold; font-size: 20px;";

/// Which side of the association is asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardDirection {
    /// Image on the front, word and content on the back
    ImageToWord,
    /// Word on the front, image and content on the back
    WordToImage,
}

impl CardDirection {
    pub const ALL: [CardDirection; 2] = [CardDirection::ImageToWord, CardDirection::WordToImage];

    pub fn label(&self) -> &'static str {
        match self {
            CardDirection::ImageToWord => "image → word",
            CardDirection::WordToImage => "word → image",
        }
    }
}

pub fn front_image(image_filename: &str) -> String {
    format!(r#"<img src="{}" style="{}">"#, image_filename, IMAGE_STYLE)
}

pub fn front_word(word: &str) -> String {
    format!(r#"<span style="{}">{}</span>"#, WORD_STYLE, word)
}

/// Back of a card
///
/// With the image: image, a single line break, content.
/// Without: the word, a blank line, content.
pub fn back(word: &str, content: &str, image_filename: &str, include_image: bool) -> String {
    let content_html = format_content(content);

    if include_image {
        format!("{}<br>{}", front_image(image_filename), content_html)
    } else {
        format!("{}<br><br>{}", front_word(word), content_html)
    }
}

/// Front and back for one direction
pub fn complete_card(
    direction: CardDirection,
    word: &str,
    content: &str,
    image_filename: &str,
) -> (String, String) {
    match direction {
        CardDirection::ImageToWord => (
            front_image(image_filename),
            back(word, content, image_filename, false),
        ),
        CardDirection::WordToImage => (
            front_word(word),
            back(word, content, image_filename, true),
        ),
    }
}

/// Plain text to HTML keeping line structure
///
/// Lines of a paragraph are joined with `<br>`, paragraphs (separated by
/// blank lines) with `<br><br>`. Leading and trailing blank lines are dropped.
pub fn format_content(content: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in content.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("<br>"));
                current.clear();
            }
        } else {
            current.push(escape_html(line));
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("<br>"));
    }

    blocks.join("<br><br>")
}

/// Escape only angle brackets; the model does not produce HTML
fn escape_html(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
