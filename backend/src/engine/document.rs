//! In-memory form of a slide deck.

use crate::engine::ports::{ContentDocument, ContentSurface};

/// Line separating slides in the stored text form.
pub const SLIDE_SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slide {
    pub text: String,
}

impl ContentSurface for Slide {
    fn text(&self) -> &str {
        &self.text
    }

    fn replace_all_occurrences(&mut self, token: &str, replacement: &str) -> usize {
        if token.is_empty() {
            return 0;
        }
        let count = self.text.matches(token).count();
        if count > 0 {
            self.text = self.text.replace(token, replacement);
        }
        count
    }
}

/// A deck of slides, each one a content surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Presentation {
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Split stored template text into slides on `---` lines.
    pub fn parse(text: &str) -> Self {
        let mut slides = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in text.lines() {
            if line.trim_end() == SLIDE_SEPARATOR {
                slides.push(Slide {
                    text: current.join("\n"),
                });
                current.clear();
            } else {
                current.push(line);
            }
        }
        slides.push(Slide {
            text: current.join("\n"),
        });
        Self { slides }
    }

    pub fn to_text(&self) -> String {
        self.slides
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(&format!("\n{}\n", SLIDE_SEPARATOR))
    }
}

impl ContentDocument for Presentation {
    type Surface = Slide;

    fn content_surfaces_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }
}
