//! The chat widget page.

use maud::{DOCTYPE, Markup, PreEscaped, html};

const SCRIPT: &str = include_str!("../assets/widget.js");
const STYLE: &str = include_str!("../assets/widget.css");

/// Client-side request timeout, in milliseconds.
const TIMEOUT_MS: u64 = 120_000;

/// Render the chat page.
///
/// `max_bytes` is the largest file the widget accepts before encoding it.
#[must_use]
pub fn render(max_bytes: usize) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Parley" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                main #chat data-max-bytes=(max_bytes) data-timeout-ms=(TIMEOUT_MS) {
                    header {
                        h1 { "Parley" }
                        button #new-chat type="button" { "New chat" }
                    }
                    section #messages aria-live="polite" {}
                    p #status role="status" {}
                    form #composer {
                        textarea #prompt name="prompt" rows="3" placeholder="Ask something..." {}
                        div.controls {
                            input #file type="file" name="file";
                            button #send type="submit" { "Send" }
                        }
                    }
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_embeds_widget_and_limits() {
        let page = render(10 * 1024 * 1024).into_string();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(r#"data-max-bytes="10485760""#));
        assert!(page.contains(r#"data-timeout-ms="120000""#));
        assert!(page.contains("AbortController"));
        assert!(page.contains(parley_format::COPY_MARKER));
    }
}
