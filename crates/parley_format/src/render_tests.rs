use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;

struct TestCase {
    input: &'static str,
    output: &'static str,
}

#[expect(clippy::needless_pass_by_value)]
fn run_test(name: &str, case: TestCase) {
    assert_eq!(to_html(case.input), case.output, "failed case: {name}");
}

/// Extract and unescape the copy attribute of the first code block.
fn copy_attribute(html: &str) -> Option<String> {
    let start = html.find(&format!("{COPY_ATTRIBUTE}=\""))? + COPY_ATTRIBUTE.len() + 2;
    let end = start + html[start..].find('"')?;

    Some(
        html[start..end]
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&"),
    )
}

#[test]
fn test_html_paragraphs() {
    let cases = vec![
        ("plain", TestCase {
            input: "Hello, world",
            output: "<p>Hello, world</p>",
        }),
        ("per line", TestCase {
            input: "line one\nline two\n",
            output: "<p>line one</p><p>line two</p>",
        }),
        ("trimmed", TestCase {
            input: "   padded   ",
            output: "<p>padded</p>",
        }),
        ("empty", TestCase {
            input: "",
            output: "",
        }),
    ];

    for (name, case) in cases {
        run_test(name, case);
    }
}

#[test]
fn test_html_inline() {
    let cases = vec![
        ("code", TestCase {
            input: "Use `Vec::new()` here",
            output: r#"<p>Use <code class="inline-code">Vec::new()</code> here</p>"#,
        }),
        ("bold", TestCase {
            input: "This is **important**!",
            output: "<p>This is <strong>important</strong>!</p>",
        }),
        ("bold code", TestCase {
            input: "**Run `make`**",
            output: r#"<p><strong>Run <code class="inline-code">make</code></strong></p>"#,
        }),
    ];

    for (name, case) in cases {
        run_test(name, case);
    }
}

#[test]
fn test_html_lists() {
    let cases = vec![
        ("unordered", TestCase {
            input: "* a\n* `b`",
            output: r#"<ul class="chat-list"><li>a</li><li><code class="inline-code">b</code></li></ul>"#,
        }),
        ("ordered", TestCase {
            input: "1. First\n2. **Second**",
            output: concat!(
                r#"<ol class="chat-list">"#,
                "<li><strong>1.</strong> First</li>",
                "<li><strong>2.</strong> <strong>Second</strong></li>",
                "</ol>",
            ),
        }),
        ("mixed", TestCase {
            input: "Steps:\n1. go\n* note",
            output: concat!(
                "<p>Steps:</p>",
                r#"<ol class="chat-list"><li><strong>1.</strong> go</li></ol>"#,
                r#"<ul class="chat-list"><li>note</li></ul>"#,
            ),
        }),
    ];

    for (name, case) in cases {
        run_test(name, case);
    }
}

#[test]
fn test_html_code_block() {
    let html = to_html("```python\nprint(1)\n```");

    assert_eq!(
        html,
        concat!(
            r#"<div class="code-block"><pre><code>"#,
            "<span class=\"code-lang\">\u{27e8} \u{27e9} python</span>print(1)",
            "</code></pre>",
            r#"<button class="copy-btn" type="button" data-code="print(1)">Copy</button>"#,
            "</div>",
        )
    );
    assert_eq!(copy_attribute(&html).as_deref(), Some("print(1)"));
}

#[test]
fn test_html_code_block_without_language() {
    assert_eq!(
        to_html("```\nx = 1\n```"),
        concat!(
            r#"<div class="code-block"><pre><code>x = 1</code></pre>"#,
            r#"<button class="copy-btn" type="button" data-code="x = 1">Copy</button>"#,
            "</div>",
        )
    );
}

#[test]
fn test_html_copy_attribute_round_trips_special_characters() {
    let code = r#"if a < b && c > "d" { println!("{a}"); }"#;
    let html = to_html(&format!("```rust\n{code}\n```"));

    assert!(!html.contains("a < b"), "visible code must be escaped: {html}");
    assert_eq!(copy_attribute(&html).as_deref(), Some(code));
}

#[test]
fn test_html_escapes_text_nodes() {
    let input = indoc! {r#"
        <script>alert("x")</script>
        * <b>item</b>
        **<i>bold</i>**
        `<code>`
    "#};

    let html = to_html(input);

    assert_eq!(
        html,
        concat!(
            "<p>&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;</p>",
            r#"<ul class="chat-list"><li>&lt;b&gt;item&lt;/b&gt;</li></ul>"#,
            "<p><strong>&lt;i&gt;bold&lt;/i&gt;</strong></p>",
            r#"<p><code class="inline-code">&lt;code&gt;</code></p>"#,
        )
    );
}

#[test]
fn test_html_markers_inside_code_block_stay_literal() {
    let html = to_html("```md\n* item\n**bold**\n```");

    assert!(!html.contains("<li>"), "{html}");
    assert!(!html.contains("<strong>"), "{html}");
    assert_eq!(copy_attribute(&html).as_deref(), Some("* item\n**bold**"));
}
