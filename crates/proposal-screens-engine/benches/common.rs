// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_screen(sections: usize) -> String {
    let mut html = String::from(
        "<style>:root { --slide-w: 1440px; --slide-h: 1024px; }</style>\n<main class=\"screen\">\n",
    );
    for section in 0..sections {
        html.push_str(&format!(
            "  <section id=\"s{section}\">\n    <h2>Section {section}</h2>\n    \
             <p>Intro text with <strong>bold</strong> words<br>and a second line.</p>\n    \
             <div class=\"card\">Loose card text <span style=\"color:red\">accent</span> tail<br></div>\n    \
             <ul>\n      <li>First <em>point</em></li>\n      <li>Second point</li>\n    </ul>\n    \
             <img src=\"img/{section}.png\" alt=\"Figure {section}\">\n  </section>\n"
        ));
    }
    html.push_str("</main>\n");
    html
}
