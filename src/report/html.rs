//! Standalone HTML side-by-side report

use crate::config::SideBySideLayout;
use crate::diff::side_by_side;

/// Escape text for HTML element and attribute content
pub fn html_escape(s: impl AsRef<str>) -> String {
    s.as_ref()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"    <style>
      :root { color-scheme: light; }
      body { margin: 24px; font-family: ui-monospace, SFMono-Regular, Menlo, Monaco, Consolas, "Liberation Mono", "Courier New", monospace; color: #1f2328; background: #ffffff; }
      h1 { margin: 0 0 12px 0; font-size: 22px; }
      h2 { margin: 24px 0 8px 0; font-size: 16px; }
      p { margin: 0 0 12px 0; font-size: 13px; }
      code { background: #f6f8fa; border-radius: 4px; padding: 1px 4px; }
      pre.sbs { margin: 0 0 16px 0; padding: 12px; overflow-x: auto; overflow-y: hidden; border: 1px solid #d0d7de; border-radius: 6px; background: #f6f8fa; line-height: 1.35; }
      .sbs-scale { display: block; width: max-content; min-width: 100%; transform-origin: left top; }
      .left { color: #cf222e; }
      .right { color: #1a7f37; }
      .sep { color: #656d76; }
    </style>
"#;

// Shrinks slightly-too-wide blocks to fit; wider ones keep their scrollbar.
const FIT_SCRIPT: &str = r"    <script>
      function fitSideBySideDiffs() {
        const blocks = document.querySelectorAll('pre.sbs');
        for (const pre of blocks) {
          const scaleNode = pre.querySelector('.sbs-scale');
          if (!scaleNode) {
            continue;
          }
          scaleNode.style.transform = '';
          pre.style.height = '';
          pre.style.overflowX = 'auto';
          pre.style.overflowY = 'hidden';
          const available = pre.clientWidth;
          const needed = scaleNode.scrollWidth;
          if (!available || !needed || needed <= available) {
            continue;
          }
          const scale = available / needed;
          if (scale < 0.90) {
            continue;
          }
          scaleNode.style.transform = 'scale(' + scale + ')';
          pre.style.height = Math.ceil((scaleNode.scrollHeight * scale) + 24) + 'px';
          pre.style.overflowX = 'hidden';
        }
      }
      function scheduleFit() {
        fitSideBySideDiffs();
        window.requestAnimationFrame(fitSideBySideDiffs);
        window.setTimeout(fitSideBySideDiffs, 120);
      }
      window.addEventListener('load', scheduleFit);
      window.addEventListener('resize', fitSideBySideDiffs);
    </script>
";

/// Accumulates the HTML document one flow at a time
#[derive(Debug, Clone)]
pub struct HtmlReport {
    body: String,
    layout: SideBySideLayout,
}

impl HtmlReport {
    /// Start a document comparing `base` with `head`
    #[must_use]
    pub fn new(base: &str, head: &str, layout: SideBySideLayout) -> Self {
        let mut body = String::from(
            "<!doctype html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"utf-8\" />\n    \
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n    \
             <title>flow2apex Side-By-Side Diff</title>\n",
        );
        body.push_str(STYLE);
        body.push_str(FIT_SCRIPT);
        body.push_str("  </head>\n  <body>\n    <h1>flow2apex Side-By-Side Diffs</h1>\n");
        body.push_str(&format!(
            "    <p>Compared generated Apex between base <code>{}</code> and head <code>{}</code>.</p>\n",
            html_escape(base),
            html_escape(head)
        ));
        Self { body, layout }
    }

    fn heading(&mut self, flow_path: &str) {
        self.body
            .push_str(&format!("    <h2>{}</h2>\n", html_escape(flow_path)));
    }

    /// Add a colorized diff block for `flow_path`.
    ///
    /// `diff_text` is the unsuppressed side-by-side output.
    pub fn push_diff(&mut self, flow_path: &str, diff_text: &str) {
        self.heading(flow_path);
        self.body.push_str("    <pre class=\"sbs\"><span class=\"sbs-scale\">");
        self.body
            .push_str(&side_by_side::to_html(diff_text, &self.layout));
        self.body.push_str("</span></pre>\n");
    }

    /// Add a plain notice paragraph for `flow_path`
    pub fn push_notice(&mut self, flow_path: &str, notice: &str) {
        self.heading(flow_path);
        self.body
            .push_str(&format!("    <p>{}</p>\n", html_escape(notice)));
    }

    /// Close the document
    #[must_use]
    pub fn finish(mut self) -> String {
        self.body.push_str("  </body>\n</html>\n");
        self.body
    }
}
