//! Per-file acceptance rules.

use crate::config::{AcceptRule, UploadMessages};
use crate::escape_html;
use crate::file::FileDescriptor;

/// Result of validating one batch of files.
#[derive(Clone, Debug)]
pub struct ValidationOutcome<H> {
    /// Files that passed every rule, in input order.
    pub accepted: Vec<FileDescriptor<H>>,
    /// Display names (after rewrite) of the accepted files.
    pub uploading: Vec<String>,
    /// One line per failed rule, in input order. Plain text.
    pub diagnostics: Vec<String>,
    /// Number of files that contributed at least one diagnostic.
    pub rejected: usize,
}

impl<H> ValidationOutcome<H> {
    /// `<ul>` of diagnostics followed by an "uploading" line per accepted file.
    pub fn report_html(&self, messages: &UploadMessages) -> String {
        let mut html = String::from("<ul>");
        for line in &self.diagnostics {
            html.push_str("<li>");
            html.push_str(&escape_html(line));
            html.push_str("</li>");
        }
        for name in &self.uploading {
            html.push_str("<li>");
            html.push_str(&escape_html(name));
            html.push(' ');
            html.push_str(&escape_html(&messages.uploading));
            html.push_str("</li>");
        }
        html.push_str("</ul>");
        html
    }
}

/// Check every file against `rule`.
///
/// Rules are independent: a file can fail several and each failure adds its
/// own line. Files with no failures are accepted.
pub fn validate<H>(
    files: Vec<FileDescriptor<H>>,
    rule: &AcceptRule,
    messages: &UploadMessages,
) -> ValidationOutcome<H> {
    let tokens = rule.accept_tokens();
    let mut outcome = ValidationOutcome {
        accepted: Vec::with_capacity(files.len()),
        uploading: Vec::new(),
        diagnostics: Vec::new(),
        rejected: 0,
    };

    for file in files {
        let before = outcome.diagnostics.len();

        if file.name.is_empty() {
            outcome.diagnostics.push(messages.name_empty.clone());
        }

        if file.size > rule.max {
            outcome.diagnostics.push(format!(
                "{} {} {}M",
                file.name,
                messages.over,
                megabytes(rule.max)
            ));
        }

        if let Some(tokens) = &tokens {
            if !tokens.iter().any(|token| token_matches(token, &file)) {
                outcome
                    .diagnostics
                    .push(format!("{} {}", file.name, messages.file_type_error));
            }
        }

        if outcome.diagnostics.len() == before {
            outcome.uploading.push(rule.filename.display_name(&file.name));
            outcome.accepted.push(file);
        } else {
            tracing::debug!(
                target: "weaver::upload",
                name = %file.name,
                size = file.size,
                mime = %file.mime_type,
                failures = outcome.diagnostics.len() - before,
                "file rejected"
            );
            outcome.rejected += 1;
        }
    }

    outcome
}

/// `.ext` tokens match the extension; anything else matches the top-level
/// MIME type. Both case-insensitive.
fn token_matches<H>(token: &str, file: &FileDescriptor<H>) -> bool {
    if token.starts_with('.') {
        file.extension().eq_ignore_ascii_case(token)
    } else {
        let top = token.split('/').next().unwrap_or_default();
        file.top_level_type().eq_ignore_ascii_case(top)
    }
}

fn megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / 1024.0 / 1024.0;
    format!("{mb}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilenameRewrite;

    fn file(name: &str, size: u64, mime: &str) -> FileDescriptor<()> {
        FileDescriptor::new(name, size, mime, ())
    }

    fn rule(max: u64, accept: Option<&str>) -> AcceptRule {
        AcceptRule {
            max,
            accept: accept.map(str::to_string),
            multiple: true,
            filename: FilenameRewrite::identity(),
        }
    }

    #[test]
    fn test_empty_name_always_diagnosed() {
        let messages = UploadMessages::default();
        let out = validate(vec![file("", 0, "")], &rule(100, None), &messages);
        assert!(out.accepted.is_empty());
        assert_eq!(out.diagnostics, ["name empty"]);
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn test_size_boundary() {
        let messages = UploadMessages::default();
        let max = 2 * 1024 * 1024;
        let out = validate(
            vec![file("exact.bin", max, ""), file("big.bin", max + 1, "")],
            &rule(max, None),
            &messages,
        );
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.accepted[0].name, "exact.bin");
        assert_eq!(out.diagnostics, ["big.bin over 2M"]);
    }

    #[test]
    fn test_fractional_megabytes() {
        assert_eq!(megabytes(512 * 1024), "0.5");
        assert_eq!(megabytes(10 * 1024 * 1024), "10");
    }

    #[test]
    fn test_accept_extension_and_mime() {
        let messages = UploadMessages::default();
        let out = validate(
            vec![
                file("a.PNG", 1, "application/octet-stream"),
                file("b.jpg", 1, "image/jpeg"),
                file("c.gif", 1, "image/gif"),
            ],
            &rule(100, Some(".png,image/jpeg")),
            &messages,
        );
        let names: Vec<_> = out.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.PNG", "b.jpg"]);
        assert_eq!(out.diagnostics, ["c.gif file type error"]);
    }

    #[test]
    fn test_mime_token_compares_top_level_only() {
        let messages = UploadMessages::default();
        let out = validate(
            vec![file("clip.wav", 1, "AUDIO/wav")],
            &rule(100, Some("audio/*")),
            &messages,
        );
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn test_failures_accumulate_per_file() {
        let messages = UploadMessages::default();
        let out = validate(
            vec![file("", 500, "text/plain")],
            &rule(100, Some(".png")),
            &messages,
        );
        assert_eq!(out.diagnostics.len(), 3);
        assert_eq!(out.rejected, 1);
    }

    #[test]
    fn test_validation_is_total() {
        let messages = UploadMessages::default();
        let files = vec![
            file("", 1, ""),
            file("ok.png", 1, "image/png"),
            file("big.png", 1000, "image/png"),
            file("doc.pdf", 1, "application/pdf"),
            file("also-ok.PNG", 100, "image/png"),
        ];
        let count = files.len();
        let out = validate(files, &rule(100, Some(".png")), &messages);
        assert_eq!(out.accepted.len() + out.rejected, count);
        assert_eq!(out.uploading.len(), out.accepted.len());
    }

    #[test]
    fn test_uploading_names_are_rewritten() {
        let messages = UploadMessages::default();
        let rule = AcceptRule {
            filename: FilenameRewrite::new(|s| s.replace(' ', "_")),
            ..rule(100, None)
        };
        let out = validate(vec![file("my cat.png", 1, "image/png")], &rule, &messages);
        assert_eq!(out.uploading, ["my_cat.png"]);
        assert_eq!(out.accepted[0].name, "my cat.png");
    }

    #[test]
    fn test_report_html() {
        let messages = UploadMessages::default();
        let out = validate(
            vec![file("<x>.exe", 1, ""), file("ok.png", 1, "image/png")],
            &rule(100, Some(".png")),
            &messages,
        );
        insta::assert_snapshot!(
            out.report_html(&messages),
            @"<ul><li>&lt;x&gt;.exe file type error</li><li>ok.png uploading</li></ul>"
        );
    }
}
