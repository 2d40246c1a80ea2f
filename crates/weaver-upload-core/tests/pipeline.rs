//! End-to-end pipeline tests against an in-memory editor.

use std::cell::{Cell, RefCell};
use std::future::{Future, ready};

use bytes::Bytes;
use tokio::sync::oneshot;
use weaver_upload_core::{
    Completion, CompletionContext, EditorMode, EditorPlatform, FileDescriptor, HandlerOutcome,
    PlatformError, RawFile, RenderCompletion, Transport, TransportError, UploadConfig, UploadError,
    UploadHooks, UploadSummary, Uploader,
};

/// Editor whose document is a string and whose selection is a caret offset.
struct MockEditor {
    mode: Cell<EditorMode>,
    doc: RefCell<String>,
    caret: Cell<usize>,
    editable: Cell<bool>,
    tip: RefCell<Option<String>>,
    progress: RefCell<Vec<f64>>,
    progress_visible: Cell<bool>,
    input_resets: Cell<usize>,
}

impl MockEditor {
    fn new(doc: &str, caret: usize, mode: EditorMode) -> Self {
        Self {
            mode: Cell::new(mode),
            doc: RefCell::new(doc.to_string()),
            caret: Cell::new(caret),
            editable: Cell::new(true),
            tip: RefCell::new(None),
            progress: RefCell::new(Vec::new()),
            progress_visible: Cell::new(false),
            input_resets: Cell::new(0),
        }
    }

    fn doc(&self) -> String {
        self.doc.borrow().clone()
    }

    fn tip(&self) -> Option<String> {
        self.tip.borrow().clone()
    }
}

impl EditorPlatform for MockEditor {
    type Range = usize;

    fn mode(&self) -> EditorMode {
        self.mode.get()
    }

    fn capture_range(&self) -> Option<usize> {
        Some(self.caret.get())
    }

    fn restore_range(&self, range: &usize) -> Result<(), PlatformError> {
        if *range > self.doc.borrow().len() {
            return Err("range outside document".into());
        }
        self.caret.set(*range);
        Ok(())
    }

    fn focus(&self) {}

    fn insert_html(&self, html: &str) -> Result<(), PlatformError> {
        if !self.editable.get() {
            return Err("root is not editable".into());
        }
        let at = self.caret.get();
        self.doc.borrow_mut().insert_str(at, html);
        self.caret.set(at + html.len());
        Ok(())
    }

    fn set_editable(&self, editable: bool) {
        self.editable.set(editable);
    }

    fn show_tip(&self, html: &str) {
        *self.tip.borrow_mut() = Some(html.to_string());
    }

    fn hide_tip(&self) {
        *self.tip.borrow_mut() = None;
    }

    fn show_progress(&self, fraction: f64) {
        self.progress_visible.set(true);
        self.progress.borrow_mut().push(fraction);
    }

    fn hide_progress(&self) {
        self.progress_visible.set(false);
    }

    fn reset_file_input(&self) {
        self.input_resets.set(self.input_resets.get() + 1);
    }
}

/// Replies with a canned result. While "in flight" it moves the caret to the
/// end and appends text, like a user typing elsewhere.
struct CannedTransport<'a> {
    editor: &'a MockEditor,
    reply: Result<String, TransportError>,
    ticks: Vec<f64>,
    sent: RefCell<Vec<String>>,
    locked_during_send: Cell<Option<bool>>,
}

impl<'a> CannedTransport<'a> {
    fn new(editor: &'a MockEditor, reply: Result<String, TransportError>) -> Self {
        Self {
            editor,
            reply,
            ticks: vec![0.25, 0.75, 1.0],
            sent: RefCell::new(Vec::new()),
            locked_during_send: Cell::new(None),
        }
    }
}

impl Transport<Bytes> for CannedTransport<'_> {
    type Response = String;

    fn send(
        &self,
        files: &[FileDescriptor<Bytes>],
        _config: &UploadConfig,
        on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<String, TransportError>> {
        self.sent
            .borrow_mut()
            .extend(files.iter().map(|f| f.name.clone()));
        self.locked_during_send.set(Some(!self.editor.editable.get()));
        for tick in &self.ticks {
            on_progress(*tick);
        }
        let len = self.editor.doc.borrow().len();
        self.editor.caret.set(len);
        self.editor.doc.borrow_mut().push_str(" (typed meanwhile)");
        ready(self.reply.clone())
    }
}

fn config() -> UploadConfig {
    UploadConfig {
        url: Some("https://example.test/upload".into()),
        ..Default::default()
    }
}

fn png(name: &str) -> RawFile<Bytes> {
    RawFile::from(FileDescriptor::new(
        name,
        4,
        "image/png",
        Bytes::from_static(b"\x89PNG"),
    ))
}

const ONE_IMAGE: &str = r#"{"code":0,"msg":"","data":{"succMap":{"a.png":"/u/a.png"},"errFiles":[]}}"#;

#[tokio::test]
async fn test_wysiwyg_inserts_img_at_saved_caret() {
    let editor = MockEditor::new("hello world", 5, EditorMode::Wysiwyg);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    assert!(!uploader.is_uploading());
    let summary = uploader.run(vec![png("a.png")], true).await.unwrap();

    assert_eq!(
        summary,
        UploadSummary::Uploaded {
            accepted: 1,
            rejected: 0
        }
    );
    assert_eq!(
        editor.doc(),
        "hello<img alt=\"a.png\" src=\"/u/a.png\">\n world (typed meanwhile)"
    );
    assert_eq!(editor.doc().matches("<img").count(), 1);
    assert_eq!(transport.locked_during_send.get(), Some(true));
    assert!(editor.editable.get());
    assert!(!uploader.is_uploading());
    assert!(!editor.progress_visible.get());
    assert!(!uploader.session().is_progress_visible());
    assert_eq!(editor.tip(), None);
    assert_eq!(editor.input_resets.get(), 1);
    // The caret after insertion is the new saved range.
    assert_eq!(
        uploader.session().saved_range(),
        Some(5 + "<img alt=\"a.png\" src=\"/u/a.png\">\n".len())
    );
}

#[tokio::test]
async fn test_source_mode_inserts_markdown_image() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    uploader.run(vec![png("a.png")], false).await.unwrap();

    assert_eq!(editor.doc(), "![a.png](/u/a.png)\n (typed meanwhile)");
    assert!(!editor.doc().contains("<img"));
    assert_eq!(editor.input_resets.get(), 0);
}

#[tokio::test]
async fn test_progress_reported_then_hidden() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    uploader.run(vec![png("a.png")], false).await.unwrap();

    assert_eq!(*editor.progress.borrow(), vec![0.25, 0.75, 1.0]);
    assert!(!editor.progress_visible.get());
    assert_eq!(uploader.session().progress(), None);
}

#[tokio::test]
async fn test_transport_failure_shows_body_and_releases() {
    let editor = MockEditor::new("hello", 5, EditorMode::Wysiwyg);
    let transport = CannedTransport::new(
        &editor,
        Err(TransportError::Status {
            status: 500,
            body: "boom".into(),
        }),
    );
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    let err = uploader.run(vec![png("a.png")], true).await.unwrap_err();

    assert!(matches!(
        err,
        UploadError::Transport(TransportError::Status { status: 500, .. })
    ));
    assert_eq!(editor.tip().as_deref(), Some("boom"));
    assert_eq!(editor.doc(), "hello (typed meanwhile)");
    assert!(editor.editable.get());
    assert!(!uploader.is_uploading());
    assert!(!editor.progress_visible.get());
    assert_eq!(editor.input_resets.get(), 1);
}

#[tokio::test]
async fn test_server_failure_reports_without_inserting() {
    let editor = MockEditor::new("hello", 5, EditorMode::Wysiwyg);
    let transport = CannedTransport::new(
        &editor,
        Ok(r#"{"code":1,"msg":"quota exceeded","data":{"succMap":{},"errFiles":["b.txt"]}}"#.into()),
    );
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    let raw = vec![RawFile::from(FileDescriptor::new(
        "b.txt",
        3,
        "text/plain",
        Bytes::from_static(b"abc"),
    ))];
    uploader.run(raw, false).await.unwrap();

    let tip = editor.tip().unwrap();
    assert!(tip.contains("quota exceeded"));
    assert!(tip.contains("b.txt upload error"));
    assert_eq!(editor.doc(), "hello (typed meanwhile)");
}

#[tokio::test]
async fn test_null_err_files_still_renders() {
    let editor = MockEditor::new("", 0, EditorMode::Wysiwyg);
    let reply = r#"{"code":0,"msg":null,"data":{"errFiles":null,"succMap":{"a.png":"/u/a.png"}}}"#;
    let transport = CannedTransport::new(&editor, Ok(reply.into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    uploader.run(vec![png("a.png")], false).await.unwrap();

    assert_eq!(editor.doc().matches("<img").count(), 1);
    assert!(editor.doc().starts_with("<img alt=\"a.png\" src=\"/u/a.png\">\n"));
    assert_eq!(editor.tip(), None);
}

#[tokio::test]
async fn test_malformed_response_is_reported() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok("<html>bad gateway</html>".into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    let err = uploader.run(vec![png("a.png")], false).await.unwrap_err();

    assert!(matches!(err, UploadError::Response(_)));
    assert!(editor.tip().unwrap().starts_with("malformed upload response"));
    assert!(!uploader.is_uploading());
    assert!(editor.editable.get());
}

#[tokio::test]
async fn test_missing_url_stops_before_transport() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let uploader = Uploader::new(
        &editor,
        &transport,
        RenderCompletion::new(),
        UploadConfig::default(),
    );

    let err = uploader.run(vec![png("a.png")], true).await.unwrap_err();

    assert!(matches!(err, UploadError::NotConfigured));
    assert_eq!(
        editor.tip().as_deref(),
        Some("please config: options.upload.url")
    );
    assert!(transport.sent.borrow().is_empty());
    assert_eq!(editor.input_resets.get(), 1);
}

#[tokio::test]
async fn test_all_rejected_never_locks() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let mut config = config();
    config.rule.max = 2;
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config);

    let err = uploader
        .run(vec![png("a.png"), png("b.png")], false)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::NothingAccepted { rejected: 2 }));
    assert!(transport.sent.borrow().is_empty());
    assert_eq!(transport.locked_during_send.get(), None);
    assert_eq!(
        editor.tip().as_deref(),
        Some("<ul><li>a.png over 0.0000019073486328125M</li><li>b.png over 0.0000019073486328125M</li></ul>")
    );
}

#[tokio::test]
async fn test_partial_validation_sends_only_accepted() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let mut config = config();
    config.rule.accept = Some(".png".into());
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config);

    let raw = vec![
        png("a.png"),
        RawFile::from(FileDescriptor::new("b.exe", 1, "", Bytes::new())),
    ];
    let summary = uploader.run(raw, false).await.unwrap();

    assert_eq!(
        summary,
        UploadSummary::Uploaded {
            accepted: 1,
            rejected: 1
        }
    );
    assert_eq!(*transport.sent.borrow(), vec!["a.png".to_string()]);
}

#[tokio::test]
async fn test_single_selection_caps_before_network() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let mut config = config();
    config.rule.multiple = false;
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config);

    uploader
        .run(vec![png("a.png"), png("b.png")], false)
        .await
        .unwrap();

    assert_eq!(*transport.sent.borrow(), vec!["a.png".to_string()]);
}

/// Hooks driven by fields so each test can pick a behaviour.
#[derive(Default)]
struct TestHooks {
    handler: Option<HandlerOutcome>,
    handled: RefCell<Vec<String>>,
    veto: Option<String>,
    rename_to: Option<String>,
}

impl UploadHooks<Bytes> for TestHooks {
    fn handle(&self, files: &[FileDescriptor<Bytes>]) -> impl Future<Output = HandlerOutcome> {
        self.handled
            .borrow_mut()
            .extend(files.iter().map(|f| f.name.clone()));
        ready(self.handler.clone().unwrap_or(HandlerOutcome::Declined))
    }

    fn transform(
        &self,
        files: Vec<FileDescriptor<Bytes>>,
    ) -> impl Future<Output = Vec<FileDescriptor<Bytes>>> {
        let files = match &self.rename_to {
            Some(name) => files
                .into_iter()
                .map(|f| FileDescriptor { name: name.clone(), ..f })
                .collect(),
            None => files,
        };
        ready(files)
    }

    fn validate(&self, _files: &[FileDescriptor<Bytes>]) -> Result<(), String> {
        match &self.veto {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

#[tokio::test]
async fn test_handler_bypasses_pipeline() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    // No url: the handler runs before the configuration check.
    let uploader = Uploader::new(
        &editor,
        &transport,
        RenderCompletion::new(),
        UploadConfig::default(),
    )
    .with_hooks(TestHooks {
        handler: Some(HandlerOutcome::Handled),
        ..Default::default()
    });

    let summary = uploader.run(vec![png("a.png")], true).await.unwrap();

    assert_eq!(summary, UploadSummary::Delegated { files: 1 });
    assert_eq!(*uploader_hooks_seen(&uploader), vec!["a.png".to_string()]);
    assert!(transport.sent.borrow().is_empty());
    assert_eq!(editor.tip(), None);
    assert_eq!(editor.input_resets.get(), 1);
}

fn uploader_hooks_seen<P: EditorPlatform, T, C>(
    uploader: &Uploader<P, T, C, TestHooks>,
) -> std::cell::Ref<'_, Vec<String>> {
    uploader.hooks().handled.borrow()
}

#[tokio::test]
async fn test_handler_rejection_is_shown() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config())
        .with_hooks(TestHooks {
            handler: Some(HandlerOutcome::Rejected("handler says no".into())),
            ..Default::default()
        });

    let err = uploader.run(vec![png("a.png")], false).await.unwrap_err();

    assert!(matches!(err, UploadError::Rejected(ref m) if m == "handler says no"));
    assert_eq!(editor.tip().as_deref(), Some("handler says no"));
}

#[tokio::test]
async fn test_validator_hook_vetoes() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config())
        .with_hooks(TestHooks {
            veto: Some("too many files".into()),
            ..Default::default()
        });

    let err = uploader.run(vec![png("a.png")], false).await.unwrap_err();

    assert!(matches!(err, UploadError::Rejected(_)));
    assert_eq!(editor.tip().as_deref(), Some("too many files"));
    assert!(transport.sent.borrow().is_empty());
}

#[tokio::test]
async fn test_transform_runs_before_validation() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok(ONE_IMAGE.into()));
    let mut config = config();
    config.rule.accept = Some(".webp".into());
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config).with_hooks(
        TestHooks {
            rename_to: Some("a.webp".into()),
            ..Default::default()
        },
    );

    uploader.run(vec![png("a.png")], false).await.unwrap();

    assert_eq!(*transport.sent.borrow(), vec!["a.webp".to_string()]);
}

#[tokio::test]
async fn test_format_hook_rewrites_response() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let transport = CannedTransport::new(&editor, Ok("ignored".into()));
    let completion = RenderCompletion::with_format(|files: &[FileDescriptor<Bytes>], _raw| {
        assert_eq!(files[0].content, Bytes::from_static(b"\x89PNG"));
        format!(
            r#"{{"code":0,"data":{{"succMap":{{"{}":"/cdn/{}"}}}}}}"#,
            files[0].name, files[0].name
        )
    });
    let uploader = Uploader::new(&editor, &transport, completion, config());

    uploader.run(vec![png("a.png")], false).await.unwrap();

    assert!(editor.doc().starts_with("![a.png](/cdn/a.png)\n"));
}

/// Resolves only when the test says so, to observe the in-flight window.
struct GatedTransport {
    gate: RefCell<Option<oneshot::Receiver<Result<String, TransportError>>>>,
}

impl Transport<Bytes> for GatedTransport {
    type Response = String;

    fn send(
        &self,
        _files: &[FileDescriptor<Bytes>],
        _config: &UploadConfig,
        on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<String, TransportError>> {
        let gate = self.gate.borrow_mut().take();
        async move {
            on_progress(0.5);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Network("gate dropped".into()))),
                None => Err(TransportError::Network("already used".into())),
            }
        }
    }
}

#[tokio::test]
async fn test_second_run_rejected_while_in_flight() {
    let editor = MockEditor::new("ab", 1, EditorMode::Source);
    let (tx, rx) = oneshot::channel();
    let transport = GatedTransport {
        gate: RefCell::new(Some(rx)),
    };
    let uploader = Uploader::new(&editor, &transport, RenderCompletion::new(), config());

    let first = uploader.run(vec![png("a.png")], false);
    let observer = async {
        tokio::task::yield_now().await;
        assert!(uploader.is_uploading());
        assert!(!editor.editable.get());
        assert!(editor.progress_visible.get());

        // Caret moves while the first upload is pending.
        editor.caret.set(2);
        let second = uploader.run(vec![png("b.png")], false).await;
        assert!(matches!(second, Err(UploadError::AlreadyUploading)));
        assert_eq!(uploader.session().saved_range(), Some(1));
        assert_eq!(editor.input_resets.get(), 0);

        // A refused input-triggered call still clears its input, and leaves
        // the in-flight attempt locked.
        let third = uploader.run(vec![png("c.png")], true).await;
        assert!(matches!(third, Err(UploadError::AlreadyUploading)));
        assert_eq!(editor.input_resets.get(), 1);
        assert!(uploader.is_uploading());
        assert!(!editor.editable.get());

        tx.send(Ok(ONE_IMAGE.to_string())).unwrap();
    };

    let (first, ()) = tokio::join!(first, observer);
    first.unwrap();

    assert!(!uploader.is_uploading());
    assert!(editor.editable.get());
    assert_eq!(editor.input_resets.get(), 1);
    assert_eq!(editor.doc(), "a![a.png](/u/a.png)\nb");
}

/// A custom transport/completion pair with its own response type.
struct Ticket(u32);

struct TicketTransport;

impl Transport<Bytes> for TicketTransport {
    type Response = Ticket;

    fn requires_url(&self) -> bool {
        false
    }

    fn send(
        &self,
        files: &[FileDescriptor<Bytes>],
        _config: &UploadConfig,
        _on_progress: &dyn Fn(f64),
    ) -> impl Future<Output = Result<Ticket, TransportError>> {
        ready(Ok(Ticket(files.len() as u32)))
    }
}

#[derive(Default)]
struct TicketCompletion {
    seen: Cell<Option<u32>>,
}

impl<P: EditorPlatform> Completion<P, Bytes, Ticket> for TicketCompletion {
    fn complete(
        &self,
        cx: &CompletionContext<'_, P, Bytes>,
        response: Ticket,
    ) -> Result<(), UploadError> {
        self.seen.set(Some(response.0));
        cx.platform.hide_tip();
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_transport_and_completion() {
    let editor = MockEditor::new("", 0, EditorMode::Source);
    let completion = TicketCompletion::default();
    let uploader = Uploader::new(&editor, TicketTransport, &completion, UploadConfig::default());

    uploader
        .run(vec![png("a.png"), png("b.png")], false)
        .await
        .unwrap();

    assert_eq!(completion.seen.get(), Some(2));
    assert_eq!(editor.doc(), "");
    assert!(!uploader.is_uploading());
}
