use std::ffi::OsString;
use std::fs;
use std::path::Path;

use taskmedic_cli::fs_store::FileStore;
use taskmedic_core::datastore::DocumentStore;
use taskmedic_core::item::{Document, ItemKind, Urgency};
use tempfile::{TempDir, tempdir};

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("taskmedicrc"), "# empty\ncolor = off\n").expect("write rc");
        Self { dir }
    }

    fn data_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("data")
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<()> {
        let mut argv: Vec<OsString> = vec![
            "taskmedic".into(),
            "--taskmedicrc".into(),
            self.dir.path().join("taskmedicrc").into_os_string(),
            "--data".into(),
            self.data_dir().into_os_string(),
        ];
        argv.extend(args.iter().map(OsString::from));
        taskmedic_cli::run(argv)
    }

    fn document(&self) -> Document {
        let backend = FileStore::open(&self.data_dir()).expect("open store");
        DocumentStore::new(backend).load().expect("load document")
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

fn prefix(id: &str) -> &str {
    &id[..8]
}

#[test]
fn add_job_toggle_task_by_prefix_and_reload() {
    let sandbox = Sandbox::new();
    sandbox
        .run(&[
            "add",
            "job",
            "--summary",
            "Test job summary",
            "--ward",
            "AMU",
            "--task",
            "Task A",
            "--urgency",
            "red",
            "--review-by",
            "2030-01-02T09:30",
        ])
        .expect("add job");

    let doc = sandbox.document();
    assert_eq!(doc.items.len(), 1);
    let item = &doc.items[0];
    assert_eq!(item.urgency, Urgency::Red);
    assert!(item.review_by.is_some());
    assert_eq!(item.tasks.len(), 1);
    assert!(!item.tasks[0].done);

    let id = item.id.clone();
    let xid = item.tasks[0].id.clone();
    sandbox
        .run(&["check", "toggle", prefix(&id), prefix(&xid)])
        .expect("toggle task");
    sandbox.run(&["note", prefix(&id), "Bloods", "sent"]).expect("note");
    sandbox.run(&["list"]).expect("list");

    let doc = sandbox.document();
    let item = doc.item(&id).expect("item survives");
    assert!(item.tasks[0].done);
    assert_eq!(item.progress[0].text, "Bloods sent");
    assert!(matches!(&item.kind, ItemKind::Job(job) if job.ward.as_deref() == Some("AMU")));
}

#[test]
fn bleep_callback_done_render_and_export() {
    let sandbox = Sandbox::new();
    sandbox
        .run(&["add", "bleep", "--from", "Bleep 1234", "--location", "Ward 9"])
        .expect("add bleep");
    let id = sandbox.document().items[0].id.clone();

    sandbox.run(&["callback", prefix(&id)]).expect("callback");

    let page = sandbox.path("list.html");
    sandbox
        .run(&["render", "--out", page.to_str().expect("utf8 path")])
        .expect("render");
    let html = fs::read_to_string(&page).expect("read page");
    assert!(html.starts_with("<!doctype html>"));
    assert!(html.contains(&format!(r#"data-card-id="{id}""#)));
    assert!(html.contains("Called back"));

    sandbox.run(&["done", prefix(&id)]).expect("done");
    sandbox.run(&["done", prefix(&id)]).expect("done twice is harmless");
    assert!(sandbox.document().items[0].done);

    let export = sandbox.path("export.json");
    sandbox
        .run(&["export", "--out", export.to_str().expect("utf8 path")])
        .expect("export");
    let exported: Document =
        serde_json::from_str(&fs::read_to_string(&export).expect("read export")).expect("parse export");
    assert_eq!(exported, sandbox.document());

    sandbox.run(&["done", "--undo", prefix(&id)]).expect("reopen");
    assert!(!sandbox.document().items[0].done);
}

#[test]
fn invalid_input_is_rejected_without_writing() {
    let sandbox = Sandbox::new();

    let err = sandbox
        .run(&["add", "job", "--summary", "   "])
        .expect_err("blank summary");
    assert!(format!("{err:#}").contains("job summary cannot be empty"));

    let err = sandbox
        .run(&["add", "job", "--summary", "AKI", "--review-by", "later"])
        .expect_err("bad review-by");
    assert!(format!("{err:#}").contains("invalid review-by"));
    assert!(sandbox.document().items.is_empty());

    let err = sandbox.run(&["show", "deadbeef"]).expect_err("unknown id");
    assert!(format!("{err:#}").contains("no item matches deadbeef"));
}

#[test]
fn wipe_requires_confirmation() {
    let sandbox = Sandbox::new();
    sandbox.run(&["add", "job", "--summary", "One"]).expect("add");
    sandbox.run(&["add", "job", "--summary", "Two"]).expect("add");

    assert!(sandbox.run(&["wipe"]).is_err());
    assert_eq!(sandbox.document().items.len(), 2);

    sandbox.run(&["wipe", "--yes"]).expect("wipe");
    assert!(sandbox.document().items.is_empty());
    assert!(!Path::new(&sandbox.data_dir().join("taskmedic_v2.corrupt.json")).exists());
}
