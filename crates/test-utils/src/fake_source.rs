use std::path::Path;

use notify::event::{
    CreateKind, DataChange, EventKind, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use notify::Event;
use tokio::sync::mpsc;
use watchcmd::engine::{RawEventReceiver, RawEventSender};
use watchcmd::watch::mock::MockBackend;

/// Stand-in for the OS notification source.
///
/// Tests push raw `notify` events through `send`; the pipeline sees them
/// exactly as it would see the real watcher's output. The paired
/// `MockBackend` records which directories the pipeline registered.
pub struct FakeSource {
    tx: RawEventSender,
    backend: MockBackend,
}

impl FakeSource {
    pub fn new(capacity: usize) -> (Self, RawEventReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                backend: MockBackend::new(),
            },
            rx,
        )
    }

    /// A handle on the backend; clones share registrations.
    pub fn backend(&self) -> MockBackend {
        self.backend.clone()
    }

    pub async fn send(&self, event: Event) {
        self.tx
            .send(Ok(event))
            .await
            .expect("pipeline dropped the raw event receiver");
    }

    /// Report an asynchronous source error, as a dying watcher would.
    pub async fn fail(&self, message: &str) {
        self.tx
            .send(Err(notify::Error::generic(message)))
            .await
            .expect("pipeline dropped the raw event receiver");
    }
}

fn event(kind: EventKind, path: &Path) -> Event {
    Event::new(kind).add_path(path.to_path_buf())
}

pub fn create_file(path: &Path) -> Event {
    event(EventKind::Create(CreateKind::File), path)
}

pub fn create_dir(path: &Path) -> Event {
    event(EventKind::Create(CreateKind::Folder), path)
}

pub fn write(path: &Path) -> Event {
    event(
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        path,
    )
}

pub fn chmod(path: &Path) -> Event {
    event(
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
        path,
    )
}

pub fn remove_file(path: &Path) -> Event {
    event(EventKind::Remove(RemoveKind::File), path)
}

pub fn remove_dir(path: &Path) -> Event {
    event(EventKind::Remove(RemoveKind::Folder), path)
}

pub fn rename_from(path: &Path) -> Event {
    event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), path)
}

pub fn rename_to(path: &Path) -> Event {
    event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), path)
}

/// Tag an event with a rename cookie, as inotify does for move pairs.
pub fn tracked(event: Event, tracker: usize) -> Event {
    event.set_tracker(tracker)
}

pub fn rename_both(from: &Path, to: &Path) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
        .add_path(from.to_path_buf())
        .add_path(to.to_path_buf())
}

pub fn access(path: &Path) -> Event {
    event(
        EventKind::Access(notify::event::AccessKind::Read),
        path,
    )
}
