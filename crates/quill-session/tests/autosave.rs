mod common;

use std::time::Duration;

use quill_session::{SessionSignal, TextChange};
use tokio::time::sleep;

use common::{project_store, session, LIB_RS, QUIET, STATE_RS};

const HALF: Duration = Duration::from_millis(2_500);

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn typing_then_waiting_persists_the_buffer() {
    let store = project_store();
    store.open_tab("/src/state.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session
        .edit(TextChange::insert(0, "#[account]\n"))
        .expect("edit");
    assert!(!store.get("/src/state.rs").expect("doc").is_saved);
    sleep(QUIET + Duration::from_millis(1)).await;

    let doc = store.get("/src/state.rs").expect("doc");
    assert_eq!(doc.content, format!("#[account]\n{STATE_RS}"));
    assert!(doc.is_saved);
    assert_eq!(doc.version, 2);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn bursts_within_the_quiet_interval_write_once() {
    let store = project_store();
    store.open_tab("/src/state.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session.edit(TextChange::insert(0, "a")).expect("t1");
    sleep(HALF).await;
    session.edit(TextChange::insert(1, "b")).expect("t2");
    sleep(HALF).await;
    assert_eq!(store.get("/src/state.rs").expect("doc").version, 1);

    sleep(QUIET).await;
    let doc = store.get("/src/state.rs").expect("doc");
    assert_eq!(doc.version, 2);
    assert_eq!(doc.content, format!("ab{STATE_RS}"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn switching_documents_cancels_the_pending_write() {
    let store = project_store();
    store.open_tab("/src/lib.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session
        .edit(TextChange::insert(0, "// unsaved\n"))
        .expect("edit");
    sleep(HALF).await;
    store.open_tab("/src/state.rs").expect("switch");
    session.sync(SessionSignal::TabsChanged);
    sleep(QUIET * 3).await;

    let lib = store.get("/src/lib.rs").expect("lib");
    assert_eq!(lib.content, LIB_RS);
    assert_eq!(lib.version, 1);
    let state = store.get("/src/state.rs").expect("state");
    assert_eq!(state.content, STATE_RS);
    assert_eq!(state.version, 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn host_change_cancels_the_pending_write() {
    let store = project_store();
    store.open_tab("/src/lib.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session.edit(TextChange::insert(0, "x")).expect("edit");
    session.sync(SessionSignal::HostChanged);
    sleep(QUIET * 2).await;

    assert_eq!(store.get("/src/lib.rs").expect("lib").version, 1);
    assert_eq!(session.view().expect("view").text(), LIB_RS);
    assert_eq!(session.epoch(), 2);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn removed_document_is_not_resurrected() {
    let store = project_store();
    store.open_tab("/src/state.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session.edit(TextChange::insert(0, "x")).expect("edit");
    store.remove("/src/state.rs").expect("remove");
    sleep(QUIET * 2).await;

    assert!(!store.contains("/src/state.rs"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn emptied_buffer_saves_an_empty_document() {
    let store = project_store();
    store.open_tab("/src/state.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session
        .edit(TextChange::delete(0, STATE_RS.len()))
        .expect("delete all");
    sleep(QUIET * 2).await;

    let doc = store.get("/src/state.rs").expect("doc");
    assert_eq!(doc.content, "");
    assert!(doc.is_saved);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn flush_saves_now_and_later_edits_still_autosave() {
    let store = project_store();
    store.open_tab("/src/state.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session.edit(TextChange::insert(0, "a")).expect("edit");
    assert_eq!(session.flush(), Ok(Some(2)));
    sleep(QUIET * 2).await;
    assert_eq!(store.get("/src/state.rs").expect("doc").version, 2);

    session.edit(TextChange::insert(1, "b")).expect("edit");
    sleep(QUIET * 2).await;
    let doc = store.get("/src/state.rs").expect("doc");
    assert_eq!(doc.version, 3);
    assert_eq!(doc.content, format!("ab{STATE_RS}"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn undo_counts_as_a_change() {
    let store = project_store();
    store.open_tab("/src/state.rs").expect("open");
    let mut session = session(&store);
    session.initialize();

    session.edit(TextChange::insert(0, "a")).expect("edit");
    session.view_mut().expect("view").undo().expect("undo");
    sleep(QUIET * 2).await;

    let doc = store.get("/src/state.rs").expect("doc");
    assert_eq!(doc.content, STATE_RS);
    assert_eq!(doc.version, 2);
}
