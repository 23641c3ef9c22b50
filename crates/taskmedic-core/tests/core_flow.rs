use chrono::{Duration, TimeZone, Utc};
use taskmedic_core::action::{Action, ActionAttrs};
use taskmedic_core::app::{App, AppConfig, Effect};
use taskmedic_core::datastore::MemoryStore;
use taskmedic_core::item::{ChecklistKind, ItemKind, StatusFilter};
use taskmedic_core::query::visible_sorted;

#[test]
fn added_job_task_toggles_and_survives_reload() {
    let now = Utc.with_ymd_and_hms(2030, 5, 6, 8, 30, 0).single().expect("valid time");
    let mut app = App::open(MemoryStore::new(), AppConfig::default()).expect("open app");

    for attrs in [
        ActionAttrs::new("openAdd"),
        ActionAttrs::new("draftField")
            .with_field("summary")
            .with_value("Test job summary"),
        ActionAttrs::new("addDraftTask").with_value("Task A"),
        ActionAttrs::new("submitAdd"),
    ] {
        let action = Action::from_attrs(&attrs).expect("known action");
        app.dispatch(action, now);
    }

    let visible = visible_sorted(&app.document().items, &app.document().preferences);
    assert_eq!(visible.len(), 1);
    let item = visible[0];
    assert!(matches!(&item.kind, ItemKind::Job(job) if job.summary == "Test job summary"));
    assert_eq!(item.tasks.len(), 1);
    assert_eq!(item.tasks[0].text, "Task A");
    assert!(!item.tasks[0].done);
    assert!(app.render(now).contains("Test job summary"));

    let id = item.id.clone();
    let xid = item.tasks[0].id.clone();
    let toggle = ActionAttrs::new("toggleInlineCheck")
        .with_id(&id)
        .with_kind(ChecklistKind::Tasks)
        .with_xid(&xid);
    let effect = app.dispatch(Action::from_attrs(&toggle).expect("toggle"), now + Duration::seconds(5));
    assert!(matches!(effect, Effect::Patch(_)));

    let reloaded = App::open(app.backend().clone(), AppConfig::default()).expect("reopen app");
    let item = reloaded.document().item(&id).expect("item survives reload");
    assert!(item.tasks[0].done);
    assert_eq!(item.updated_at, now + Duration::seconds(5));
    assert_eq!(reloaded.document(), app.document());
}

#[test]
fn done_items_leave_the_open_list_and_show_under_done() {
    let now = Utc.with_ymd_and_hms(2030, 5, 6, 9, 0, 0).single().expect("valid time");
    let mut app = App::open(MemoryStore::new(), AppConfig::default()).expect("open app");

    app.dispatch(Action::DraftTab(taskmedic_core::item::ItemType::Bleep), now);
    app.dispatch(
        Action::DraftField {
            name: "from".to_string(),
            value: "Bleep 1234".to_string(),
        },
        now,
    );
    app.dispatch(Action::SubmitAdd, now);
    let id = app.document().items[0].id.clone();

    let html = app.render(now);
    assert!(html.contains(&format!(r#"data-card-id="{id}""#)));
    assert!(html.contains("Awaiting callback"));

    app.dispatch(Action::ToggleDone { id: id.clone() }, now);
    assert!(app.visible_card_ids().is_empty());
    assert!(app.render(now).contains("No items match your filters."));

    app.dispatch(Action::SetStatusFilter(StatusFilter::Done), now);
    assert_eq!(app.visible_card_ids(), vec![id]);
}
