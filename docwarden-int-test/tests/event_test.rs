use docwarden::collection::{
    Collection, CollectionEventInfo, CollectionEventListener, CollectionEvents,
};
use docwarden::common::{EventAware, Value};
use docwarden::doc;
use docwarden::errors::{ErrorKind, WardenError};
use docwarden::filter::all;
use docwarden::middleware::{Hook, Middleware, Phase};
use docwarden_int_test::test_util::{
    cleanup, create_test_context, reject_locked, run_test, ticket, wait_for, Ticket,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[ctor::ctor]
fn init() {
    colog::init();
}

type Seen = Arc<Mutex<Vec<CollectionEventInfo>>>;

fn listener(seen: Seen) -> CollectionEventListener {
    CollectionEventListener::new(move |event: CollectionEventInfo| {
        seen.lock().push(event);
        Ok(())
    })
}

fn kinds(seen: &Seen) -> Vec<(CollectionEvents, Value)> {
    seen.lock()
        .iter()
        .map(|e| (e.event_type(), e.id().clone()))
        .collect()
}

#[test]
fn test_one_event_per_persisted_document() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: Collection<Ticket> = Collection::builder()
                .middleware(Middleware::builder().before_update(reject_locked()).build())
                .build(ctx.store())?;
            let seen: Seen = Arc::new(Mutex::new(Vec::new()));
            tickets.subscribe(listener(seen.clone()))?;

            tickets.insert(ticket("t-1", "printer", "open"))?;
            tickets.insert(ticket("t-2", "scanner", "locked"))?;
            tickets.update(all(), &doc! { status: "closed" })?;
            tickets.remove(all())?;

            wait_for(1000, || seen.lock().len() == 5);
            assert_eq!(
                kinds(&seen),
                vec![
                    (CollectionEvents::Insert, Value::from("t-1")),
                    (CollectionEvents::Insert, Value::from("t-2")),
                    (CollectionEvents::Update, Value::from("t-1")),
                    (CollectionEvents::Remove, Value::from("t-1")),
                    (CollectionEvents::Remove, Value::from("t-2")),
                ]
            );

            let events = seen.lock();
            assert_eq!(events[2].collection(), "tickets");
            let item = events[2].item().cloned().unwrap_or_default();
            assert_eq!(item.get("status")?, Value::from("closed"));
            assert!(events[3].item().is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_after_hook_failure_is_reported_as_event() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: Collection<Ticket> = Collection::builder()
                .hook(
                    Phase::AfterInsert,
                    Hook::from_fn("notify", |_: Ticket, _| {
                        Err(WardenError::new("mail server down", ErrorKind::InternalError))
                    }),
                )
                .build(ctx.store())?;
            let seen: Seen = Arc::new(Mutex::new(Vec::new()));
            tickets.subscribe(listener(seen.clone()))?;

            let inserted = tickets.insert(ticket("t-1", "printer", "open"))?;
            assert_eq!(inserted.title, "printer");

            wait_for(1000, || seen.lock().len() == 2);
            assert_eq!(
                kinds(&seen),
                vec![
                    (CollectionEvents::Insert, Value::from("t-1")),
                    (CollectionEvents::HookFailure, Value::from("t-1")),
                ]
            );
            let events = seen.lock();
            assert_eq!(events[1].phase(), Some(Phase::AfterInsert));
            assert!(events[1].error().unwrap_or_default().contains("mail server down"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unsubscribed_listener_hears_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: Collection<Ticket> = Collection::builder().build(ctx.store())?;
            let first: Seen = Arc::new(Mutex::new(Vec::new()));
            let second: Seen = Arc::new(Mutex::new(Vec::new()));
            let subscriber = tickets.subscribe(listener(first.clone()))?;
            tickets.subscribe(listener(second.clone()))?;

            tickets.insert(ticket("t-1", "printer", "open"))?;
            wait_for(1000, || first.lock().len() == 1 && second.lock().len() == 1);

            if let Some(subscriber) = subscriber {
                tickets.unsubscribe(subscriber)?;
            }
            tickets.insert(ticket("t-2", "scanner", "open"))?;
            wait_for(1000, || second.lock().len() == 2);
            assert_eq!(first.lock().len(), 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_events_can_be_disabled() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: Collection<Ticket> = Collection::builder()
                .publish_events(false)
                .build(ctx.store())?;
            assert!(!tickets.config().publish_events());
            let seen: Seen = Arc::new(Mutex::new(Vec::new()));
            tickets.subscribe(listener(seen.clone()))?;

            tickets.insert(ticket("t-1", "printer", "open"))?;
            tickets.update_by_id("t-1", &doc! { status: "closed" })?;
            tickets.remove_by_id("t-1")?;

            std::thread::sleep(Duration::from_millis(100));
            assert!(seen.lock().is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failing_listener_does_not_fail_write() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: Collection<Ticket> = Collection::builder().build(ctx.store())?;
            tickets.subscribe(CollectionEventListener::new(|_: CollectionEventInfo| {
                Err(WardenError::new("listener broke", ErrorKind::EventError))
            }))?;

            tickets.insert(ticket("t-1", "printer", "open"))?;
            assert_eq!(tickets.count(all())?, 1);
            Ok(())
        },
        cleanup,
    )
}
