use docwarden::collection::{Collection, Entity};
use docwarden::doc;
use docwarden::errors::ErrorKind;
use docwarden::filter::{all, field};
use docwarden::middleware::{Middleware, Phase};
use docwarden::virtuals::Virtual;
use docwarden_int_test::test_util::{
    cleanup, create_test_context, hook_log, recorder, reject_locked, run_test, ticket, Ticket,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[test]
fn test_builder_rejects_bad_configuration() {
    run_test(
        create_test_context,
        |ctx| {
            let err = Collection::<Ticket>::builder().name("  ").build(ctx.store()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            let err = Collection::<Ticket>::builder()
                .max_bulk_documents(0)
                .build(ctx.store())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

            let err = Collection::<Ticket>::builder()
                .virtual_field(Virtual::infallible("shout", |t: &Ticket| t.title.to_uppercase()))
                .virtual_field(Virtual::infallible("shout", |t: &Ticket| t.title.clone()))
                .build(ctx.store())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            assert!(err.message().contains("shout"));

            // nothing was opened for the failed builds
            assert!(!ctx.memory().has_collection(&Ticket::entity_name()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_builder_configuration_is_frozen() {
    run_test(
        create_test_context,
        |ctx| {
            let log = hook_log();
            let label = |t: &Ticket| t.title.clone();
            let tickets: Collection<Ticket> = Collection::builder()
                .name("helpdesk")
                .middleware(
                    Middleware::builder()
                        .before_update(reject_locked())
                        .build(),
                )
                .hook(Phase::BeforeUpdate, recorder("check", log.clone(), label))
                .max_bulk_documents(10)
                .build(ctx.store())?;

            assert_eq!(tickets.name(), "helpdesk");
            assert_eq!(tickets.config().max_bulk_documents(), Some(10));
            assert_eq!(
                tickets.middleware().hook_names(Phase::BeforeUpdate),
                vec!["reject-locked", "check"]
            );
            assert!(tickets.virtuals().is_empty());
            assert!(ctx.memory().has_collection("helpdesk"));

            // a rejecting hook stops the later hooks of the same phase
            tickets.insert(ticket("t-1", "printer", "locked"))?;
            tickets.insert(ticket("t-2", "scanner", "open"))?;
            tickets.update(all(), &doc! { status: "closed" })?;
            assert_eq!(*log.lock(), vec!["beforeUpdate:check:scanner"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_clones_share_state() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets: Collection<Ticket> = Collection::builder().build(ctx.store())?;
            let other = tickets.clone();

            tickets.insert(ticket("t-1", "printer", "open"))?;
            assert_eq!(other.count(all())?, 1);

            // a second collection over the same store sees the same data
            let second: Collection<Ticket> = Collection::builder().build(ctx.store())?;
            second.update_by_id("t-1", &doc! { status: "closed" })?;
            let found = tickets.find_one(field("status").eq("closed"), None)?;
            assert_eq!(found.map(|t| t.into_entity()), Some(Ticket {
                status: "closed".to_string(),
                ..ticket("t-1", "printer", "open")
            }));

            let by_filter = tickets.find_one(tickets.id_filter("t-1"), None)?;
            assert!(by_filter.is_some());
            Ok(())
        },
        cleanup,
    )
}
