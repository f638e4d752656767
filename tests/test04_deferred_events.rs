use std::cell::RefCell;
use std::rc::Rc;

use sql_dbal::events::WILDCARD;
use sql_dbal::prelude::*;
use sql_dbal::test_utils::ScriptedDriver;

#[derive(Debug, Clone, PartialEq)]
struct Saved {
    id: i64,
}

type Bus = Rc<RefCell<Events<Saved>>>;

fn bus_with_log() -> (Bus, Rc<RefCell<Vec<String>>>) {
    let bus = Rc::new(RefCell::new(Events::new()));
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    bus.borrow_mut().register(WILDCARD, move |name, saved: &mut Saved| {
        sink.borrow_mut().push(format!("{name}:{}", saved.id));
        Ok(())
    });
    (bus, log)
}

fn connection() -> Connection {
    Connection::new(Box::new(ScriptedDriver::new(DatabaseType::Mysql)))
}

fn saving(bus: &Bus, ids: &'static [i64]) -> impl FnMut(&mut Connection) -> Result<usize, DbalError> + 'static {
    let bus = Rc::clone(bus);
    move |conn| {
        for id in ids {
            conn.execute_update("INSERT INTO saved (id) VALUES (?)", (*id,))?;
            bus.borrow_mut().emit("saved", Saved { id: *id })?;
        }
        Ok(ids.len())
    }
}

#[test]
fn commit_releases_held_events_in_emission_order() -> Result<(), Box<dyn std::error::Error>> {
    let (bus, log) = bus_with_log();
    let mut conn = connection();

    let mut tx = conn.transaction();
    tx.defer_events(Rc::clone(&bus))
        .callback(saving(&bus, &[1, 2]))
        .callback({
            let bus = Rc::clone(&bus);
            move |_| {
                assert!(bus.borrow().is_corked());
                assert!(has_held_events(&bus));
                bus.borrow_mut().emit("audited", Saved { id: 3 })?;
                Ok(1)
            }
        });
    tx.execute()?;

    assert_eq!(*log.borrow(), vec!["saved:1", "saved:2", "audited:3"]);
    assert!(!bus.borrow().is_corked());

    bus.borrow_mut().emit("saved", Saved { id: 4 })?;
    assert_eq!(log.borrow().last().map(String::as_str), Some("saved:4"));
    Ok(())
}

fn has_held_events(bus: &Bus) -> bool {
    bus.borrow().queued() > 0
}

#[test]
fn rollback_discards_held_events() -> Result<(), Box<dyn std::error::Error>> {
    let (bus, log) = bus_with_log();
    let mut conn = connection();

    let mut tx = conn.transaction();
    tx.defer_events(Rc::clone(&bus))
        .callback(saving(&bus, &[1, 2]))
        .callback(|_| Err(DbalError::Other("duplicate order".into())));
    assert!(tx.execute().is_err());

    assert!(log.borrow().is_empty());
    let bus_ref = bus.borrow();
    assert!(!bus_ref.is_corked());
    assert_eq!(bus_ref.queued(), 0);
    Ok(())
}

#[test]
fn deferred_bus_is_corked_before_earlier_callbacks() -> Result<(), Box<dyn std::error::Error>> {
    let (bus, log) = bus_with_log();
    let mut conn = connection();

    let mut tx = conn.transaction();
    // registered before the bus is linked, still runs corked
    tx.callback(saving(&bus, &[10]));
    tx.defer_events(Rc::clone(&bus));
    let observed = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&observed);
    let log_at_commit = Rc::clone(&log);
    tx.events_mut().register(COMMIT_TRANSACTION, move |_, _| {
        *seen.borrow_mut() = log_at_commit.borrow().len();
        Ok(())
    });
    tx.execute()?;

    assert_eq!(*log.borrow(), vec!["saved:10"]);
    // the commit handler registered after linking runs after the release
    assert_eq!(*observed.borrow(), 1);
    Ok(())
}

#[test]
fn one_bus_across_consecutive_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let (bus, log) = bus_with_log();
    let mut conn = connection();

    let mut failing = conn.transaction();
    failing
        .defer_events(Rc::clone(&bus))
        .callback(saving(&bus, &[1]))
        .callback(|_| Err(DbalError::Other("abort".into())));
    assert!(failing.execute().is_err());
    drop(failing);

    let mut ok = conn.transaction();
    ok.defer_events(Rc::clone(&bus)).callback(saving(&bus, &[2]));
    ok.execute()?;

    assert_eq!(*log.borrow(), vec!["saved:2"]);
    Ok(())
}

#[test]
fn released_events_may_emit_follow_ups_on_the_same_bus() -> Result<(), Box<dyn std::error::Error>> {
    let (bus, log) = bus_with_log();
    let again = Rc::clone(&bus);
    bus.borrow_mut().register("saved", move |_, saved| {
        again.borrow_mut().emit("indexed", saved.clone())
    });
    let mut conn = connection();

    let mut tx = conn.transaction();
    tx.defer_events(Rc::clone(&bus)).callback(saving(&bus, &[1, 2]));
    tx.execute()?;

    // each follow-up is delivered as soon as its cause is released
    assert_eq!(
        *log.borrow(),
        vec!["saved:1", "indexed:1", "saved:2", "indexed:2"]
    );
    assert!(!bus.borrow().is_corked());
    Ok(())
}
