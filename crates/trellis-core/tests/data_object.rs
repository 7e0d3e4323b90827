//! Integration tests for data objects shared between several observers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use slotmap::SlotMap;
use trellis_core::{
    Adjustment, AdjustmentData, DataState, FnObserver, IntData, ListData, Observer, WidgetId,
    WidgetRefData,
};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trellis_core=trace")
        .with_test_writer()
        .try_init();
}

fn widget_ids(count: usize) -> Vec<WidgetId> {
    let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
    (0..count).map(|_| map.insert(())).collect()
}

/// Mirrors one data object into another, like a spin button bound to a slider.
struct Mirror {
    target: IntData,
}

impl Observer<i64> for Mirror {
    fn on_update(&self, data: &IntData) -> bool {
        self.target.set(data.get() * 2);
        self.target.notify();
        false
    }
}

#[test]
fn test_notification_chains_through_other_objects() {
    setup();
    let source = IntData::new(0);
    let target = IntData::new(0);
    let mirror = Rc::new(Mirror {
        target: target.clone(),
    });
    source.attach(&mirror);

    let seen = Rc::new(Cell::new(0));
    let sink = seen.clone();
    let reader = Rc::new(FnObserver::new((), move |_, data: &IntData| {
        sink.set(data.get());
        false
    }));
    target.attach(&reader);

    source.set(21);
    source.notify();

    assert_eq!(seen.get(), 42);
    assert_eq!(source.state(), DataState::Idle);
    assert_eq!(target.state(), DataState::Idle);
}

#[test]
fn test_toggle_group_via_widget_reference() {
    setup();
    let ids = widget_ids(3);
    let active = WidgetRefData::new(Some(ids[0]));

    // Each member observes the group and tracks whether it is the active one.
    let members: Vec<Rc<FnObserver<Option<WidgetId>, (WidgetId, Cell<bool>)>>> = ids
        .iter()
        .map(|&id| {
            Rc::new(FnObserver::new(
                (id, Cell::new(false)),
                |(id, on): &(WidgetId, Cell<bool>), data: &WidgetRefData| {
                    on.set(data.get() == Some(*id));
                    false
                },
            ))
        })
        .collect();
    for member in &members {
        active.attach(member);
    }

    active.set(Some(ids[2]));
    active.notify();

    let states: Vec<bool> = members.iter().map(|m| m.payload().1.get()).collect();
    assert_eq!(states, vec![false, false, true]);
}

#[test]
fn test_selection_owner_destroys_list_mid_notification() {
    setup();
    let selection = ListData::new(vec![1u32, 2, 3]);
    let disconnected = Rc::new(RefCell::new(Vec::new()));

    let log = disconnected.clone();
    let view = Rc::new(
        FnObserver::new((), |_, _: &ListData<u32>| false)
            .on_disconnect(move |_, data: &ListData<u32>| log.borrow_mut().push(data.borrow().len())),
    );
    let closer = Rc::new(FnObserver::new((), |_, data: &ListData<u32>| {
        if data.borrow().is_empty() {
            data.destroy();
        }
        false
    }));
    selection.attach(&view);
    selection.attach(&closer);

    selection.update(Vec::clear);
    selection.notify();

    assert!(selection.is_destroyed());
    assert_eq!(*disconnected.borrow(), vec![0]);
}

#[test]
fn test_adjustment_shared_by_two_views() {
    setup();
    let adjustment = AdjustmentData::new(Adjustment::new(0.0, 0.0, 100.0, 1.0, 10.0, 20.0));
    let positions = Rc::new(RefCell::new(Vec::new()));

    let mut views = Vec::new();
    for track in [100, 200] {
        let sink = positions.clone();
        let view = Rc::new(FnObserver::new(track, move |track: &i32, data: &AdjustmentData| {
            let adj = data.get();
            sink.borrow_mut().push((*track, adj.slider_position(*track, 20)));
            false
        }));
        adjustment.attach(&view);
        views.push(view);
    }

    assert!(adjustment.set_value(40.0));

    let mut positions = positions.borrow().clone();
    positions.sort();
    assert_eq!(positions, vec![(100, 40), (200, 90)]);
}
