use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use afterthought::{
    Config, DeferError, DelaySpec, FnSubscriber, InvocationState, Settler, Signal, Tracker,
    ValueSpec, after, concat, deferred_task,
};
use tokio::time::{Instant, sleep};

type Log = Arc<Mutex<Vec<String>>>;

fn recorder<T: std::fmt::Debug + Send + 'static>(log: &Log) -> FnSubscriber<T> {
    let (a, b, c) = (log.clone(), log.clone(), log.clone());
    FnSubscriber::new()
        .on_value(move |v: T| a.lock().unwrap().push(format!("{v:?}")))
        .on_error(move |e| b.lock().unwrap().push(format!("error:{}", e.as_label())))
        .on_complete(move || c.lock().unwrap().push("complete".into()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn immediate_literal_completes_before_subscribe_returns() {
    let log = Log::default();
    let task = deferred_task(DelaySpec::immediate(), ValueSpec::literal(5));
    let sub = task.subscribe(recorder::<i32>(&log));
    assert_eq!(entries(&log), vec!["5", "complete"]);
    assert_eq!(sub.state(), InvocationState::Completed);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn duration_delivers_once_and_not_before() {
    let log = Log::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let task = deferred_task(
        DelaySpec::after(Duration::from_millis(50)),
        ValueSpec::thunk(move |()| c.fetch_add(1, Ordering::SeqCst) as i32),
    );
    let started = Instant::now();
    let _sub = task.subscribe(recorder::<i32>(&log));

    sleep(Duration::from_millis(49)).await;
    assert!(entries(&log).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(entries(&log), vec!["0", "complete"]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_before_fire_delivers_nothing() {
    let log = Log::default();
    let task = deferred_task(DelaySpec::after(Duration::from_millis(20)), ValueSpec::literal(1));
    let sub = task.subscribe(recorder::<i32>(&log));
    assert!(sub.unsubscribe());
    sleep(Duration::from_millis(40)).await;
    assert!(entries(&log).is_empty());
    assert_eq!(sub.state(), InvocationState::Canceled);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancel_after_fire_is_a_noop() {
    let log = Log::default();
    let task = deferred_task(DelaySpec::after(Duration::from_millis(5)), ValueSpec::literal(1));
    let sub = task.subscribe(recorder::<i32>(&log));
    sleep(Duration::from_millis(10)).await;
    assert!(!sub.unsubscribe());
    assert_eq!(entries(&log), vec!["1", "complete"]);
    assert_eq!(sub.state(), InvocationState::Completed);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn activations_are_independent() {
    let (first, second) = (Log::default(), Log::default());
    let task = deferred_task(
        DelaySpec::after(Duration::from_millis(10)),
        ValueSpec::thunk(|()| "tick"),
    );
    let a = task.subscribe(recorder::<&str>(&first));
    let b = task.subscribe(recorder::<&str>(&second));
    assert_ne!(a.id(), b.id());

    assert!(a.unsubscribe());
    sleep(Duration::from_millis(20)).await;
    assert!(entries(&first).is_empty());
    assert_eq!(entries(&second), vec!["\"tick\"", "complete"]);
}

#[tokio::test(flavor = "current_thread")]
#[allow(clippy::approx_constant)]
async fn signal_value_feeds_the_thunk() {
    let task = deferred_task(
        DelaySpec::signal(Signal::resolved(3.14_f64)),
        ValueSpec::thunk(|n: f64| 2.0 * n),
    );
    assert_eq!(task.await, Ok(6.28));
}

#[tokio::test(flavor = "current_thread")]
async fn signal_settled_later_through_settler() {
    let (settler, signal): (Settler<u32>, Signal<u32>) = Signal::channel();
    let task = deferred_task(DelaySpec::signal(signal), ValueSpec::thunk(|n: u32| n + 1));
    let waiter = tokio::spawn(task.await_once());
    tokio::task::yield_now().await;
    assert!(settler.resolve(41));
    assert_eq!(waiter.await.unwrap(), Ok(42));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn signal_settled_after_cancel_is_discarded() {
    let log = Log::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let (settler, signal) = Signal::channel();
    let task = deferred_task(
        DelaySpec::signal(signal),
        ValueSpec::thunk(move |n: u32| {
            c.fetch_add(1, Ordering::SeqCst);
            n
        }),
    );
    let sub = task.subscribe(recorder::<u32>(&log));
    tokio::task::yield_now().await;
    assert!(sub.unsubscribe());

    let _ = settler.resolve(7);
    sleep(Duration::from_millis(10)).await;
    assert!(entries(&log).is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(sub.state(), InvocationState::Canceled);
}

#[tokio::test(flavor = "current_thread")]
async fn rejected_signal_reaches_on_error() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let e = errors.clone();
    let (settler, signal) = Signal::<u32>::channel();
    let task = deferred_task(DelaySpec::signal(signal), ValueSpec::thunk(|n: u32| n));
    let sub = task.subscribe(
        FnSubscriber::new()
            .on_value(|_: u32| panic!("a rejected signal must not deliver"))
            .on_error(move |err| e.lock().unwrap().push(err)),
    );
    tokio::task::yield_now().await;
    assert!(settler.reject("link down"));
    sleep(Duration::from_millis(1)).await;

    assert_eq!(
        *errors.lock().unwrap(),
        vec![DeferError::Upstream {
            error: "link down".into()
        }]
    );
    assert_eq!(sub.state(), InvocationState::Errored);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn duration_counts_from_activation() {
    let log = Log::default();
    let task = deferred_task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(1));
    let _sub = task.subscribe(recorder::<i32>(&log));
    tokio::time::advance(Duration::from_millis(15)).await;
    sleep(Duration::from_millis(1)).await;
    assert_eq!(entries(&log), vec!["1", "complete"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn sequence_yields_values_in_order() {
    let log = Log::default();
    let seq = concat([
        deferred_task(DelaySpec::after(Duration::ZERO), ValueSpec::literal(1)),
        deferred_task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(2)),
    ]);
    let _sub = seq.subscribe(recorder::<i32>(&log));
    sleep(Duration::from_millis(30)).await;
    assert_eq!(entries(&log), vec!["1", "2", "complete"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn canceled_sequence_keeps_first_and_suppresses_second() {
    let log = Log::default();
    let first = deferred_task(DelaySpec::after(Duration::ZERO), ValueSpec::literal(1));
    let second = deferred_task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(2));
    let sub = first.then(second).subscribe(recorder::<i32>(&log));

    sleep(Duration::from_millis(1)).await;
    assert_eq!(entries(&log), vec!["1"]);
    assert!(sub.unsubscribe());

    sleep(Duration::from_millis(30)).await;
    assert_eq!(entries(&log), vec!["1"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn canceled_thunk_never_runs() {
    let flag = Arc::new(AtomicBool::new(false));
    let f = flag.clone();
    let task = deferred_task(
        DelaySpec::after(Duration::from_millis(10)),
        ValueSpec::thunk(move |()| f.store(true, Ordering::SeqCst)),
    );
    let sub = task.subscribe_fn(|()| {});
    sub.unsubscribe();
    sleep(Duration::from_millis(10)).await;
    sleep(Duration::from_millis(10)).await;
    assert!(!flag.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn equal_durations_fire_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut subs = Vec::new();
    for i in 0..5 {
        let o = order.clone();
        let task = deferred_task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(i));
        subs.push(task.subscribe_fn(move |v| o.lock().unwrap().push(v)));
        tokio::task::yield_now().await;
    }
    sleep(Duration::from_millis(20)).await;
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn immediate_completes_before_earlier_async_delay() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2) = (order.clone(), order.clone());
    let _zero = deferred_task(DelaySpec::after(Duration::ZERO), ValueSpec::literal("zero"))
        .subscribe_fn(move |v| o1.lock().unwrap().push(v));
    let _now = deferred_task(DelaySpec::immediate(), ValueSpec::literal("immediate"))
        .subscribe_fn(move |v| o2.lock().unwrap().push(v));
    sleep(Duration::from_millis(1)).await;
    assert_eq!(*order.lock().unwrap(), vec!["immediate", "zero"]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn awaiting_a_canceled_invocation_rejects() {
    let tracker = Tracker::new(Config::default()).unwrap();
    let task = tracker.task(DelaySpec::after(Duration::from_millis(10)), ValueSpec::literal(1));
    let waiter = tokio::spawn(task.await_once());
    tokio::task::yield_now().await;
    assert_eq!(tracker.cancel_all(), 1);
    assert_eq!(waiter.await.unwrap(), Err(DeferError::Canceled));
}

#[tokio::test(flavor = "current_thread")]
async fn thunk_failure_surfaces_on_both_protocols() {
    let log = Log::default();
    let task = deferred_task(
        DelaySpec::immediate(),
        ValueSpec::try_thunk(|()| Err::<u8, _>("nope")),
    );
    let _sub = task.subscribe(recorder::<u8>(&log));
    assert_eq!(entries(&log), vec!["error:defer_resolver"]);
    assert_eq!(
        task.await,
        Err(DeferError::Resolver {
            error: "nope".into()
        })
    );
}

#[test]
fn after_shorthand_validates_and_maps_zero_to_immediate() {
    assert!(matches!(
        after(f64::NAN, || 1),
        Err(DeferError::Validation { .. })
    ));
    assert!(after(-1.0, || 1).is_err());

    let log = Log::default();
    let _sub = after(0.0, || 9).unwrap().subscribe(recorder::<i32>(&log));
    assert_eq!(entries(&log), vec!["9", "complete"]);
}
