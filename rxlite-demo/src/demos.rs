//! The four walkthroughs: native events, arrays, a hand-built Observable
//! and deferred values

use crate::config::{ArrayConfig, EventsConfig, PromiseConfig, ScratchConfig, User};
use crate::sink::{drain, log_observer};
use anyhow::Result;
use rxlite::rx::{
    EventTarget, Promise, Scheduler, SchedulerRef, TokioScheduler, from_event, from_future,
    from_promise,
};
use rxlite::{Observable, RxError, Subscriber, Teardown};
use std::sync::Arc;
use tracing::info;

/// Typed payload for the synthetic UI event targets
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Click { x: i32, y: i32 },
    KeyUp(char),
    MouseMove { x: i32, y: i32 },
}

pub fn events(config: &EventsConfig) {
    let button = Arc::new(EventTarget::<UiEvent>::new());
    let input = Arc::new(EventTarget::<UiEvent>::new());
    let document = Arc::new(EventTarget::<UiEvent>::new());

    let clicks: Observable<UiEvent> = from_event(Arc::clone(&button), "click");
    let keys: Observable<UiEvent> = from_event(Arc::clone(&input), "keyup");
    let moves: Observable<UiEvent> = from_event(Arc::clone(&document), "mousemove");

    let subscriptions = [
        clicks.subscribe(log_observer("button click")),
        keys.subscribe(log_observer("input keyup")),
        moves.subscribe(log_observer("document mousemove")),
    ];

    for &(x, y) in &config.clicks {
        button.dispatch("click", &UiEvent::Click { x, y });
    }
    for key in config.keys.chars() {
        input.dispatch("keyup", &UiEvent::KeyUp(key));
    }
    for &(x, y) in &config.moves {
        document.dispatch("mousemove", &UiEvent::MouseMove { x, y });
    }

    for subscription in &subscriptions {
        subscription.dispose();
    }
    // Nobody is listening any more
    button.dispatch("click", &UiEvent::Click { x: 0, y: 0 });
    info!(
        click = button.listener_count("click"),
        keyup = input.listener_count("keyup"),
        mousemove = document.listener_count("mousemove"),
        "listeners left after dispose"
    );
}

pub fn array(config: &ArrayConfig) {
    let numbers = Observable::from_array(config.numbers.clone());
    let _numbers = numbers.subscribe(log_observer("numbers"));

    let posts = Observable::from_array(config.posts.clone());
    let _posts = posts.subscribe(log_observer("posts"));
    let _titles = posts
        .map(|post| post.title)
        .subscribe(log_observer("post titles"));
}

/// Observable built by hand: two values, an error, then a value scheduled
/// for later that never arrives because the error terminated the
/// subscription and its teardown cancelled the timer
pub fn scratch_observable(config: &ScratchConfig, scheduler: SchedulerRef) -> Observable<String> {
    let delay = config.delay();
    Observable::new(move |subscriber: Subscriber<String>| {
        subscriber.next("Hello World".to_string());
        subscriber.next("Another Value".to_string());
        subscriber.error(RxError::msg("Error"));

        let late = subscriber.clone();
        let task = scheduler.schedule(
            delay,
            Box::new(move || {
                late.next("Yet another value".to_string());
                late.complete();
            }),
        );
        Ok(Teardown::from(task))
    })
    .catch_error(|err| Observable::of(err.to_string()))
}

pub async fn scratch(config: &ScratchConfig) -> Result<()> {
    let scheduler: SchedulerRef = Arc::new(TokioScheduler::current()?);
    drain("scratch", &scratch_observable(config, scheduler)).await;
    Ok(())
}

/// Pretend remote lookup answered from the configured directory
pub fn user_lookup(users: Vec<User>, login: String) -> Observable<User> {
    let users = Arc::new(users);
    from_future(move || {
        let users = Arc::clone(&users);
        let login = login.clone();
        async move {
            tokio::task::yield_now().await;
            users
                .iter()
                .find(|user| user.login == login)
                .cloned()
                .ok_or_else(|| RxError::Rejected(format!("no user named {login}")))
        }
    })
}

pub async fn promise(config: &PromiseConfig) -> Result<()> {
    let scheduler = TokioScheduler::current()?;
    let (promise, resolver) = Promise::pending();
    let value = config.value.clone();
    let _task = scheduler.schedule(config.delay(), Box::new(move || resolver.resolve(value)));
    drain("promise", &from_promise(promise)).await;

    drain(
        "user",
        &user_lookup(config.users.clone(), config.lookup.clone()),
    )
    .await;
    Ok(())
}
