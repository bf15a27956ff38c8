//! # `futures::Stream` as a source.
//!
//! [`StreamFn`] wraps a factory building a fresh stream per activation. The
//! stream is polled by the invocation's armed driver; `Ok` items are emitted,
//! the first `Err` item becomes [`DeferError::Relayed`] and ends the
//! activation, exhaustion completes it. A panic in the factory or while the
//! stream is polled also ends it with `Relayed`.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use futures::future::FutureExt;
use futures::{Stream, StreamExt};

use crate::error::{DeferError, panic_message};
use crate::invocation::{Invocation, Wiring, driver};

use super::{Source, Subscriber, Subscription};

/// Source backed by a stream factory.
pub struct StreamFn<F> {
    factory: F,
}

impl<F> StreamFn<F> {
    /// Wraps `factory`; it is called once per activation.
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F> fmt::Debug for StreamFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamFn(..)")
    }
}

impl<T, F, St, E> Source<T> for StreamFn<F>
where
    T: Send + 'static,
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    fn activate(&self, subscriber: Box<dyn Subscriber<T>>) -> Subscription {
        let inv = Invocation::new(&Wiring::default());
        inv.schedule(subscriber, "stream", None);
        let sub = Subscription::new(inv.clone(), false);
        if !inv.fire() {
            return sub;
        }

        let stream = match catch_unwind(AssertUnwindSafe(|| (self.factory)())) {
            Ok(stream) => stream,
            Err(payload) => {
                inv.fail(DeferError::Relayed {
                    error: panic_message(&*payload),
                });
                return sub;
            }
        };
        let driven = inv.clone();
        let pump = async move {
            futures::pin_mut!(stream);
            while let Some(item) = stream.next().await {
                match item {
                    Ok(v) => driven.emit(v),
                    Err(e) => {
                        driven.fail(DeferError::Relayed {
                            error: e.to_string(),
                        });
                        return;
                    }
                }
                if !driven.is_live() {
                    return;
                }
            }
            driven.complete();
        };
        let failed = inv.clone();
        let pump = AssertUnwindSafe(pump).catch_unwind().map(move |res| {
            if let Err(payload) = res {
                failed.fail(DeferError::Relayed {
                    error: panic_message(&*payload),
                });
            }
        });
        driver::spawn_armed(&inv, pump.boxed());
        sub
    }
}
