// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The chain builder and its execution machinery. See [`Promise`].

use crate::actor::{Actor, ActorRef};

/// The terminal error handler: pre-bound to the catch target, enqueued there when a
/// link fails. Travels down the chain hop by hop so whichever link fails can consume
/// it; at most one link can, since failure stops propagation.
type CatchBinding = Box<dyn FnOnce(miette::Report) + Send>;

/// One assembled link: given its input and the (possibly absent) catch binding,
/// enqueue the link's functor on its target thread. Each link owns its successor
/// inside this closure, so the whole chain frees itself as it delivers.
type ChainLink<In> = Box<dyn FnOnce(In, Option<CatchBinding>) + Send>;

/// An asynchronous invocation chain across actors.
///
/// `Promise<Args, Out>` accepts `Args` at [`execute()`] and currently produces `Out`
/// at its tail. Each link is pinned to one actor - and therefore one thread - and is
/// a fallible functor `FnOnce(&mut A, In) -> miette::Result<Out>` (plain methods of
/// that shape work directly).
///
/// # Execution
///
/// [`execute()`] queues the head functor on the head target's thread with the given
/// arguments. When a link's functor returns:
///
/// - `Ok(value)`: the successor link (if any) is enqueued on *its* target's thread
///   with `value` moved in. A link is never enqueued before its predecessor returned
///   successfully.
/// - `Err(report)`: with a [`catch()`] bound, the handler is enqueued on the catch
///   target's thread with the report, and no further link runs. With no catch bound
///   the error is fatal: the executing thread panics.
///
/// If any link's target has detached by the time its hop is attempted, the dispatch
/// is skipped and the remainder of the chain is silently dropped - a design choice,
/// not an error (detaching is the coarse cancellation primitive).
///
/// # Moves, Not Copies
///
/// Arguments and intermediate values move across hops: produced once, moved into the
/// queued closure, moved into the next functor, dropped once. Non-cloneable payloads
/// flow through chains with no hidden copies.
///
/// # Example
///
/// ```
/// use evthread::{Actor, ActorHandle, EventThread, Promise};
///
/// struct Doubler;
/// impl Actor for Doubler {}
/// impl Doubler {
///     fn double(&mut self, n: i64) -> miette::Result<i64> { Ok(n * 2) }
/// }
///
/// let thread = EventThread::new("math");
/// let doubler = ActorHandle::new(Doubler);
/// doubler.attach(&thread);
///
/// Promise::new(&doubler.typed_ref(), Doubler::double)
///     .then(&doubler.typed_ref(), Doubler::double)
///     .execute(10); // 10 -> 20 -> 40, both links on "math"
/// # doubler.detach();
/// ```
///
/// [`catch()`]: Self::catch
/// [`execute()`]: Self::execute
#[allow(missing_debug_implementations)]
pub struct Promise<Args, Out>
where
    Args: Send + 'static,
    Out: Send + 'static,
{
    /// Builds the head link once the tail shape is final: takes the successor of the
    /// last `then` and closes the whole chain into a single head closure.
    assemble: Box<dyn FnOnce(Option<ChainLink<Out>>) -> ChainLink<Args> + Send>,
    catch: Option<CatchBinding>,
}

impl<Args, Out> Promise<Args, Out>
where
    Args: Send + 'static,
    Out: Send + 'static,
{
    /// Creates a chain head pinned to `target`.
    pub fn new<A: Actor>(
        target: &ActorRef<A>,
        functor: impl FnOnce(&mut A, Args) -> miette::Result<Out> + Send + 'static,
    ) -> Self {
        let target = target.clone();
        Self {
            assemble: Box::new(move |successor| make_link(target, functor, successor)),
            catch: None,
        }
    }

    /// Appends a link pinned to `target`; the chain now produces `Next`.
    #[must_use]
    pub fn then<B: Actor, Next: Send + 'static>(
        self,
        target: &ActorRef<B>,
        functor: impl FnOnce(&mut B, Out) -> miette::Result<Next> + Send + 'static,
    ) -> Promise<Args, Next> {
        let target = target.clone();
        let assemble_head = self.assemble;
        Promise {
            assemble: Box::new(move |successor| {
                assemble_head(Some(make_link(target, functor, successor)))
            }),
            catch: self.catch,
        }
    }

    /// Binds the chain's error handler on `target`. A chain has at most one catch
    /// binding and it applies to every link; a later call replaces an earlier one.
    #[must_use]
    pub fn catch<M: Actor>(
        mut self,
        target: &ActorRef<M>,
        handler: impl FnOnce(&mut M, miette::Report) + Send + 'static,
    ) -> Self {
        let target = target.clone();
        self.catch = Some(Box::new(move |report| {
            // The handler itself runs on the catch target's thread; a dead catch
            // target swallows the error like any other dropped dispatch.
            let delivered = target.run(move |actor| handler(actor, report));
            if !delivered {
                tracing::debug!("catch target gone, promise error dropped");
            }
        }));
        self
    }

    /// Starts the chain: queues the head functor with `args` on the head target's
    /// thread.
    pub fn execute(self, args: Args) {
        let head = (self.assemble)(None);
        head(args, self.catch);
    }
}

/// Builds one link: a closure that queues `functor` on `target` and, when it runs,
/// routes the outcome - success to `successor`, failure to the travelling catch
/// binding (or a panic when none is bound).
fn make_link<A: Actor, In, Out>(
    target: ActorRef<A>,
    functor: impl FnOnce(&mut A, In) -> miette::Result<Out> + Send + 'static,
    successor: Option<ChainLink<Out>>,
) -> ChainLink<In>
where
    In: Send + 'static,
    Out: Send + 'static,
{
    Box::new(move |input, catch| {
        let delivered = target.run(move |actor| match functor(actor, input) {
            Ok(value) => {
                if let Some(successor) = successor {
                    successor(value, catch);
                }
            }
            Err(report) => match catch {
                Some(deliver) => deliver(report),
                None => panic!("uncaught promise error: {report}"),
            },
        });
        if !delivered {
            tracing::debug!(link_target = %target.id(), "promise target gone, chain dropped");
        }
    })
}
