//! Local isolated execution: an embedded QuickJS engine on a dedicated
//! thread, communicating with the host only through a bounded event channel.
//!
//! The engine gets no host bindings beyond the console shim, so evaluated
//! code cannot reach the filesystem, the network, or host state; results
//! cross the boundary only as serialized strings. The engine is torn down
//! when the evaluation finishes, and the interrupt handler aborts it early
//! when the [`JsWorker`] handle is dropped mid-run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{CatchResultExt, Context, Ctx, Function, FromJs, Object, Runtime, Value};
use tokio::sync::mpsc;

use super::ExecEvent;

/// Upper bound on buffered events between the worker and the consumer.
const EVENT_BUFFER: usize = 256;

/// Handle to one local execution.
pub struct JsWorker {
    events: mpsc::Receiver<ExecEvent>,
    cancel: Arc<AtomicBool>,
}

impl JsWorker {
    /// Evaluates `code` on a fresh engine in a new thread. Events arrive in
    /// order and the stream always ends with [`ExecEvent::Done`].
    pub fn spawn(code: String) -> Self {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        std::thread::spawn(move || {
            evaluate(&code, &tx, &flag);
            let _ = tx.blocking_send(ExecEvent::Done);
        });
        Self { events, cancel }
    }

    /// Next event; `None` once `Done` has been consumed and the worker exited.
    pub async fn recv(&mut self) -> Option<ExecEvent> {
        self.events.recv().await
    }

    /// Collects all events up to and including `Done`.
    pub async fn collect(mut self) -> Vec<ExecEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            let done = event == ExecEvent::Done;
            events.push(event);
            if done {
                break;
            }
        }
        events
    }
}

impl Drop for JsWorker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

fn evaluate(code: &str, tx: &mpsc::Sender<ExecEvent>, cancel: &Arc<AtomicBool>) {
    let (runtime, context) = match engine() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = tx.blocking_send(ExecEvent::Error(e.to_string()));
            return;
        }
    };
    let flag = Arc::clone(cancel);
    runtime.set_interrupt_handler(Some(Box::new(move || flag.load(Ordering::SeqCst))));

    context.with(|ctx| {
        if let Err(e) = install_console(&ctx, tx.clone()) {
            let _ = tx.blocking_send(ExecEvent::Error(e.to_string()));
            return;
        }
        match ctx.eval::<Value, _>(code).catch(&ctx) {
            Ok(value) => {
                let _ = tx.blocking_send(ExecEvent::Result(serialize_result(&ctx, value)));
            }
            Err(e) => {
                let _ = tx.blocking_send(ExecEvent::Error(e.to_string()));
            }
        }
    });
}

fn engine() -> rquickjs::Result<(Runtime, Context)> {
    let runtime = Runtime::new()?;
    let context = Context::full(&runtime)?;
    Ok((runtime, context))
}

/// Installs `console.log/error/warn/info`, each forwarding one `Log` event
/// with its arguments coerced to strings and joined by spaces.
fn install_console(ctx: &Ctx<'_>, tx: mpsc::Sender<ExecEvent>) -> rquickjs::Result<()> {
    let console = Object::new(ctx.clone())?;
    for name in ["log", "error", "warn", "info"] {
        let tx = tx.clone();
        let log = Function::new(ctx.clone(), move |args: Rest<Coerced<String>>| {
            let line = args
                .iter()
                .map(|arg| arg.0.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let _ = tx.blocking_send(ExecEvent::Log(line));
        })?;
        console.set(name, log)?;
    }
    ctx.globals().set("console", console)
}

/// JSON-serializes the completion value, falling back to string coercion
/// when serialization fails (cyclic objects, functions).
fn serialize_result<'a>(ctx: &Ctx<'a>, value: Value<'a>) -> String {
    if value.is_undefined() {
        return "undefined".to_string();
    }
    if let Ok(Some(json)) = ctx.json_stringify(value.clone()) {
        if let Ok(text) = json.to_string() {
            return text;
        }
    }
    Coerced::<String>::from_js(ctx, value)
        .map(|coerced| coerced.0)
        .unwrap_or_else(|_| "undefined".to_string())
}
