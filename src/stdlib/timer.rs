//! Timer functions (§4.4, §5): the one stdlib category that is
//! explicitly allowed to mutate process-wide state. A mutex-guarded
//! table, same "lifecycle owned by the engine, not a bare global"
//! shape §9's redesign notes ask for, realized here as a lazily
//! initialized static since the table has no meaningful per-engine
//! identity to hang off of in a tree-walking interpreter with no
//! engine handle threaded through stdlib calls.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

fn table() -> &'static Mutex<HashMap<String, Instant>> {
    static TABLE: OnceLock<Mutex<HashMap<String, Instant>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn timer_start(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let name = args[0]
        .as_str()
        .ok_or_else(|| type_error("timerStart", 0, "expected a string", span))?;
    table().lock().unwrap().insert(name.to_string(), Instant::now());
    Ok(Udm::Null)
}

fn elapsed_ms(name: &str) -> Option<f64> {
    table()
        .lock()
        .unwrap()
        .get(name)
        .map(|start| start.elapsed().as_secs_f64() * 1000.0)
}

fn timer_elapsed(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let name = args[0]
        .as_str()
        .ok_or_else(|| type_error("timerElapsed", 0, "expected a string", span))?;
    match elapsed_ms(name) {
        Some(ms) => Ok(Udm::Float(ms)),
        None => Err(type_error("timerElapsed", 0, format!("no timer named '{name}' was started"), span)),
    }
}

fn timer_stop(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let name = args[0]
        .as_str()
        .ok_or_else(|| type_error("timerStop", 0, "expected a string", span))?;
    let ms = elapsed_ms(name)
        .ok_or_else(|| type_error("timerStop", 0, format!("no timer named '{name}' was started"), span))?;
    table().lock().unwrap().remove(name);
    Ok(Udm::Float(ms))
}

/// Drops every running timer. The engine façade calls this between
/// unrelated transform runs so one script's timers can't leak into the
/// next (§5: the table is process-wide, but its *lifetime* is owned by
/// whichever engine started the timers).
pub(crate) fn clear_all() {
    table().lock().unwrap().clear();
}

fn timer_clear(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    if args.is_empty() {
        table().lock().unwrap().clear();
    } else {
        let name = args[0]
            .as_str()
            .ok_or_else(|| type_error("timerClear", 0, "expected a string", span))?;
        table().lock().unwrap().remove(name);
    }
    Ok(Udm::Null)
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "timerStart", min_arity: 1, max_arity: 1, implementation: timer_start });
    v.push(StdlibFn { name: "timerElapsed", min_arity: 1, max_arity: 1, implementation: timer_elapsed });
    v.push(StdlibFn { name: "timerStop", min_arity: 1, max_arity: 1, implementation: timer_stop });
    v.push(StdlibFn { name: "timerClear", min_arity: 0, max_arity: 1, implementation: timer_clear });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopInvoker;
    impl Invoker for NoopInvoker {
        fn call_lambda(&self, _lambda: &Udm, _args: &[Udm], _span: Span) -> Result<Udm, UtlxError> {
            unimplemented!()
        }
    }

    #[test]
    fn start_then_stop_reports_nonnegative_elapsed() {
        let span = Span::single(crate::error::Position::new());
        timer_start(&[Udm::string("t1")], span, &NoopInvoker).unwrap();
        let elapsed = timer_stop(&[Udm::string("t1")], span, &NoopInvoker).unwrap();
        assert!(elapsed.as_float().unwrap() >= 0.0);
        assert!(timer_stop(&[Udm::string("t1")], span, &NoopInvoker).is_err());
    }
}
