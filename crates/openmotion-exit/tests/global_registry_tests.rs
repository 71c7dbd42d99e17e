//! End-to-end checks of the process-global registry.
//!
//! The global registry runs at most once per process, so everything that
//! touches it lives in this single test: registration across levels,
//! ordered execution, and idempotent re-triggering.

use std::sync::{Arc, Mutex};

use openmotion_exit::{
    IO_EXIT_LEVEL, MEM_EXIT_LEVEL, call_exit_handlers, configure_exit_handlers, is_exiting,
    register_exit_handler,
};

#[test]
fn global_sweep_runs_levels_in_order_exactly_once() {
    configure_exit_handlers();
    // Arming twice must be a no-op.
    configure_exit_handlers();

    assert!(!is_exiting());

    let order = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&order);
    register_exit_handler(IO_EXIT_LEVEL, move || log.lock().unwrap().push("gpio"))
        .expect("io-level handler");
    let log = Arc::clone(&order);
    register_exit_handler(MEM_EXIT_LEVEL, move || log.lock().unwrap().push("buffers"))
        .expect("mem-level handler");
    let log = Arc::clone(&order);
    register_exit_handler(IO_EXIT_LEVEL, move || log.lock().unwrap().push("heaters"))
        .expect("io-level handler");

    call_exit_handlers();

    assert!(is_exiting());
    assert_eq!(*order.lock().unwrap(), vec!["gpio", "heaters", "buffers"]);

    // A second trigger must not re-run anything.
    call_exit_handlers();
    assert_eq!(order.lock().unwrap().len(), 3);
}
