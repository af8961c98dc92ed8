//! Integration tests for the wasmy runner.
//!
//! Guests are emitted by `wasmy-guestgen` and executed under wasmi.
//!
//! Tests validate:
//! - Call round trips (echo, constant payloads with metadata)
//! - Host call bridge round trips and host-side failures
//! - Warm-up failures: link, missing boilerplate, export not found, re-warm
//! - Call failures: unknown function, overflow, error frames, traps, fuel
//! - Buffer exclusivity across sequential calls and concurrent runners

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wasmy_codec::tags::FRAME_ERROR;
use wasmy_guestgen::GuestModuleBuilder;
use wasmy_runner::demo::{demo_functions, PRINT_HELLO};
use wasmy_runner::{
    args, Args, BufferKind, EngineOptions, GuestModule, HostError, HostFunctions, Payload, Runner,
    RunnerConfig, RunnerError, Value,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn module(builder: GuestModuleBuilder) -> GuestModule {
    let wasm = builder
        .build()
        .unwrap_or_else(|e| panic!("guest generation failed: {e}"));
    GuestModule::compile(&wasm).unwrap_or_else(|e| panic!("compile failed: {e}"))
}

fn fueled_module(builder: GuestModuleBuilder) -> GuestModule {
    let wasm = builder.build().unwrap();
    GuestModule::compile_with(&wasm, EngineOptions { fuel_metering: true }).unwrap()
}

/// The sample guest: `hello` echoes, `greet` relays to PrintHello.
fn sample_guest() -> GuestModule {
    module(
        GuestModuleBuilder::new()
            .echo("hello")
            .relay("greet", PRINT_HELLO),
    )
}

fn warm_runner(module: &GuestModule, exports: &[&str]) -> Runner {
    let mut runner = Runner::with_host_functions(demo_functions());
    runner
        .warm_up(module, exports)
        .unwrap_or_else(|e| panic!("warm-up failed: {e}"));
    runner
}

// ══════════════════════════════════════════════════════════════════════════════
// Call round trips
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn echo_returns_first_argument() {
    let mut runner = warm_runner(&sample_guest(), &["hello"]);
    let payload = runner.call("hello", &args!["martin"]).unwrap();
    assert_eq!(payload.data, Value::from("martin"));
    assert!(payload.meta.is_empty());
}

#[test]
fn echo_preserves_nested_values() {
    let mut runner = warm_runner(&sample_guest(), &["hello"]);
    let value = Value::List(vec![
        Value::Int(i64::MIN),
        Value::Float(-2.5),
        Value::from(vec![Value::Bool(true), Value::Nil]),
        Value::Bytes(vec![0xde, 0xad]),
    ]);
    let payload = runner
        .call("hello", &Args::from(vec![value.clone()]))
        .unwrap();
    assert_eq!(payload.data, value);
}

#[test]
fn constant_payload_carries_metadata() {
    let expected = Payload::new("ok").with_meta("version", "1");
    let guest = module(GuestModuleBuilder::new().constant("status", expected.clone()));
    let mut runner = warm_runner(&guest, &["status"]);
    assert_eq!(runner.call("status", &Args::new()).unwrap(), expected);
}

#[test]
fn exports_and_capacity_are_reported() {
    let runner = warm_runner(&sample_guest(), &["hello", "greet"]);
    assert!(runner.is_warm());
    assert_eq!(runner.exports(), vec!["greet", "hello"]);
    assert_eq!(runner.capacity(), 1024);
}

// ══════════════════════════════════════════════════════════════════════════════
// Host call bridge
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn guest_observes_host_greeting() {
    let mut runner = warm_runner(&sample_guest(), &["greet"]);
    let payload = runner.call("greet", &args!["martin"]).unwrap();
    assert_eq!(payload.data, Value::from("From Host: Hello Mr. martin"));
}

#[test]
fn host_argument_error_reaches_guest_as_error_frame() {
    let mut runner = warm_runner(&sample_guest(), &["greet"]);
    // PrintHello needs a string; the relay guest passes the error frame back.
    let err = runner.call("greet", &args![42]).unwrap_err();
    match err {
        RunnerError::Guest { function, message } => {
            assert_eq!(function, "greet");
            assert_eq!(message, "argument 0: expected string, found int");
        }
        other => panic!("expected guest error, got {other}"),
    }
    // The instance survives a failed call.
    assert!(runner.call("greet", &args!["bianca"]).is_ok());
}

#[test]
fn host_function_failure_is_not_a_trap() {
    let functions = HostFunctions::new().with("Lookup", |_: &Args| -> Result<Payload, HostError> {
        Err(HostError::new("no such user"))
    });
    let guest = module(GuestModuleBuilder::new().relay("lookup", "Lookup"));
    let mut runner = Runner::with_host_functions(functions);
    runner.warm_up(&guest, &["lookup"]).unwrap();

    let err = runner.call("lookup", &args!["nobody"]).unwrap_err();
    assert!(matches!(err, RunnerError::Guest { ref message, .. } if message == "no such user"));
}

#[test]
fn oversized_host_reply_becomes_error_frame() {
    let functions = HostFunctions::new().with("Flood", |_: &Args| -> Result<Payload, HostError> {
        Ok(Payload::new("z".repeat(4096)))
    });
    let guest = module(GuestModuleBuilder::new().relay("flood", "Flood"));
    let mut runner = Runner::with_host_functions(functions);
    runner.warm_up(&guest, &["flood"]).unwrap();

    let err = runner.call("flood", &Args::new()).unwrap_err();
    assert!(
        matches!(err, RunnerError::Guest { ref message, .. } if message.contains("exceeds buffer capacity")),
        "{err}"
    );
}

#[test]
fn custom_import_namespace() {
    let config = RunnerConfig {
        import_module: "host".to_string(),
        import_prefix: String::new(),
        ..RunnerConfig::default()
    };
    let guest = module(
        GuestModuleBuilder::new()
            .import_namespace("host", "")
            .relay("greet", PRINT_HELLO),
    );
    let mut runner = Runner::new(config, demo_functions());
    runner.warm_up(&guest, &["greet"]).unwrap();
    let payload = runner.call("greet", &args!["anderson"]).unwrap();
    assert_eq!(payload.data, Value::from("From Host: Hello Mr. anderson"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Warm-up
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn second_warm_up_fails_and_keeps_first_instance() {
    let guest = sample_guest();
    let mut runner = warm_runner(&guest, &["hello"]);
    assert!(matches!(
        runner.warm_up(&guest, &["hello", "greet"]),
        Err(RunnerError::AlreadyWarm)
    ));
    assert_eq!(runner.exports(), vec!["hello"]);
    assert!(runner.call("hello", &args!["still here"]).is_ok());
}

#[test]
fn unregistered_import_is_a_link_error() {
    let mut runner = Runner::with_host_functions(HostFunctions::new());
    let err = runner.warm_up(&sample_guest(), &["hello"]).unwrap_err();
    match err {
        RunnerError::Link { module, name } => {
            assert_eq!(module, "env");
            assert_eq!(name, "main.PrintHello");
        }
        other => panic!("expected link error, got {other}"),
    }
    assert!(!runner.is_warm());
}

#[test]
fn wrong_import_prefix_is_a_link_error() {
    let guest = module(
        GuestModuleBuilder::new()
            .import_namespace("env", "other.")
            .relay("greet", PRINT_HELLO),
    );
    let mut runner = Runner::with_host_functions(demo_functions());
    assert!(matches!(
        runner.warm_up(&guest, &["greet"]),
        Err(RunnerError::Link { .. })
    ));
}

#[test]
fn missing_export_fails_warm_up_and_leaves_runner_cold() {
    let guest = sample_guest();
    let mut runner = Runner::with_host_functions(demo_functions());
    let err = runner.warm_up(&guest, &["hello", "goodbye"]).unwrap_err();
    assert!(matches!(err, RunnerError::ExportNotFound(ref n) if n == "goodbye"));
    assert!(!runner.is_warm());

    // A later, correct warm-up still works.
    runner.warm_up(&guest, &["hello"]).unwrap();
    assert!(runner.is_warm());
}

#[test]
fn boilerplate_export_with_wrong_signature_is_rejected() {
    let guest = sample_guest();
    let mut runner = Runner::with_host_functions(demo_functions());
    // `inputBuffer` is `() -> i32`, not a managed function.
    let err = runner.warm_up(&guest, &["inputBuffer"]).unwrap_err();
    assert!(matches!(err, RunnerError::ExportSignature(_)));
}

#[test]
fn missing_accessor_is_missing_boilerplate() {
    let guest = module(
        GuestModuleBuilder::new()
            .echo("hello")
            .omit_export("hostOutputBuffer"),
    );
    let mut runner = Runner::with_host_functions(HostFunctions::new());
    let err = runner.warm_up(&guest, &["hello"]).unwrap_err();
    assert!(matches!(err, RunnerError::MissingBoilerplate(ref n) if n == "hostOutputBuffer"));
}

#[test]
fn missing_memory_is_missing_boilerplate() {
    let guest = module(GuestModuleBuilder::new().echo("hello").omit_export("memory"));
    let mut runner = Runner::with_host_functions(HostFunctions::new());
    let err = runner.warm_up(&guest, &["hello"]).unwrap_err();
    assert!(matches!(err, RunnerError::MissingBoilerplate(ref n) if n == "memory"));
}

#[test]
fn advertised_capacity_overrides_config() {
    let guest = module(GuestModuleBuilder::new().capacity(256).echo("hello"));
    let mut runner = warm_runner(&guest, &["hello"]);
    assert_eq!(runner.capacity(), 256);

    let err = runner.call("hello", &args!["x".repeat(300)]).unwrap_err();
    assert!(matches!(err, RunnerError::BufferOverflow(o) if o.capacity == 256));
}

#[test]
fn config_capacity_applies_without_advertisement() {
    let guest = module(
        GuestModuleBuilder::new()
            .capacity(512)
            .without_capacity_export()
            .echo("hello"),
    );
    let config = RunnerConfig::from_json_str(r#"{"buffer_capacity": 512}"#).unwrap();
    let mut runner = Runner::new(config, HostFunctions::new());
    runner.warm_up(&guest, &["hello"]).unwrap();
    assert_eq!(runner.capacity(), 512);
    assert!(runner.call("hello", &args!["fits"]).is_ok());
}

#[test]
fn fuel_limit_requires_metered_module() {
    let config = RunnerConfig::default().with_fuel_per_call(10_000);
    let mut runner = Runner::new(config, demo_functions());
    let err = runner.warm_up(&sample_guest(), &["hello"]).unwrap_err();
    assert!(matches!(err, RunnerError::Config(_)));
}

// ══════════════════════════════════════════════════════════════════════════════
// Call failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn call_before_warm_up_fails() {
    let mut runner = Runner::with_host_functions(demo_functions());
    assert!(matches!(
        runner.call("hello", &Args::new()),
        Err(RunnerError::NotWarmedUp)
    ));
}

#[test]
fn unknown_function_performs_no_buffer_writes() {
    let mut runner = warm_runner(&sample_guest(), &["hello"]);
    runner.call("hello", &args!["martin"]).unwrap();

    let before: Vec<Vec<u8>> = BufferKind::ALL
        .iter()
        .map(|&kind| runner.read_buffer(kind).unwrap())
        .collect();
    let err = runner.call("doesNotExist", &args!["anything"]).unwrap_err();
    assert!(matches!(err, RunnerError::UnknownFunction(ref n) if n == "doesNotExist"));
    let after: Vec<Vec<u8>> = BufferKind::ALL
        .iter()
        .map(|&kind| runner.read_buffer(kind).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn oversized_args_are_rejected_before_writing() {
    let mut runner = warm_runner(&sample_guest(), &["hello"]);
    let before = runner.read_buffer(BufferKind::GuestInput).unwrap();

    let err = runner.call("hello", &args!["x".repeat(2000)]).unwrap_err();
    match err {
        RunnerError::BufferOverflow(overflow) => {
            assert_eq!(overflow.capacity, 1024);
            assert!(overflow.len > 2000);
        }
        other => panic!("expected overflow, got {other}"),
    }
    assert_eq!(runner.read_buffer(BufferKind::GuestInput).unwrap(), before);
}

#[test]
fn guest_error_frame_is_business_error() {
    let guest = module(GuestModuleBuilder::new().fail("validate", "name must be a string"));
    let mut runner = warm_runner(&guest, &["validate"]);
    let err = runner.call("validate", &args![1]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "function `validate` failed: name must be a string"
    );

    let output = runner.read_buffer(BufferKind::GuestOutput).unwrap();
    assert_eq!(output[0], FRAME_ERROR);
}

#[test]
fn out_of_range_length_is_rejected() {
    let guest = module(
        GuestModuleBuilder::new()
            .raw_length("too_long", 5000)
            .raw_length("negative", -1),
    );
    let mut runner = warm_runner(&guest, &["too_long", "negative"]);
    assert!(matches!(
        runner.call("too_long", &Args::new()),
        Err(RunnerError::InvalidOutputLength { len: 5000, capacity: 1024, .. })
    ));
    assert!(matches!(
        runner.call("negative", &Args::new()),
        Err(RunnerError::InvalidOutputLength { len: -1, .. })
    ));
}

#[test]
fn garbage_output_is_a_codec_error() {
    // Zero-filled guest-output decodes as an unknown frame kind.
    let guest = module(GuestModuleBuilder::new().raw_length("garbage", 4));
    let mut runner = warm_runner(&guest, &["garbage"]);
    assert!(matches!(
        runner.call("garbage", &Args::new()),
        Err(RunnerError::Codec(_))
    ));
}

#[test]
fn trap_is_reported_and_instance_survives() {
    let guest = module(GuestModuleBuilder::new().trap("boom").echo("hello"));
    let mut runner = warm_runner(&guest, &["boom", "hello"]);
    assert!(matches!(
        runner.call("boom", &Args::new()),
        Err(RunnerError::Trap { ref function, .. }) if function == "boom"
    ));
    assert_eq!(
        runner.call("hello", &args!["after"]).unwrap().data,
        Value::from("after")
    );
}

#[test]
fn runaway_guest_exhausts_fuel() {
    let guest = fueled_module(GuestModuleBuilder::new().spin("forever").echo("hello"));
    let config = RunnerConfig::default().with_fuel_per_call(100_000);
    let mut runner = Runner::new(config, HostFunctions::new());
    runner.warm_up(&guest, &["forever", "hello"]).unwrap();

    assert!(matches!(
        runner.call("forever", &Args::new()),
        Err(RunnerError::FuelExhausted { ref function }) if function == "forever"
    ));
    // Fuel is replenished for the next call.
    assert_eq!(
        runner.call("hello", &args!["refuelled"]).unwrap().data,
        Value::from("refuelled")
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Exclusivity & concurrency
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn sequential_calls_do_not_observe_each_other() {
    let guest = module(GuestModuleBuilder::new().echo("a").echo("b"));
    let mut runner = warm_runner(&guest, &["a", "b"]);

    let long = "a".repeat(600);
    assert_eq!(runner.call("a", &args![long.clone()]).unwrap().data, Value::from(long));
    assert_eq!(runner.call("b", &args!["b"]).unwrap().data, Value::from("b"));
    assert_eq!(runner.call("a", &Args::new()).unwrap().data, Value::Nil);
}

#[test]
fn concurrent_runners_match_sequential_results() {
    let guest = sample_guest();
    let names: Vec<String> = (0..6).map(|i| format!("caller-{i}")).collect();

    let sequential: Vec<Payload> = {
        let mut runner = warm_runner(&guest, &["greet"]);
        names
            .iter()
            .map(|name| runner.call("greet", &args![name.as_str()]).unwrap())
            .collect()
    };

    let calls = Arc::new(AtomicUsize::new(0));
    let counting = {
        let calls = Arc::clone(&calls);
        HostFunctions::new().with(PRINT_HELLO, move |args: &Args| {
            calls.fetch_add(1, Ordering::SeqCst);
            wasmy_runner::demo::print_hello(args)
        })
    };

    let concurrent: Vec<Payload> = std::thread::scope(|scope| {
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let guest = guest.clone();
                let functions = counting.clone();
                scope.spawn(move || {
                    let mut runner = Runner::with_host_functions(functions);
                    runner.warm_up(&guest, &["greet"]).unwrap();
                    let mut last = None;
                    for _ in 0..20 {
                        last = Some(runner.call("greet", &args![name.as_str()]).unwrap());
                    }
                    last.unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(concurrent, sequential);
    assert_eq!(calls.load(Ordering::SeqCst), names.len() * 20);
}

// ══════════════════════════════════════════════════════════════════════════════
// Module loading
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn module_loads_from_file() {
    let wasm = GuestModuleBuilder::new().echo("hello").build().unwrap();
    let path = std::env::temp_dir().join(format!("wasmy-runner-{}.wasm", std::process::id()));
    std::fs::write(&path, &wasm).unwrap();

    let guest = GuestModule::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(guest.exports().contains(&"hello".to_string()));

    let mut runner = warm_runner(&guest, &["hello"]);
    assert_eq!(runner.call("hello", &args![7]).unwrap().data, Value::Int(7));
}

#[test]
fn missing_file_is_io_error() {
    let err = GuestModule::from_file("/nonexistent/wasmy/guest.wasm").unwrap_err();
    assert!(matches!(err, RunnerError::Io(_)));
}

#[test]
fn invalid_bytes_fail_to_compile() {
    let err = GuestModule::compile(b"not wasm").unwrap_err();
    assert!(matches!(err, RunnerError::Compile(_)));
}

#[test]
fn module_lists_imports() {
    let imports = sample_guest().imports();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].module, "env");
    assert_eq!(imports[0].name, "main.PrintHello");
    assert!(imports[0].is_function);
}
